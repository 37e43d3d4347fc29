// Operator endpoints: raft peers, gossip keyring and autopilot

use reqwest::StatusCode;

use crate::client::ConsulClient;
use crate::constants::consul_api_path;
use crate::error::Result;
use crate::model::{
    AutopilotConfiguration, AutopilotState, KeyringOptions, KeyringRequest, KeyringResponse,
    OperatorHealthReply, RaftConfiguration, TransferLeaderResponse,
};
use crate::request::{
    ConsulRequest, QueryMeta, QueryOptions, QueryResult, WriteOptions, WriteResult, decode,
    unexpected_response,
};

/// Cluster level operations, most of which need `operator` ACL privileges
pub struct Operator<'a> {
    client: &'a ConsulClient,
}

impl<'a> Operator<'a> {
    pub(crate) fn new(client: &'a ConsulClient) -> Self {
        Self { client }
    }

    // ============================================================================
    // Raft
    // ============================================================================

    pub async fn raft_get_configuration(
        &self,
        q: Option<&QueryOptions>,
    ) -> Result<QueryResult<RaftConfiguration>> {
        self.client
            .get(consul_api_path::OPERATOR_RAFT_CONFIGURATION)
            .query_options(q)
            .execute()
            .await
    }

    /// Remove a stale peer given its `ip:port`
    pub async fn raft_remove_peer_by_address(
        &self,
        address: &str,
        w: Option<&WriteOptions>,
    ) -> Result<WriteResult<()>> {
        self.client
            .delete(consul_api_path::OPERATOR_RAFT_PEER)
            .param("address", address)
            .write_options(w)
            .execute_write_empty()
            .await
    }

    pub async fn raft_remove_peer_by_id(
        &self,
        id: &str,
        w: Option<&WriteOptions>,
    ) -> Result<WriteResult<()>> {
        self.client
            .delete(consul_api_path::OPERATOR_RAFT_PEER)
            .param("id", id)
            .write_options(w)
            .execute_write_empty()
            .await
    }

    /// Hand leadership to `id`, or to any voter when `None`
    pub async fn raft_transfer_leader(
        &self,
        id: Option<&str>,
        w: Option<&WriteOptions>,
    ) -> Result<WriteResult<TransferLeaderResponse>> {
        self.client
            .post(consul_api_path::OPERATOR_RAFT_TRANSFER_LEADER)
            .param_opt("id", id)
            .write_options(w)
            .execute_write()
            .await
    }

    // ============================================================================
    // Keyring
    // ============================================================================

    /// Distribute a new gossip encryption key to every member
    pub async fn keyring_install(
        &self,
        key: &str,
        opts: &KeyringOptions,
        w: Option<&WriteOptions>,
    ) -> Result<WriteResult<()>> {
        keyring_params(self.client.post(consul_api_path::OPERATOR_KEYRING), opts)
            .write_options(w)
            .json(&KeyringRequest { key })?
            .execute_write_empty()
            .await
    }

    /// Installed keys, one response per pool (LAN and WAN, per segment)
    pub async fn keyring_list(
        &self,
        opts: &KeyringOptions,
        q: Option<&QueryOptions>,
    ) -> Result<QueryResult<Vec<KeyringResponse>>> {
        keyring_params(self.client.get(consul_api_path::OPERATOR_KEYRING), opts)
            .query_options(q)
            .execute()
            .await
    }

    pub async fn keyring_remove(
        &self,
        key: &str,
        opts: &KeyringOptions,
        w: Option<&WriteOptions>,
    ) -> Result<WriteResult<()>> {
        keyring_params(self.client.delete(consul_api_path::OPERATOR_KEYRING), opts)
            .write_options(w)
            .json(&KeyringRequest { key })?
            .execute_write_empty()
            .await
    }

    /// Make an installed key the primary encryption key
    pub async fn keyring_use(
        &self,
        key: &str,
        opts: &KeyringOptions,
        w: Option<&WriteOptions>,
    ) -> Result<WriteResult<()>> {
        keyring_params(self.client.put(consul_api_path::OPERATOR_KEYRING), opts)
            .write_options(w)
            .json(&KeyringRequest { key })?
            .execute_write_empty()
            .await
    }

    // ============================================================================
    // Autopilot
    // ============================================================================

    pub async fn autopilot_get_configuration(
        &self,
        q: Option<&QueryOptions>,
    ) -> Result<QueryResult<AutopilotConfiguration>> {
        self.client
            .get(consul_api_path::OPERATOR_AUTOPILOT_CONFIGURATION)
            .query_options(q)
            .execute()
            .await
    }

    pub async fn autopilot_set_configuration(
        &self,
        conf: &AutopilotConfiguration,
        w: Option<&WriteOptions>,
    ) -> Result<WriteResult<()>> {
        self.client
            .put(consul_api_path::OPERATOR_AUTOPILOT_CONFIGURATION)
            .write_options(w)
            .json(conf)?
            .execute_write_empty()
            .await
    }

    /// Update only if the stored configuration still has `conf.modify_index`
    pub async fn autopilot_cas_configuration(
        &self,
        conf: &AutopilotConfiguration,
        w: Option<&WriteOptions>,
    ) -> Result<WriteResult<bool>> {
        self.client
            .put(consul_api_path::OPERATOR_AUTOPILOT_CONFIGURATION)
            .param("cas", conf.modify_index)
            .write_options(w)
            .json(conf)?
            .execute_write()
            .await
    }

    /// Health of every server; an unhealthy cluster answers 429 with the same body
    pub async fn autopilot_server_health(
        &self,
        q: Option<&QueryOptions>,
    ) -> Result<QueryResult<OperatorHealthReply>> {
        let (response, elapsed) = self
            .client
            .get(consul_api_path::OPERATOR_AUTOPILOT_HEALTH)
            .query_options(q)
            .send()
            .await?;
        let status = response.status();
        if status != StatusCode::OK && status != StatusCode::TOO_MANY_REQUESTS {
            return Err(unexpected_response(response).await);
        }
        let meta = QueryMeta::from_headers(response.headers(), elapsed);
        let body = response.bytes().await?;
        Ok(QueryResult {
            status: status.as_u16(),
            meta,
            response: decode(&body)?,
        })
    }

    pub async fn autopilot_state(
        &self,
        q: Option<&QueryOptions>,
    ) -> Result<QueryResult<AutopilotState>> {
        self.client
            .get(consul_api_path::OPERATOR_AUTOPILOT_STATE)
            .query_options(q)
            .execute()
            .await
    }
}

fn keyring_params<'r>(request: ConsulRequest<'r>, opts: &KeyringOptions) -> ConsulRequest<'r> {
    request
        .param_opt("local-only", opts.local_only.then_some(true))
        .param_opt("relay-factor", opts.relay_factor)
}
