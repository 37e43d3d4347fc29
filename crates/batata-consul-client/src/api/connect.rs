// Connect endpoints: CA and intentions, `/v1/connect/*`

use std::collections::HashMap;

use crate::client::ConsulClient;
use crate::constants::consul_api_path;
use crate::error::Result;
use crate::model::{CAConfig, CARootList, Intention, IntentionCheckResponse, IntentionMatchType};
use crate::request::{QueryOptions, QueryResult, WriteOptions, WriteResult};

/// Service mesh certificate authority and intentions
pub struct Connect<'a> {
    client: &'a ConsulClient,
}

impl<'a> Connect<'a> {
    pub(crate) fn new(client: &'a ConsulClient) -> Self {
        Self { client }
    }

    // ============================================================================
    // CA
    // ============================================================================

    /// Trusted CA roots, the active one first
    pub async fn ca_roots(&self, q: Option<&QueryOptions>) -> Result<QueryResult<CARootList>> {
        self.client
            .get(consul_api_path::CONNECT_CA_ROOTS)
            .query_options(q)
            .execute()
            .await
    }

    pub async fn ca_get_config(&self, q: Option<&QueryOptions>) -> Result<QueryResult<CAConfig>> {
        self.client
            .get(consul_api_path::CONNECT_CA_CONFIGURATION)
            .query_options(q)
            .execute()
            .await
    }

    /// Change the CA provider or its settings; may trigger a root rotation
    pub async fn ca_set_config(
        &self,
        conf: &CAConfig,
        w: Option<&WriteOptions>,
    ) -> Result<WriteResult<()>> {
        self.client
            .put(consul_api_path::CONNECT_CA_CONFIGURATION)
            .write_options(w)
            .json(conf)?
            .execute_write_empty()
            .await
    }

    // ============================================================================
    // Intentions
    // ============================================================================

    /// Create or replace the intention between `intention.source_name` and
    /// `intention.destination_name`
    pub async fn intention_upsert(
        &self,
        intention: &Intention,
        w: Option<&WriteOptions>,
    ) -> Result<WriteResult<bool>> {
        self.client
            .put(consul_api_path::CONNECT_INTENTIONS_EXACT)
            .param("source", &intention.source_name)
            .param("destination", &intention.destination_name)
            .write_options(w)
            .json(intention)?
            .execute_write()
            .await
    }

    pub async fn intention_get_exact(
        &self,
        source: &str,
        destination: &str,
        q: Option<&QueryOptions>,
    ) -> Result<QueryResult<Option<Intention>>> {
        self.client
            .get(consul_api_path::CONNECT_INTENTIONS_EXACT)
            .param("source", source)
            .param("destination", destination)
            .query_options(q)
            .execute_optional()
            .await
    }

    pub async fn intention_delete_exact(
        &self,
        source: &str,
        destination: &str,
        w: Option<&WriteOptions>,
    ) -> Result<WriteResult<bool>> {
        self.client
            .delete(consul_api_path::CONNECT_INTENTIONS_EXACT)
            .param("source", source)
            .param("destination", destination)
            .write_options(w)
            .execute_write()
            .await
    }

    pub async fn intentions(
        &self,
        q: Option<&QueryOptions>,
    ) -> Result<QueryResult<Vec<Intention>>> {
        self.client
            .get(consul_api_path::CONNECT_INTENTIONS)
            .query_options(q)
            .execute()
            .await
    }

    /// Intentions matching each of `names`, by source or destination, in
    /// precedence order
    pub async fn intention_match(
        &self,
        by: IntentionMatchType,
        names: &[&str],
        q: Option<&QueryOptions>,
    ) -> Result<QueryResult<HashMap<String, Vec<Intention>>>> {
        let mut request = self
            .client
            .get(consul_api_path::CONNECT_INTENTIONS_MATCH)
            .param("by", by.as_str());
        for name in names {
            request = request.param("name", name);
        }
        request.query_options(q).execute().await
    }

    /// Whether a connection from `source` to `destination` would be authorized
    pub async fn intention_check(
        &self,
        source: &str,
        destination: &str,
        q: Option<&QueryOptions>,
    ) -> Result<QueryResult<bool>> {
        let result = self
            .client
            .get(consul_api_path::CONNECT_INTENTIONS_CHECK)
            .param("source", source)
            .param("destination", destination)
            .query_options(q)
            .execute::<IntentionCheckResponse>()
            .await?;
        Ok(result.map(|r| r.allowed))
    }
}
