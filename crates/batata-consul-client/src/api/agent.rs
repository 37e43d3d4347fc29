// Local agent endpoints, `/v1/agent/*`

use std::collections::HashMap;

use bytes::Bytes;
use futures::stream::{self, BoxStream, Stream, StreamExt};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;

use crate::client::ConsulClient;
use crate::constants::consul_api_path;
use crate::error::{ConsulError, Result};
use crate::model::{
    AgentCheckRegistration, AgentMember, AgentSelf, AgentService, AgentServiceChecksInfo,
    AgentServiceRegistration, AgentToken, AgentTokenKind, AgentVersion, CARootList, CheckUpdate,
    HealthCheck, HealthStatus, LeafCert, MembersOptions, MetricsInfo,
};
use crate::request::{
    QueryOptions, QueryResult, WriteOptions, WriteResult, decode, unexpected_response,
};

/// Log lines streamed by [`Agent::monitor`]
pub type LogLines = BoxStream<'static, Result<String>>;

/// Operations on the agent the client talks to
pub struct Agent<'a> {
    client: &'a ConsulClient,
}

impl<'a> Agent<'a> {
    pub(crate) fn new(client: &'a ConsulClient) -> Self {
        Self { client }
    }

    // ============================================================================
    // Agent info
    // ============================================================================

    /// Configuration and member information of the agent
    pub async fn self_info(&self) -> Result<QueryResult<AgentSelf>> {
        self.client.get(consul_api_path::AGENT_SELF).execute().await
    }

    /// Host information (CPU, memory, disk) of the agent's machine
    pub async fn host(&self) -> Result<QueryResult<serde_json::Value>> {
        self.client.get(consul_api_path::AGENT_HOST).execute().await
    }

    pub async fn version(&self) -> Result<QueryResult<AgentVersion>> {
        self.client.get(consul_api_path::AGENT_VERSION).execute().await
    }

    /// Node name of the agent
    pub async fn node_name(&self) -> Result<String> {
        let info = self.self_info().await?;
        Ok(info.response.config.node_name)
    }

    pub async fn members(&self, opts: &MembersOptions) -> Result<QueryResult<Vec<AgentMember>>> {
        self.client
            .get(consul_api_path::AGENT_MEMBERS)
            .flag_if("wan", opts.wan)
            .param_opt("segment", opts.segment.as_deref())
            .execute()
            .await
    }

    pub async fn metrics(&self) -> Result<QueryResult<MetricsInfo>> {
        self.client.get(consul_api_path::AGENT_METRICS).execute().await
    }

    pub async fn reload(&self) -> Result<WriteResult<()>> {
        self.client
            .put(consul_api_path::AGENT_RELOAD)
            .execute_write_empty()
            .await
    }

    // ============================================================================
    // Services
    // ============================================================================

    /// Services registered with the agent, keyed by service ID
    pub async fn services(&self) -> Result<QueryResult<HashMap<String, AgentService>>> {
        self.services_with_filter("").await
    }

    pub async fn services_with_filter(
        &self,
        filter: &str,
    ) -> Result<QueryResult<HashMap<String, AgentService>>> {
        self.client
            .get(consul_api_path::AGENT_SERVICES)
            .param_opt("filter", Some(filter).filter(|f| !f.is_empty()))
            .execute()
            .await
    }

    /// One locally registered service; `None` when unknown to the agent
    pub async fn service(
        &self,
        service_id: &str,
        q: Option<&QueryOptions>,
    ) -> Result<QueryResult<Option<AgentService>>> {
        self.client
            .get(format!("{}/{}", consul_api_path::AGENT_SERVICE, service_id))
            .query_options(q)
            .execute_optional()
            .await
    }

    /// Register a service; `replace_existing_checks` drops checks missing from `registration`
    pub async fn service_register(
        &self,
        registration: &AgentServiceRegistration,
        replace_existing_checks: bool,
        w: Option<&WriteOptions>,
    ) -> Result<WriteResult<()>> {
        self.client
            .put(consul_api_path::AGENT_SERVICE_REGISTER)
            .flag_if("replace-existing-checks", replace_existing_checks)
            .write_options(w)
            .json(registration)?
            .execute_write_empty()
            .await
    }

    pub async fn service_deregister(
        &self,
        service_id: &str,
        w: Option<&WriteOptions>,
    ) -> Result<WriteResult<()>> {
        self.client
            .put(format!(
                "{}/{}",
                consul_api_path::AGENT_SERVICE_DEREGISTER,
                service_id
            ))
            .write_options(w)
            .execute_write_empty()
            .await
    }

    pub async fn enable_service_maintenance(
        &self,
        service_id: &str,
        reason: &str,
    ) -> Result<WriteResult<()>> {
        self.client
            .put(format!(
                "{}/{}",
                consul_api_path::AGENT_SERVICE_MAINTENANCE,
                service_id
            ))
            .param("enable", true)
            .param_opt("reason", Some(reason).filter(|r| !r.is_empty()))
            .execute_write_empty()
            .await
    }

    pub async fn disable_service_maintenance(&self, service_id: &str) -> Result<WriteResult<()>> {
        self.client
            .put(format!(
                "{}/{}",
                consul_api_path::AGENT_SERVICE_MAINTENANCE,
                service_id
            ))
            .param("enable", false)
            .execute_write_empty()
            .await
    }

    // ============================================================================
    // Checks
    // ============================================================================

    /// Checks registered with the agent, keyed by check ID
    pub async fn checks(&self) -> Result<QueryResult<HashMap<String, HealthCheck>>> {
        self.checks_with_filter("").await
    }

    pub async fn checks_with_filter(
        &self,
        filter: &str,
    ) -> Result<QueryResult<HashMap<String, HealthCheck>>> {
        self.client
            .get(consul_api_path::AGENT_CHECKS)
            .param_opt("filter", Some(filter).filter(|f| !f.is_empty()))
            .execute()
            .await
    }

    pub async fn check_register(
        &self,
        registration: &AgentCheckRegistration,
        w: Option<&WriteOptions>,
    ) -> Result<WriteResult<()>> {
        self.client
            .put(consul_api_path::AGENT_CHECK_REGISTER)
            .write_options(w)
            .json(registration)?
            .execute_write_empty()
            .await
    }

    pub async fn check_deregister(
        &self,
        check_id: &str,
        w: Option<&WriteOptions>,
    ) -> Result<WriteResult<()>> {
        self.client
            .put(format!(
                "{}/{}",
                consul_api_path::AGENT_CHECK_DEREGISTER,
                check_id
            ))
            .write_options(w)
            .execute_write_empty()
            .await
    }

    /// Mark a TTL check as passing
    pub async fn pass_ttl(&self, check_id: &str, note: &str) -> Result<WriteResult<()>> {
        self.update_ttl(check_id, note, HealthStatus::Passing).await
    }

    pub async fn warn_ttl(&self, check_id: &str, note: &str) -> Result<WriteResult<()>> {
        self.update_ttl(check_id, note, HealthStatus::Warning).await
    }

    pub async fn fail_ttl(&self, check_id: &str, note: &str) -> Result<WriteResult<()>> {
        self.update_ttl(check_id, note, HealthStatus::Critical).await
    }

    /// Set the status and output of a TTL check
    pub async fn update_ttl(
        &self,
        check_id: &str,
        output: &str,
        status: HealthStatus,
    ) -> Result<WriteResult<()>> {
        if !matches!(
            status,
            HealthStatus::Passing | HealthStatus::Warning | HealthStatus::Critical
        ) {
            return Err(ConsulError::InvalidArgument(format!(
                "TTL checks cannot be set to '{status}'"
            )));
        }
        let update = CheckUpdate {
            status,
            output: output.to_string(),
        };
        self.client
            .put(format!("{}/{}", consul_api_path::AGENT_CHECK_UPDATE, check_id))
            .json(&update)?
            .execute_write_empty()
            .await
    }

    // ============================================================================
    // Cluster membership
    // ============================================================================

    /// Join the cluster through `address`; `wan` joins the WAN pool
    pub async fn join(&self, address: &str, wan: bool) -> Result<WriteResult<()>> {
        self.client
            .put(format!("{}/{}", consul_api_path::AGENT_JOIN, address))
            .flag_if("wan", wan)
            .execute_write_empty()
            .await
    }

    /// Gracefully leave the cluster and shut the agent down
    pub async fn leave(&self) -> Result<WriteResult<()>> {
        self.client
            .put(consul_api_path::AGENT_LEAVE)
            .execute_write_empty()
            .await
    }

    /// Force a failed node into the left state; `prune` removes it entirely
    pub async fn force_leave(&self, node: &str, prune: bool) -> Result<WriteResult<()>> {
        self.client
            .put(format!("{}/{}", consul_api_path::AGENT_FORCE_LEAVE, node))
            .flag_if("prune", prune)
            .execute_write_empty()
            .await
    }

    pub async fn enable_node_maintenance(&self, reason: &str) -> Result<WriteResult<()>> {
        self.client
            .put(consul_api_path::AGENT_MAINTENANCE)
            .param("enable", true)
            .param_opt("reason", Some(reason).filter(|r| !r.is_empty()))
            .execute_write_empty()
            .await
    }

    pub async fn disable_node_maintenance(&self) -> Result<WriteResult<()>> {
        self.client
            .put(consul_api_path::AGENT_MAINTENANCE)
            .param("enable", false)
            .execute_write_empty()
            .await
    }

    /// Replace one of the ACL tokens the agent uses
    pub async fn update_token(
        &self,
        kind: AgentTokenKind,
        token: &str,
        w: Option<&WriteOptions>,
    ) -> Result<WriteResult<()>> {
        self.client
            .put(format!("{}/{}", consul_api_path::AGENT_TOKEN, kind.as_path()))
            .write_options(w)
            .json(&AgentToken { token })?
            .execute_write_empty()
            .await
    }

    // ============================================================================
    // Connect
    // ============================================================================

    pub async fn connect_ca_roots(
        &self,
        q: Option<&QueryOptions>,
    ) -> Result<QueryResult<CARootList>> {
        self.client
            .get(consul_api_path::AGENT_CA_ROOTS)
            .query_options(q)
            .execute()
            .await
    }

    /// Leaf certificate for `service`, issued by the agent's local CA cache
    pub async fn connect_ca_leaf(
        &self,
        service: &str,
        q: Option<&QueryOptions>,
    ) -> Result<QueryResult<LeafCert>> {
        self.client
            .get(format!("{}/{}", consul_api_path::AGENT_CA_LEAF, service))
            .query_options(q)
            .execute()
            .await
    }

    // ============================================================================
    // Local service health
    // ============================================================================

    /// Aggregated local health of one service instance.
    ///
    /// The agent encodes the status in the HTTP code: 200 passing, 429 warning,
    /// 503 critical. An unknown service comes back as critical with no info.
    pub async fn health_service_by_id(
        &self,
        service_id: &str,
    ) -> Result<(HealthStatus, Option<AgentServiceChecksInfo>)> {
        self.local_health(format!(
            "{}/{}",
            consul_api_path::AGENT_HEALTH_SERVICE_ID,
            service_id
        ))
        .await
    }

    /// Aggregated local health of every instance of a service name
    pub async fn health_service_by_name(
        &self,
        service: &str,
    ) -> Result<(HealthStatus, Vec<AgentServiceChecksInfo>)> {
        self.local_health(format!(
            "{}/{}",
            consul_api_path::AGENT_HEALTH_SERVICE_NAME,
            service
        ))
        .await
    }

    async fn local_health<T: DeserializeOwned + Default>(
        &self,
        path: String,
    ) -> Result<(HealthStatus, T)> {
        let (response, _) = self.client.get(path).param("format", "json").send().await?;
        let status = match response.status() {
            StatusCode::OK => HealthStatus::Passing,
            StatusCode::TOO_MANY_REQUESTS => HealthStatus::Warning,
            StatusCode::SERVICE_UNAVAILABLE => HealthStatus::Critical,
            StatusCode::NOT_FOUND => return Ok((HealthStatus::Critical, T::default())),
            _ => return Err(unexpected_response(response).await),
        };
        let body = response.bytes().await?;
        Ok((status, decode(&body)?))
    }

    // ============================================================================
    // Monitor
    // ============================================================================

    /// Stream the agent's log at `log_level` (`trace`, `debug`, `info`, ...)
    /// until the stream is dropped
    pub async fn monitor(&self, log_level: Option<&str>) -> Result<LogLines> {
        let (response, _) = self
            .client
            .get(consul_api_path::AGENT_MONITOR)
            .param_opt("loglevel", log_level)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(unexpected_response(response).await);
        }
        Ok(split_lines(response.bytes_stream()))
    }
}

/// Re-chunk a byte stream into text lines without the trailing newline
fn split_lines<S, E>(body: S) -> LogLines
where
    S: Stream<Item = std::result::Result<Bytes, E>> + Send + 'static,
    E: Into<ConsulError> + Send,
{
    let state = (Box::pin(body), Vec::<u8>::new(), false);
    stream::unfold(state, |(mut body, mut buf, mut done)| async move {
        loop {
            if let Some(pos) = buf.iter().position(|b| *b == b'\n') {
                let line: Vec<u8> = buf.drain(..=pos).collect();
                let text = String::from_utf8_lossy(&line[..pos])
                    .trim_end_matches('\r')
                    .to_string();
                return Some((Ok(text), (body, buf, done)));
            }
            if done {
                if buf.is_empty() {
                    return None;
                }
                let text = String::from_utf8_lossy(&buf).into_owned();
                buf.clear();
                return Some((Ok(text), (body, buf, done)));
            }
            match body.next().await {
                Some(Ok(chunk)) => buf.extend_from_slice(&chunk),
                Some(Err(e)) => {
                    let err: ConsulError = e.into();
                    return Some((Err(err), (body, buf, true)));
                }
                None => done = true,
            }
        }
    })
    .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_split_lines_across_chunks() {
        let chunks: Vec<std::result::Result<Bytes, ConsulError>> = vec![
            Ok(Bytes::from_static(b"2024-01-01T00:00:00Z [INFO] agent: started\n2024")),
            Ok(Bytes::from_static(b"-01-01T00:00:01Z [DEBUG] agent: tick\r\n")),
            Ok(Bytes::from_static(b"partial")),
        ];
        let lines: Vec<String> = split_lines(stream::iter(chunks))
            .map(|l| l.unwrap())
            .collect()
            .await;
        assert_eq!(
            lines,
            vec![
                "2024-01-01T00:00:00Z [INFO] agent: started",
                "2024-01-01T00:00:01Z [DEBUG] agent: tick",
                "partial",
            ]
        );
    }

    #[tokio::test]
    async fn test_split_lines_surfaces_errors() {
        let chunks: Vec<std::result::Result<Bytes, ConsulError>> = vec![
            Ok(Bytes::from_static(b"one\n")),
            Err(ConsulError::AllServersFailed),
        ];
        let items: Vec<Result<String>> = split_lines(stream::iter(chunks)).collect().await;
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].as_ref().unwrap(), "one");
        assert!(matches!(items[1], Err(ConsulError::AllServersFailed)));
    }
}
