// Session endpoints, `/v1/session/*`

use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

use crate::client::ConsulClient;
use crate::constants::consul_api_path;
use crate::error::{ConsulError, Result};
use crate::model::{SessionEntry, SessionId, SessionRequest};
use crate::request::{QueryOptions, QueryResult, WriteOptions, WriteResult};

/// Sessions tie locks and ephemeral keys to node and service health
pub struct Session<'a> {
    client: &'a ConsulClient,
}

impl<'a> Session<'a> {
    pub(crate) fn new(client: &'a ConsulClient) -> Self {
        Self { client }
    }

    /// Create a session and return its ID
    pub async fn create(
        &self,
        request: &SessionRequest,
        w: Option<&WriteOptions>,
    ) -> Result<WriteResult<String>> {
        let result = self
            .client
            .put(consul_api_path::SESSION_CREATE)
            .write_options(w)
            .json(request)?
            .execute_write::<SessionId>()
            .await?;
        Ok(result.map(|s| s.id))
    }

    /// Create a session bound to no health check, so only its TTL can expire it
    pub async fn create_no_checks(
        &self,
        request: &SessionRequest,
        w: Option<&WriteOptions>,
    ) -> Result<WriteResult<String>> {
        let mut request = request.clone();
        request.node_checks = Some(Vec::new());
        request.checks = Some(Vec::new());
        if request.service_checks.is_none() {
            request.service_checks = Some(Vec::new());
        }
        self.create(&request, w).await
    }

    pub async fn destroy(&self, id: &str, w: Option<&WriteOptions>) -> Result<WriteResult<bool>> {
        self.client
            .put(format!("{}/{}", consul_api_path::SESSION_DESTROY, id))
            .write_options(w)
            .execute_write()
            .await
    }

    /// Look up one session; `None` when it does not exist
    pub async fn info(
        &self,
        id: &str,
        q: Option<&QueryOptions>,
    ) -> Result<QueryResult<Option<SessionEntry>>> {
        let result = self
            .client
            .get(format!("{}/{}", consul_api_path::SESSION_INFO, id))
            .query_options(q)
            .execute_optional::<Option<Vec<SessionEntry>>>()
            .await?;
        Ok(result.map(|entries| entries.flatten().and_then(|e| e.into_iter().next())))
    }

    pub async fn list(&self, q: Option<&QueryOptions>) -> Result<QueryResult<Vec<SessionEntry>>> {
        self.client
            .get(consul_api_path::SESSION_LIST)
            .query_options(q)
            .execute()
            .await
    }

    /// Sessions belonging to `node`
    pub async fn node(
        &self,
        node: &str,
        q: Option<&QueryOptions>,
    ) -> Result<QueryResult<Vec<SessionEntry>>> {
        self.client
            .get(format!("{}/{}", consul_api_path::SESSION_NODE, node))
            .query_options(q)
            .execute()
            .await
    }

    /// Reset the TTL of a session.
    ///
    /// Fails with [`ConsulError::SessionExpired`] when the server no longer
    /// knows the session.
    pub async fn renew(
        &self,
        id: &str,
        w: Option<&WriteOptions>,
    ) -> Result<WriteResult<SessionEntry>> {
        let result = self
            .client
            .put(format!("{}/{}", consul_api_path::SESSION_RENEW, id))
            .write_options(w)
            .execute_write::<Option<Vec<SessionEntry>>>()
            .await;
        let result = match result {
            Err(e) if e.is_not_found() => return Err(ConsulError::SessionExpired(id.to_string())),
            other => other?,
        };
        let status = result.status;
        let request_time = result.request_time;
        match result.response.and_then(|e| e.into_iter().next()) {
            Some(entry) => Ok(WriteResult {
                status,
                request_time,
                response: entry,
            }),
            None => Err(ConsulError::SessionExpired(id.to_string())),
        }
    }

    /// Keep renewing `id` every half TTL until `shutdown` resolves, then destroy it.
    ///
    /// Returns [`ConsulError::SessionExpired`] when the session disappears,
    /// or the last renew error once the TTL has run out without a successful
    /// renewal.
    pub async fn renew_periodic<F>(
        &self,
        initial_ttl: Duration,
        id: &str,
        w: Option<&WriteOptions>,
        shutdown: F,
    ) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        if initial_ttl.is_zero() {
            return Err(ConsulError::InvalidArgument(
                "session TTL must be greater than zero".to_string(),
            ));
        }

        tokio::pin!(shutdown);
        let mut ttl = initial_ttl;
        let mut wait_dur = ttl / 2;
        let mut last_renew = tokio::time::Instant::now();
        let mut last_err: Option<ConsulError> = None;

        loop {
            if last_renew.elapsed() > ttl {
                return Err(last_err.unwrap_or_else(|| ConsulError::SessionExpired(id.to_string())));
            }

            tokio::select! {
                _ = tokio::time::sleep(wait_dur) => {
                    match self.renew(id, w).await {
                        Ok(result) => {
                            if let Some(new_ttl) = result.response.ttl.filter(|t| !t.is_zero()) {
                                ttl = new_ttl;
                            }
                            wait_dur = ttl / 2;
                            last_renew = tokio::time::Instant::now();
                            last_err = None;
                            debug!("Renewed session {}", id);
                        }
                        Err(ConsulError::SessionExpired(sid)) => {
                            return Err(ConsulError::SessionExpired(sid));
                        }
                        Err(e) => {
                            warn!("Failed to renew session {}: {}", id, e);
                            wait_dur = Duration::from_secs(1);
                            last_err = Some(e);
                        }
                    }
                }
                _ = &mut shutdown => {
                    debug!("Stopping renewal of session {}", id);
                    self.destroy(id, w).await?;
                    return Ok(());
                }
            }
        }
    }
}
