// Health endpoints, `/v1/health/*`

use crate::api::catalog::with_tags;
use crate::client::ConsulClient;
use crate::constants::consul_api_path;
use crate::error::{ConsulError, Result};
use crate::model::{HealthCheck, HealthStatus, ServiceEntry};
use crate::request::{QueryOptions, QueryResult};

/// Check results as seen by the servers
pub struct Health<'a> {
    client: &'a ConsulClient,
}

impl<'a> Health<'a> {
    pub(crate) fn new(client: &'a ConsulClient) -> Self {
        Self { client }
    }

    /// Checks of one node
    pub async fn node(
        &self,
        node: &str,
        q: Option<&QueryOptions>,
    ) -> Result<QueryResult<Vec<HealthCheck>>> {
        self.client
            .get(format!("{}/{}", consul_api_path::HEALTH_NODE, node))
            .query_options(q)
            .execute()
            .await
    }

    /// Checks associated with a service
    pub async fn checks(
        &self,
        service: &str,
        q: Option<&QueryOptions>,
    ) -> Result<QueryResult<Vec<HealthCheck>>> {
        self.client
            .get(format!("{}/{}", consul_api_path::HEALTH_CHECKS, service))
            .query_options(q)
            .execute()
            .await
    }

    /// Instances of `service` with their node and checks
    pub async fn service(
        &self,
        service: &str,
        tags: &[&str],
        passing_only: bool,
        q: Option<&QueryOptions>,
    ) -> Result<QueryResult<Vec<ServiceEntry>>> {
        self.service_entries(consul_api_path::HEALTH_SERVICE, service, tags, passing_only, q)
            .await
    }

    /// Connect capable instances of `service`
    pub async fn connect(
        &self,
        service: &str,
        tags: &[&str],
        passing_only: bool,
        q: Option<&QueryOptions>,
    ) -> Result<QueryResult<Vec<ServiceEntry>>> {
        self.service_entries(consul_api_path::HEALTH_CONNECT, service, tags, passing_only, q)
            .await
    }

    /// Ingress gateways fronting `service`
    pub async fn ingress(
        &self,
        service: &str,
        passing_only: bool,
        q: Option<&QueryOptions>,
    ) -> Result<QueryResult<Vec<ServiceEntry>>> {
        self.service_entries(consul_api_path::HEALTH_INGRESS, service, &[], passing_only, q)
            .await
    }

    /// Checks currently in `state`; [`HealthStatus::Any`] returns every check
    pub async fn state(
        &self,
        state: HealthStatus,
        q: Option<&QueryOptions>,
    ) -> Result<QueryResult<Vec<HealthCheck>>> {
        if state == HealthStatus::Maintenance {
            return Err(ConsulError::InvalidArgument(
                "maintenance is not a queryable check state".to_string(),
            ));
        }
        self.client
            .get(format!("{}/{}", consul_api_path::HEALTH_STATE, state))
            .query_options(q)
            .execute()
            .await
    }

    async fn service_entries(
        &self,
        base: &str,
        service: &str,
        tags: &[&str],
        passing_only: bool,
        q: Option<&QueryOptions>,
    ) -> Result<QueryResult<Vec<ServiceEntry>>> {
        let request = self.client.get(format!("{base}/{service}"));
        with_tags(request, tags)
            .flag_if("passing", passing_only)
            .query_options(q)
            .execute()
            .await
    }
}
