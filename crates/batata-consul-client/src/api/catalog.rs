// Catalog endpoints, `/v1/catalog/*`

use std::collections::HashMap;

use crate::client::ConsulClient;
use crate::constants::consul_api_path;
use crate::error::Result;
use crate::model::{
    CatalogDeregistration, CatalogNode, CatalogRegistration, CatalogService, GatewayService, Node,
};
use crate::request::{ConsulRequest, QueryOptions, QueryResult, WriteOptions, WriteResult};

/// Cluster wide registry of nodes and services
pub struct Catalog<'a> {
    client: &'a ConsulClient,
}

impl<'a> Catalog<'a> {
    pub(crate) fn new(client: &'a ConsulClient) -> Self {
        Self { client }
    }

    /// Register or update a node, optionally with a service and checks
    pub async fn register(
        &self,
        registration: &CatalogRegistration,
        w: Option<&WriteOptions>,
    ) -> Result<WriteResult<bool>> {
        self.client
            .put(consul_api_path::CATALOG_REGISTER)
            .write_options(w)
            .json(registration)?
            .execute_write()
            .await
    }

    pub async fn deregister(
        &self,
        deregistration: &CatalogDeregistration,
        w: Option<&WriteOptions>,
    ) -> Result<WriteResult<bool>> {
        self.client
            .put(consul_api_path::CATALOG_DEREGISTER)
            .write_options(w)
            .json(deregistration)?
            .execute_write()
            .await
    }

    /// Known datacenters, sorted by estimated round trip time
    pub async fn datacenters(&self) -> Result<QueryResult<Vec<String>>> {
        self.client
            .get(consul_api_path::CATALOG_DATACENTERS)
            .execute()
            .await
    }

    pub async fn nodes(&self, q: Option<&QueryOptions>) -> Result<QueryResult<Vec<Node>>> {
        self.client
            .get(consul_api_path::CATALOG_NODES)
            .query_options(q)
            .execute()
            .await
    }

    /// Service names with the union of their tags
    pub async fn services(
        &self,
        q: Option<&QueryOptions>,
    ) -> Result<QueryResult<HashMap<String, Vec<String>>>> {
        self.client
            .get(consul_api_path::CATALOG_SERVICES)
            .query_options(q)
            .execute()
            .await
    }

    /// Instances of `service` carrying every tag in `tags`
    pub async fn service(
        &self,
        service: &str,
        tags: &[&str],
        q: Option<&QueryOptions>,
    ) -> Result<QueryResult<Vec<CatalogService>>> {
        let request = self
            .client
            .get(format!("{}/{}", consul_api_path::CATALOG_SERVICE, service));
        with_tags(request, tags).query_options(q).execute().await
    }

    /// Connect capable instances (proxies and native services) of `service`
    pub async fn connect_service(
        &self,
        service: &str,
        tags: &[&str],
        q: Option<&QueryOptions>,
    ) -> Result<QueryResult<Vec<CatalogService>>> {
        let request = self
            .client
            .get(format!("{}/{}", consul_api_path::CATALOG_CONNECT, service));
        with_tags(request, tags).query_options(q).execute().await
    }

    /// A node and its services; `None` when the node is unknown
    pub async fn node(
        &self,
        node: &str,
        q: Option<&QueryOptions>,
    ) -> Result<QueryResult<Option<CatalogNode>>> {
        let result = self
            .client
            .get(format!("{}/{}", consul_api_path::CATALOG_NODE, node))
            .query_options(q)
            .execute_optional::<Option<CatalogNode>>()
            .await?;
        Ok(result.map(Option::flatten))
    }

    /// Services linked to an ingress or terminating gateway
    pub async fn gateway_services(
        &self,
        gateway: &str,
        q: Option<&QueryOptions>,
    ) -> Result<QueryResult<Vec<GatewayService>>> {
        self.client
            .get(format!(
                "{}/{}",
                consul_api_path::CATALOG_GATEWAY_SERVICES,
                gateway
            ))
            .query_options(q)
            .execute()
            .await
    }
}

pub(crate) fn with_tags<'r>(mut request: ConsulRequest<'r>, tags: &[&str]) -> ConsulRequest<'r> {
    for tag in tags {
        request = request.param("tag", tag);
    }
    request
}
