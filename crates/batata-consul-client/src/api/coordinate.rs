// Network coordinate endpoints, `/v1/coordinate/*`

use crate::client::ConsulClient;
use crate::constants::consul_api_path;
use crate::error::Result;
use crate::model::{CoordinateDatacenterMap, CoordinateEntry};
use crate::request::{QueryOptions, QueryResult, WriteOptions, WriteResult};

/// Vivaldi network coordinates of nodes and servers
pub struct Coordinate<'a> {
    client: &'a ConsulClient,
}

impl<'a> Coordinate<'a> {
    pub(crate) fn new(client: &'a ConsulClient) -> Self {
        Self { client }
    }

    /// WAN coordinates of the servers of every datacenter
    pub async fn datacenters(&self) -> Result<QueryResult<Vec<CoordinateDatacenterMap>>> {
        self.client
            .get(consul_api_path::COORDINATE_DATACENTERS)
            .execute()
            .await
    }

    /// LAN coordinates of every node in the datacenter
    pub async fn nodes(
        &self,
        q: Option<&QueryOptions>,
    ) -> Result<QueryResult<Vec<CoordinateEntry>>> {
        self.client
            .get(consul_api_path::COORDINATE_NODES)
            .query_options(q)
            .execute()
            .await
    }

    /// LAN coordinates of one node, one entry per network segment
    pub async fn node(
        &self,
        node: &str,
        q: Option<&QueryOptions>,
    ) -> Result<QueryResult<Vec<CoordinateEntry>>> {
        let result = self
            .client
            .get(format!("{}/{}", consul_api_path::COORDINATE_NODE, node))
            .query_options(q)
            .execute_optional::<Vec<CoordinateEntry>>()
            .await?;
        Ok(result.map(Option::unwrap_or_default))
    }

    /// Push a coordinate for a node, as an agent does after its own estimation
    pub async fn update(
        &self,
        entry: &CoordinateEntry,
        w: Option<&WriteOptions>,
    ) -> Result<WriteResult<()>> {
        self.client
            .put(consul_api_path::COORDINATE_UPDATE)
            .write_options(w)
            .json(entry)?
            .execute_write_empty()
            .await
    }
}
