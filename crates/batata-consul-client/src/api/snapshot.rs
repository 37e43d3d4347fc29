// Snapshot endpoint, `/v1/snapshot`

use bytes::Bytes;

use crate::client::ConsulClient;
use crate::constants::consul_api_path;
use crate::error::Result;
use crate::request::{QueryOptions, QueryResult, WriteOptions, WriteResult};

/// Point-in-time archive of the server state
pub struct Snapshot<'a> {
    client: &'a ConsulClient,
}

impl<'a> Snapshot<'a> {
    pub(crate) fn new(client: &'a ConsulClient) -> Self {
        Self { client }
    }

    /// Download a gzipped snapshot archive; `meta.last_index` is the index it was taken at
    pub async fn save(&self, q: Option<&QueryOptions>) -> Result<QueryResult<Bytes>> {
        self.client
            .get(consul_api_path::SNAPSHOT)
            .query_options(q)
            .execute_bytes()
            .await
    }

    /// Replace the server state with a previously saved archive
    pub async fn restore(
        &self,
        archive: impl Into<Bytes>,
        w: Option<&WriteOptions>,
    ) -> Result<WriteResult<()>> {
        self.client
            .put(consul_api_path::SNAPSHOT)
            .write_options(w)
            .raw(archive)
            .execute_write_empty()
            .await
    }
}
