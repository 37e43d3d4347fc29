// Status endpoints, `/v1/status/*`

use crate::client::ConsulClient;
use crate::constants::consul_api_path;
use crate::error::Result;
use crate::request::{QueryOptions, QueryResult};

pub struct Status<'a> {
    client: &'a ConsulClient,
}

impl<'a> Status<'a> {
    pub(crate) fn new(client: &'a ConsulClient) -> Self {
        Self { client }
    }

    /// Raft address of the current leader, empty when there is none
    pub async fn leader(&self, q: Option<&QueryOptions>) -> Result<QueryResult<String>> {
        let result = self
            .client
            .get(consul_api_path::STATUS_LEADER)
            .query_options(q)
            .execute::<Option<String>>()
            .await?;
        Ok(result.map(Option::unwrap_or_default))
    }

    /// Raft addresses of the voting peers
    pub async fn peers(&self, q: Option<&QueryOptions>) -> Result<QueryResult<Vec<String>>> {
        self.client
            .get(consul_api_path::STATUS_PEERS)
            .query_options(q)
            .execute()
            .await
    }
}
