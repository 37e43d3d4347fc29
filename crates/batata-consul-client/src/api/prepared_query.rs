// Prepared query endpoints, `/v1/query`

use crate::client::ConsulClient;
use crate::constants::consul_api_path;
use crate::error::{ConsulError, Result};
use crate::model::{
    PreparedQueryCreated, PreparedQueryDefinition, PreparedQueryExecuteResponse,
    PreparedQueryExplainResponse,
};
use crate::request::{QueryOptions, QueryResult, WriteOptions, WriteResult};

/// Stored service queries with failover, executed server side
pub struct PreparedQuery<'a> {
    client: &'a ConsulClient,
}

impl<'a> PreparedQuery<'a> {
    pub(crate) fn new(client: &'a ConsulClient) -> Self {
        Self { client }
    }

    /// Store a new query and return its ID
    pub async fn create(
        &self,
        query: &PreparedQueryDefinition,
        w: Option<&WriteOptions>,
    ) -> Result<WriteResult<String>> {
        let result = self
            .client
            .post(consul_api_path::QUERY)
            .write_options(w)
            .json(query)?
            .execute_write::<PreparedQueryCreated>()
            .await?;
        Ok(result.map(|c| c.id))
    }

    pub async fn update(
        &self,
        query: &PreparedQueryDefinition,
        w: Option<&WriteOptions>,
    ) -> Result<WriteResult<()>> {
        if query.id.is_empty() {
            return Err(ConsulError::InvalidArgument(
                "prepared query ID must be set for an update".to_string(),
            ));
        }
        self.client
            .put(format!("{}/{}", consul_api_path::QUERY, query.id))
            .write_options(w)
            .json(query)?
            .execute_write_empty()
            .await
    }

    pub async fn list(
        &self,
        q: Option<&QueryOptions>,
    ) -> Result<QueryResult<Vec<PreparedQueryDefinition>>> {
        self.client
            .get(consul_api_path::QUERY)
            .query_options(q)
            .execute()
            .await
    }

    /// Read one query; `None` when the ID is unknown
    pub async fn get(
        &self,
        id: &str,
        q: Option<&QueryOptions>,
    ) -> Result<QueryResult<Option<PreparedQueryDefinition>>> {
        let result = self
            .client
            .get(format!("{}/{}", consul_api_path::QUERY, id))
            .query_options(q)
            .execute_optional::<Vec<PreparedQueryDefinition>>()
            .await?;
        Ok(result.map(|defs| defs.and_then(|d| d.into_iter().next())))
    }

    pub async fn delete(&self, id: &str, w: Option<&WriteOptions>) -> Result<WriteResult<()>> {
        self.client
            .delete(format!("{}/{}", consul_api_path::QUERY, id))
            .write_options(w)
            .execute_write_empty()
            .await
    }

    /// Run a query by ID or name
    pub async fn execute(
        &self,
        id_or_name: &str,
        q: Option<&QueryOptions>,
    ) -> Result<QueryResult<PreparedQueryExecuteResponse>> {
        self.client
            .get(format!("{}/{}/execute", consul_api_path::QUERY, id_or_name))
            .query_options(q)
            .execute()
            .await
    }

    /// Show the query a name resolves to once templates are rendered
    pub async fn explain(
        &self,
        id_or_name: &str,
        q: Option<&QueryOptions>,
    ) -> Result<QueryResult<PreparedQueryExplainResponse>> {
        self.client
            .get(format!("{}/{}/explain", consul_api_path::QUERY, id_or_name))
            .query_options(q)
            .execute()
            .await
    }
}
