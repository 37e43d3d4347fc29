// Escape hatch for endpoints without a typed façade

use serde::{Serialize, de::DeserializeOwned};

use crate::client::ConsulClient;
use crate::error::Result;
use crate::request::{ConsulRequest, QueryOptions, QueryResult, WriteOptions, WriteResult};

/// Untyped access to arbitrary `/v1/...` paths
pub struct Raw<'a> {
    client: &'a ConsulClient,
}

impl<'a> Raw<'a> {
    pub(crate) fn new(client: &'a ConsulClient) -> Self {
        Self { client }
    }

    /// GET `path` and decode the body, e.g. into a `serde_json::Value`.
    ///
    /// A query string on `path` (`/v1/agent/members?wan`) is sent as parameters.
    pub async fn query<T: DeserializeOwned>(
        &self,
        path: &str,
        q: Option<&QueryOptions>,
    ) -> Result<QueryResult<T>> {
        let (path, query) = split_query(path);
        with_params(self.client.get(path), query)
            .query_options(q)
            .execute()
            .await
    }

    /// PUT `body` as JSON to `path` and decode the reply; query strings work as in `query`
    pub async fn write<B, T>(
        &self,
        path: &str,
        body: &B,
        w: Option<&WriteOptions>,
    ) -> Result<WriteResult<T>>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let (path, query) = split_query(path);
        with_params(self.client.put(path), query)
            .write_options(w)
            .json(body)?
            .execute_write()
            .await
    }
}

fn split_query(path: &str) -> (&str, Option<&str>) {
    match path.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (path, None),
    }
}

fn with_params<'a>(mut request: ConsulRequest<'a>, query: Option<&str>) -> ConsulRequest<'a> {
    if let Some(query) = query {
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            request = request.param(&key, value);
        }
    }
    request
}
