// Namespace endpoints, `/v1/namespace(s)`

use crate::client::ConsulClient;
use crate::constants::consul_api_path;
use crate::error::{ConsulError, Result};
use crate::model::Namespace;
use crate::request::{QueryOptions, QueryResult, WriteOptions, WriteResult};

pub struct Namespaces<'a> {
    client: &'a ConsulClient,
}

impl<'a> Namespaces<'a> {
    pub(crate) fn new(client: &'a ConsulClient) -> Self {
        Self { client }
    }

    pub async fn create(
        &self,
        ns: &Namespace,
        w: Option<&WriteOptions>,
    ) -> Result<WriteResult<Namespace>> {
        require_name(ns)?;
        self.client
            .put(consul_api_path::NAMESPACE)
            .write_options(w)
            .json(ns)?
            .execute_write()
            .await
    }

    pub async fn update(
        &self,
        ns: &Namespace,
        w: Option<&WriteOptions>,
    ) -> Result<WriteResult<Namespace>> {
        require_name(ns)?;
        self.client
            .put(format!("{}/{}", consul_api_path::NAMESPACE, ns.name))
            .write_options(w)
            .json(ns)?
            .execute_write()
            .await
    }

    /// Read one namespace; `None` when it does not exist
    pub async fn read(
        &self,
        name: &str,
        q: Option<&QueryOptions>,
    ) -> Result<QueryResult<Option<Namespace>>> {
        self.client
            .get(format!("{}/{}", consul_api_path::NAMESPACE, name))
            .query_options(q)
            .execute_optional()
            .await
    }

    pub async fn list(&self, q: Option<&QueryOptions>) -> Result<QueryResult<Vec<Namespace>>> {
        self.client
            .get(consul_api_path::NAMESPACES)
            .query_options(q)
            .execute()
            .await
    }

    /// Mark a namespace for deletion; it disappears once its contents are gone
    pub async fn delete(&self, name: &str, w: Option<&WriteOptions>) -> Result<WriteResult<()>> {
        self.client
            .delete(format!("{}/{}", consul_api_path::NAMESPACE, name))
            .write_options(w)
            .execute_write_empty()
            .await
    }
}

fn require_name(ns: &Namespace) -> Result<()> {
    if ns.name.is_empty() {
        return Err(ConsulError::InvalidArgument(
            "namespace name must not be empty".to_string(),
        ));
    }
    Ok(())
}
