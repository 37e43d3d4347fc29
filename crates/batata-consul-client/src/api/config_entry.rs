// Configuration entry endpoints, `/v1/config`

use crate::client::ConsulClient;
use crate::constants::consul_api_path;
use crate::error::{ConsulError, Result};
use crate::model::ConfigEntry;
use crate::request::{QueryOptions, QueryResult, WriteOptions, WriteResult};

/// Centralized service mesh configuration
pub struct ConfigEntries<'a> {
    client: &'a ConsulClient,
}

impl<'a> ConfigEntries<'a> {
    pub(crate) fn new(client: &'a ConsulClient) -> Self {
        Self { client }
    }

    /// Create or replace an entry
    pub async fn set(
        &self,
        entry: &ConfigEntry,
        w: Option<&WriteOptions>,
    ) -> Result<WriteResult<bool>> {
        validate(entry)?;
        self.client
            .put(consul_api_path::CONFIG)
            .write_options(w)
            .json(entry)?
            .execute_write()
            .await
    }

    /// Write only when the stored entry still has `index`; 0 means "must not exist"
    pub async fn cas(
        &self,
        entry: &ConfigEntry,
        index: u64,
        w: Option<&WriteOptions>,
    ) -> Result<WriteResult<bool>> {
        validate(entry)?;
        self.client
            .put(consul_api_path::CONFIG)
            .param("cas", index)
            .write_options(w)
            .json(entry)?
            .execute_write()
            .await
    }

    /// Read one entry; `None` when it does not exist
    pub async fn get(
        &self,
        kind: &str,
        name: &str,
        q: Option<&QueryOptions>,
    ) -> Result<QueryResult<Option<ConfigEntry>>> {
        require("kind", kind)?;
        require("name", name)?;
        self.client
            .get(format!("{}/{}/{}", consul_api_path::CONFIG, kind, name))
            .query_options(q)
            .execute_optional()
            .await
    }

    /// Every entry of `kind`
    pub async fn list(
        &self,
        kind: &str,
        q: Option<&QueryOptions>,
    ) -> Result<QueryResult<Vec<ConfigEntry>>> {
        require("kind", kind)?;
        self.client
            .get(format!("{}/{}", consul_api_path::CONFIG, kind))
            .query_options(q)
            .execute()
            .await
    }

    pub async fn delete(
        &self,
        kind: &str,
        name: &str,
        w: Option<&WriteOptions>,
    ) -> Result<WriteResult<()>> {
        require("kind", kind)?;
        require("name", name)?;
        self.client
            .delete(format!("{}/{}/{}", consul_api_path::CONFIG, kind, name))
            .write_options(w)
            .execute_write_empty()
            .await
    }
}

fn require(what: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(ConsulError::InvalidArgument(format!(
            "config entry {what} must not be empty"
        )));
    }
    Ok(())
}

fn validate(entry: &ConfigEntry) -> Result<()> {
    require("kind", entry.kind())?;
    require("name", entry.name())
}
