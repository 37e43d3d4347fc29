// Key/value store endpoints, `/v1/kv` and `/v1/txn`

use reqwest::StatusCode;

use crate::client::ConsulClient;
use crate::constants::consul_api_path;
use crate::error::{ConsulError, Result};
use crate::model::{KVPair, MAX_TXN_OPS, TxnOp, TxnResponse};
use crate::request::{
    QueryMeta, QueryOptions, QueryResult, WriteOptions, WriteResult, decode,
    unexpected_response,
};

/// Key/value store
pub struct Kv<'a> {
    client: &'a ConsulClient,
}

impl<'a> Kv<'a> {
    pub(crate) fn new(client: &'a ConsulClient) -> Self {
        Self { client }
    }

    /// Read one key; `None` when it does not exist
    pub async fn get(
        &self,
        key: &str,
        q: Option<&QueryOptions>,
    ) -> Result<QueryResult<Option<KVPair>>> {
        validate_key(key)?;
        let result = self
            .client
            .get(kv_path(key))
            .query_options(q)
            .execute_optional::<Vec<KVPair>>()
            .await?;
        Ok(result.map(|pairs| pairs.and_then(|p| p.into_iter().next())))
    }

    /// Read every key under `prefix`; empty when nothing matches
    pub async fn list(
        &self,
        prefix: &str,
        q: Option<&QueryOptions>,
    ) -> Result<QueryResult<Vec<KVPair>>> {
        validate_key(prefix)?;
        let result = self
            .client
            .get(kv_path(prefix))
            .flag("recurse")
            .query_options(q)
            .execute_optional::<Vec<KVPair>>()
            .await?;
        Ok(result.map(Option::unwrap_or_default))
    }

    /// List key names under `prefix`, stopping at `separator` when given
    pub async fn keys(
        &self,
        prefix: &str,
        separator: Option<&str>,
        q: Option<&QueryOptions>,
    ) -> Result<QueryResult<Vec<String>>> {
        validate_key(prefix)?;
        let result = self
            .client
            .get(kv_path(prefix))
            .flag("keys")
            .param_opt("separator", separator)
            .query_options(q)
            .execute_optional::<Vec<String>>()
            .await?;
        Ok(result.map(Option::unwrap_or_default))
    }

    /// Write `pair.value` under `pair.key`
    pub async fn put(&self, pair: &KVPair, w: Option<&WriteOptions>) -> Result<WriteResult<bool>> {
        self.write(pair, None, w).await
    }

    /// Write only when the key's modify index still equals `pair.modify_index`
    pub async fn cas(&self, pair: &KVPair, w: Option<&WriteOptions>) -> Result<WriteResult<bool>> {
        self.write(pair, Some(("cas", pair.modify_index.to_string())), w)
            .await
    }

    /// Write and take the lock of `pair.session` on the key
    pub async fn acquire(
        &self,
        pair: &KVPair,
        w: Option<&WriteOptions>,
    ) -> Result<WriteResult<bool>> {
        let session = session_of(pair)?;
        self.write(pair, Some(("acquire", session)), w).await
    }

    /// Write and give up the lock of `pair.session` on the key
    pub async fn release(
        &self,
        pair: &KVPair,
        w: Option<&WriteOptions>,
    ) -> Result<WriteResult<bool>> {
        let session = session_of(pair)?;
        self.write(pair, Some(("release", session)), w).await
    }

    pub async fn delete(&self, key: &str, w: Option<&WriteOptions>) -> Result<WriteResult<bool>> {
        validate_key(key)?;
        self.client
            .delete(kv_path(key))
            .write_options(w)
            .execute_write()
            .await
    }

    /// Delete only when the key's modify index still equals `pair.modify_index`
    pub async fn delete_cas(
        &self,
        pair: &KVPair,
        w: Option<&WriteOptions>,
    ) -> Result<WriteResult<bool>> {
        validate_key(&pair.key)?;
        self.client
            .delete(kv_path(&pair.key))
            .param("cas", pair.modify_index)
            .write_options(w)
            .execute_write()
            .await
    }

    /// Delete every key under `prefix`
    pub async fn delete_tree(
        &self,
        prefix: &str,
        w: Option<&WriteOptions>,
    ) -> Result<WriteResult<bool>> {
        validate_key(prefix)?;
        self.client
            .delete(kv_path(prefix))
            .flag("recurse")
            .write_options(w)
            .execute_write()
            .await
    }

    /// Apply `ops` atomically.
    ///
    /// A rolled back transaction is not an error: the response comes back with
    /// `committed == false` and the per-operation errors.
    pub async fn txn(
        &self,
        ops: &[TxnOp],
        q: Option<&QueryOptions>,
    ) -> Result<QueryResult<TxnResponse>> {
        if ops.len() > MAX_TXN_OPS {
            return Err(ConsulError::InvalidArgument(format!(
                "transaction has {} operations, at most {} are allowed",
                ops.len(),
                MAX_TXN_OPS
            )));
        }

        let (response, elapsed) = self
            .client
            .put(consul_api_path::TXN)
            .query_options(q)
            .json(ops)?
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK && status != StatusCode::CONFLICT {
            return Err(unexpected_response(response).await);
        }

        let meta = QueryMeta::from_headers(response.headers(), elapsed);
        let body = response.bytes().await?;
        let mut txn: TxnResponse = decode(&body)?;
        txn.committed = status == StatusCode::OK;
        Ok(QueryResult {
            status: status.as_u16(),
            meta,
            response: txn,
        })
    }

    async fn write(
        &self,
        pair: &KVPair,
        extra: Option<(&str, String)>,
        w: Option<&WriteOptions>,
    ) -> Result<WriteResult<bool>> {
        validate_key(&pair.key)?;
        let mut request = self
            .client
            .put(kv_path(&pair.key))
            .write_options(w)
            .raw(pair.value.clone().unwrap_or_default());
        if pair.flags != 0 {
            request = request.param("flags", pair.flags);
        }
        if let Some((key, value)) = extra {
            request = request.param(key, value);
        }
        request.execute_write().await
    }
}

fn kv_path(key: &str) -> String {
    format!("{}/{}", consul_api_path::KV, key)
}

pub(crate) fn validate_key(key: &str) -> Result<()> {
    if key.starts_with('/') {
        return Err(ConsulError::InvalidKey(key.to_string()));
    }
    Ok(())
}

fn session_of(pair: &KVPair) -> Result<String> {
    pair.session
        .clone()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ConsulError::InvalidArgument(format!("no session set for key {}", pair.key)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_key() {
        assert!(validate_key("app/config").is_ok());
        assert!(validate_key("").is_ok());
        assert!(matches!(
            validate_key("/app/config"),
            Err(ConsulError::InvalidKey(k)) if k == "/app/config"
        ));
    }

    #[test]
    fn test_kv_path_keeps_trailing_slash() {
        assert_eq!(kv_path("folder/"), "/v1/kv/folder/");
        assert_eq!(kv_path(""), "/v1/kv/");
    }

    #[test]
    fn test_session_required_for_lock_ops() {
        let pair = KVPair::new("k", "v");
        assert!(session_of(&pair).is_err());
        assert_eq!(session_of(&pair.with_session("s1")).unwrap(), "s1");
    }
}
