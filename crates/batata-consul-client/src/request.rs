//! Generic request pipeline shared by every endpoint façade.
//!
//! A [`ConsulRequest`] is created with one of the verb helpers on
//! [`ConsulClient`](crate::ConsulClient), decorated with query/write options,
//! parameters and an optional body, and finally executed into a
//! [`QueryResult`] or [`WriteResult`].

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use bytes::Bytes;
use reqwest::{Method, Response, StatusCode, header::HeaderMap};
use serde::{Serialize, de::DeserializeOwned};
use tracing::debug;

use crate::client::ConsulClient;
use crate::codec::format_duration;
use crate::constants::header;
use crate::error::{ConsulError, Result};

/// Read consistency requested from the servers
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ConsistencyMode {
    /// Leader-served reads, may be stale during leader transitions
    #[default]
    Default,
    /// Leader verifies it is still the leader before answering
    Consistent,
    /// Any server may answer
    Stale,
}

/// Options applied to read requests
#[derive(Clone, Debug, Default)]
pub struct QueryOptions {
    pub datacenter: Option<String>,
    pub namespace: Option<String>,
    pub partition: Option<String>,
    pub consistency_mode: ConsistencyMode,
    /// Index to block on; the request returns once the index moves past it
    pub wait_index: Option<u64>,
    /// Maximum blocking duration, capped by the server at 10 minutes
    pub wait_time: Option<Duration>,
    pub token: Option<String>,
    /// Sort results by round trip time from this node (`_agent` for the local agent)
    pub near: Option<String>,
    /// Filter expression evaluated by the server
    pub filter: Option<String>,
    pub node_meta: BTreeMap<String, String>,
}

impl QueryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn datacenter(mut self, datacenter: &str) -> Self {
        self.datacenter = Some(datacenter.to_string());
        self
    }

    pub fn namespace(mut self, namespace: &str) -> Self {
        self.namespace = Some(namespace.to_string());
        self
    }

    pub fn partition(mut self, partition: &str) -> Self {
        self.partition = Some(partition.to_string());
        self
    }

    pub fn consistent(mut self) -> Self {
        self.consistency_mode = ConsistencyMode::Consistent;
        self
    }

    pub fn stale(mut self) -> Self {
        self.consistency_mode = ConsistencyMode::Stale;
        self
    }

    /// Turn the request into a blocking query on `index`
    pub fn blocking(mut self, index: u64, wait_time: Option<Duration>) -> Self {
        self.wait_index = Some(index);
        self.wait_time = wait_time;
        self
    }

    pub fn token(mut self, token: &str) -> Self {
        self.token = Some(token.to_string());
        self
    }

    pub fn near(mut self, near: &str) -> Self {
        self.near = Some(near.to_string());
        self
    }

    pub fn filter(mut self, filter: &str) -> Self {
        self.filter = Some(filter.to_string());
        self
    }

    pub fn node_meta(mut self, key: &str, value: &str) -> Self {
        self.node_meta.insert(key.to_string(), value.to_string());
        self
    }
}

/// Options applied to write requests
#[derive(Clone, Debug, Default)]
pub struct WriteOptions {
    pub datacenter: Option<String>,
    pub namespace: Option<String>,
    pub partition: Option<String>,
    pub token: Option<String>,
}

impl WriteOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn datacenter(mut self, datacenter: &str) -> Self {
        self.datacenter = Some(datacenter.to_string());
        self
    }

    pub fn namespace(mut self, namespace: &str) -> Self {
        self.namespace = Some(namespace.to_string());
        self
    }

    pub fn partition(mut self, partition: &str) -> Self {
        self.partition = Some(partition.to_string());
        self
    }

    pub fn token(mut self, token: &str) -> Self {
        self.token = Some(token.to_string());
        self
    }
}

/// Metadata returned with every read
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QueryMeta {
    /// `X-Consul-Index`, used as the next blocking query index
    pub last_index: u64,
    /// Time since the answering server last contacted the leader
    pub last_contact: Duration,
    pub known_leader: bool,
    pub address_translation_enabled: bool,
    pub request_time: Duration,
}

impl QueryMeta {
    pub(crate) fn from_headers(headers: &HeaderMap, request_time: Duration) -> Self {
        let text = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());

        Self {
            last_index: text(header::INDEX)
                .and_then(|v| v.parse().ok())
                .unwrap_or(0),
            last_contact: text(header::LAST_CONTACT)
                .and_then(|v| v.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or_default(),
            known_leader: text(header::KNOWN_LEADER)
                .map(|v| v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
            address_translation_enabled: text(header::TRANSLATE_ADDRESSES)
                .map(|v| v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
            request_time,
        }
    }
}

/// Typed result of a read
#[derive(Clone, Debug)]
pub struct QueryResult<T> {
    pub status: u16,
    pub meta: QueryMeta,
    pub response: T,
}

impl<T> QueryResult<T> {
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> QueryResult<U> {
        QueryResult {
            status: self.status,
            meta: self.meta,
            response: f(self.response),
        }
    }

    pub fn last_index(&self) -> u64 {
        self.meta.last_index
    }
}

/// Typed result of a write
#[derive(Clone, Debug)]
pub struct WriteResult<T> {
    pub status: u16,
    pub request_time: Duration,
    pub response: T,
}

impl<T> WriteResult<T> {
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> WriteResult<U> {
        WriteResult {
            status: self.status,
            request_time: self.request_time,
            response: f(self.response),
        }
    }
}

#[derive(Clone, Debug)]
pub(crate) enum Body {
    Empty,
    Json(Bytes),
    Raw(Bytes),
}

/// A single HTTP call against the agent, built by a façade method
pub struct ConsulRequest<'a> {
    client: &'a ConsulClient,
    method: Method,
    path: String,
    params: Vec<(String, String)>,
    datacenter: Option<String>,
    namespace: Option<String>,
    partition: Option<String>,
    token: Option<String>,
    wait_time: Option<Duration>,
    blocking: bool,
    body: Body,
}

impl<'a> ConsulRequest<'a> {
    pub(crate) fn new(client: &'a ConsulClient, method: Method, path: impl Into<String>) -> Self {
        Self {
            client,
            method,
            path: path.into(),
            params: Vec::new(),
            datacenter: None,
            namespace: None,
            partition: None,
            token: None,
            wait_time: None,
            blocking: false,
            body: Body::Empty,
        }
    }

    /// Add a query parameter
    pub fn param(mut self, key: &str, value: impl ToString) -> Self {
        self.params.push((key.to_string(), value.to_string()));
        self
    }

    /// Add a query parameter when `value` is set
    pub fn param_opt<V: ToString>(self, key: &str, value: Option<V>) -> Self {
        match value {
            Some(v) => self.param(key, v),
            None => self,
        }
    }

    /// Add a valueless flag parameter such as `?recurse`
    pub fn flag(self, key: &str) -> Self {
        self.param(key, "")
    }

    /// Add a flag parameter only when `enabled`
    pub fn flag_if(self, key: &str, enabled: bool) -> Self {
        if enabled { self.flag(key) } else { self }
    }

    pub fn query_options(mut self, q: Option<&QueryOptions>) -> Self {
        let Some(q) = q else {
            return self;
        };

        self.datacenter = q.datacenter.clone();
        self.namespace = q.namespace.clone();
        self.partition = q.partition.clone();
        self.token = q.token.clone();

        match q.consistency_mode {
            ConsistencyMode::Default => {}
            ConsistencyMode::Consistent => self = self.flag("consistent"),
            ConsistencyMode::Stale => self = self.flag("stale"),
        }
        if let Some(index) = q.wait_index {
            self.blocking = true;
            self = self.param("index", index);
        }
        self.wait_time = q.wait_time;
        self = self.param_opt("near", q.near.as_deref());
        self = self.param_opt("filter", q.filter.as_deref());
        for (k, v) in &q.node_meta {
            self = self.param("node-meta", format!("{k}:{v}"));
        }
        self
    }

    pub fn write_options(mut self, w: Option<&WriteOptions>) -> Self {
        if let Some(w) = w {
            self.datacenter = w.datacenter.clone();
            self.namespace = w.namespace.clone();
            self.partition = w.partition.clone();
            self.token = w.token.clone();
        }
        self
    }

    /// Attach a JSON body
    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self> {
        self.body = Body::Json(Bytes::from(serde_json::to_vec(body)?));
        Ok(self)
    }

    /// Attach a raw byte body
    pub fn raw(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Body::Raw(body.into());
        self
    }

    /// Send the request and hand back the response whatever its status
    pub(crate) async fn send(self) -> Result<(Response, Duration)> {
        let config = self.client.config();
        let mut params = self.params;

        if let Some(dc) = self.datacenter.or_else(|| config.datacenter.clone()) {
            params.push(("dc".to_string(), dc));
        }
        if let Some(ns) = self.namespace.or_else(|| config.namespace.clone()) {
            params.push(("ns".to_string(), ns));
        }
        if let Some(partition) = self.partition.or_else(|| config.partition.clone()) {
            params.push(("partition".to_string(), partition));
        }

        let wait_time = match self.wait_time {
            Some(wait) => Some(wait),
            None if self.blocking => config.wait_time,
            None => None,
        };
        if let Some(wait) = wait_time {
            params.push(("wait".to_string(), format_duration(wait)));
        }

        let token = self.token.or_else(|| config.token.clone());
        let started = Instant::now();
        let response = self
            .client
            .send(
                self.method,
                &self.path,
                &params,
                token.as_deref(),
                wait_time,
                self.body,
            )
            .await?;
        Ok((response, started.elapsed()))
    }

    /// Execute a read, failing on any non-2xx status
    pub async fn execute<T: DeserializeOwned>(self) -> Result<QueryResult<T>> {
        let (response, elapsed) = self.send().await?;
        let response = ensure_success(response).await?;
        let status = response.status().as_u16();
        let meta = QueryMeta::from_headers(response.headers(), elapsed);
        let body = response.bytes().await?;
        Ok(QueryResult {
            status,
            meta,
            response: decode(&body)?,
        })
    }

    /// Execute a read where 404 means "absent"
    pub async fn execute_optional<T: DeserializeOwned>(self) -> Result<QueryResult<Option<T>>> {
        let (response, elapsed) = self.send().await?;
        let meta = QueryMeta::from_headers(response.headers(), elapsed);
        if response.status() == StatusCode::NOT_FOUND {
            debug!("Resource not found, returning empty result");
            return Ok(QueryResult {
                status: StatusCode::NOT_FOUND.as_u16(),
                meta,
                response: None,
            });
        }
        let response = ensure_success(response).await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?;
        Ok(QueryResult {
            status,
            meta,
            response: Some(decode(&body)?),
        })
    }

    /// Execute a read and keep the body as bytes
    pub async fn execute_bytes(self) -> Result<QueryResult<Bytes>> {
        let (response, elapsed) = self.send().await?;
        let response = ensure_success(response).await?;
        let status = response.status().as_u16();
        let meta = QueryMeta::from_headers(response.headers(), elapsed);
        Ok(QueryResult {
            status,
            meta,
            response: response.bytes().await?,
        })
    }

    /// Execute a write, failing on any non-2xx status
    pub async fn execute_write<T: DeserializeOwned>(self) -> Result<WriteResult<T>> {
        let (response, elapsed) = self.send().await?;
        let response = ensure_success(response).await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?;
        Ok(WriteResult {
            status,
            request_time: elapsed,
            response: decode(&body)?,
        })
    }

    /// Execute a write whose body carries nothing of interest
    pub async fn execute_write_empty(self) -> Result<WriteResult<()>> {
        let (response, elapsed) = self.send().await?;
        let response = ensure_success(response).await?;
        Ok(WriteResult {
            status: response.status().as_u16(),
            request_time: elapsed,
            response: (),
        })
    }
}

/// Build [`ConsulError::UnexpectedResponse`] out of a response with an unexpected status
pub(crate) async fn unexpected_response(response: Response) -> ConsulError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    debug!("Request failed with status {}: {}", status, body);
    ConsulError::UnexpectedResponse {
        status: status.as_u16(),
        body,
    }
}

/// Pass 2xx responses through, turn anything else into an error
pub(crate) async fn ensure_success(response: Response) -> Result<Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    Err(unexpected_response(response).await)
}

/// Decode a JSON body; an empty body decodes as JSON `null`
pub(crate) fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(serde_json::from_slice(b"null")?);
    }
    Ok(serde_json::from_slice(body)?)
}
