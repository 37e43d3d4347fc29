// ConsulClient - connection holder and entry point to every endpoint façade

use std::sync::{Arc, RwLock};
use std::time::Duration;

use reqwest::{Client, Method, Response};
use tracing::{debug, warn};
use url::Url;

use crate::api::{
    Acl, Agent, AuthMethods, BindingRules, Catalog, ConfigEntries, Connect, Coordinate,
    DiscoveryChain, Event, Health, Kv, Lock, LockOptions, Namespaces, Operator, Policies,
    PreparedQuery, Raw, Roles, Session, Snapshot, Status, Tokens,
};
use crate::config::ConsulClientConfig;
use crate::constants::header;
use crate::error::{ConsulError, Result};
use crate::request::{Body, ConsulRequest};

struct ClientInner {
    http: Client,
    config: ConsulClientConfig,
    current_server_index: RwLock<usize>,
}

/// HTTP client for a Consul agent with failover across configured addresses.
///
/// Cloning is cheap; clones share the underlying connection pool.
#[derive(Clone)]
pub struct ConsulClient {
    inner: Arc<ClientInner>,
}

impl ConsulClient {
    /// Create a new client with the given configuration
    pub fn new(config: ConsulClientConfig) -> Result<Self> {
        config.validate()?;

        let mut builder = Client::builder()
            .connect_timeout(Duration::from_millis(config.connect_timeout_ms))
            .danger_accept_invalid_certs(config.tls_skip_verify);
        if config.read_timeout_ms > 0 {
            builder = builder.timeout(Duration::from_millis(config.read_timeout_ms));
        }
        let http = builder.build()?;

        Ok(Self {
            inner: Arc::new(ClientInner {
                http,
                config,
                current_server_index: RwLock::new(0),
            }),
        })
    }

    /// Create a client for a single agent address
    pub fn from_server_addr(addr: &str) -> Result<Self> {
        Self::new(ConsulClientConfig::new(addr))
    }

    /// Create a client configured from the `CONSUL_*` environment variables
    pub fn from_env() -> Result<Self> {
        Self::new(ConsulClientConfig::from_env()?)
    }

    pub fn config(&self) -> &ConsulClientConfig {
        &self.inner.config
    }

    // ============================================================================
    // Endpoint façades
    // ============================================================================

    pub fn acl(&self) -> Acl<'_> {
        Acl::new(self)
    }

    pub fn tokens(&self) -> Tokens<'_> {
        Tokens::new(self)
    }

    pub fn policies(&self) -> Policies<'_> {
        Policies::new(self)
    }

    pub fn roles(&self) -> Roles<'_> {
        Roles::new(self)
    }

    pub fn auth_methods(&self) -> AuthMethods<'_> {
        AuthMethods::new(self)
    }

    pub fn binding_rules(&self) -> BindingRules<'_> {
        BindingRules::new(self)
    }

    pub fn agent(&self) -> Agent<'_> {
        Agent::new(self)
    }

    pub fn catalog(&self) -> Catalog<'_> {
        Catalog::new(self)
    }

    pub fn health(&self) -> Health<'_> {
        Health::new(self)
    }

    pub fn kv(&self) -> Kv<'_> {
        Kv::new(self)
    }

    pub fn session(&self) -> Session<'_> {
        Session::new(self)
    }

    pub fn snapshot(&self) -> Snapshot<'_> {
        Snapshot::new(self)
    }

    pub fn operator(&self) -> Operator<'_> {
        Operator::new(self)
    }

    pub fn config_entries(&self) -> ConfigEntries<'_> {
        ConfigEntries::new(self)
    }

    pub fn connect(&self) -> Connect<'_> {
        Connect::new(self)
    }

    pub fn discovery_chain(&self) -> DiscoveryChain<'_> {
        DiscoveryChain::new(self)
    }

    pub fn coordinate(&self) -> Coordinate<'_> {
        Coordinate::new(self)
    }

    pub fn event(&self) -> Event<'_> {
        Event::new(self)
    }

    pub fn prepared_query(&self) -> PreparedQuery<'_> {
        PreparedQuery::new(self)
    }

    pub fn status(&self) -> Status<'_> {
        Status::new(self)
    }

    pub fn raw(&self) -> Raw<'_> {
        Raw::new(self)
    }

    pub fn namespaces(&self) -> Namespaces<'_> {
        Namespaces::new(self)
    }

    /// Create a lock on `opts.key`; nothing is sent until [`Lock::acquire`]
    pub fn lock(&self, opts: LockOptions) -> Result<Lock> {
        Lock::new(self.clone(), opts)
    }

    /// Create a lock on `key` with default options
    pub fn lock_key(&self, key: &str) -> Result<Lock> {
        self.lock(LockOptions::new(key))
    }

    // ============================================================================
    // Request verbs
    // ============================================================================

    pub fn get(&self, path: impl Into<String>) -> ConsulRequest<'_> {
        ConsulRequest::new(self, Method::GET, path)
    }

    pub fn put(&self, path: impl Into<String>) -> ConsulRequest<'_> {
        ConsulRequest::new(self, Method::PUT, path)
    }

    pub fn post(&self, path: impl Into<String>) -> ConsulRequest<'_> {
        ConsulRequest::new(self, Method::POST, path)
    }

    pub fn delete(&self, path: impl Into<String>) -> ConsulRequest<'_> {
        ConsulRequest::new(self, Method::DELETE, path)
    }

    // ============================================================================
    // Transport
    // ============================================================================

    /// Get the current server URL
    fn current_server(&self) -> String {
        let index = *self
            .inner
            .current_server_index
            .read()
            .unwrap_or_else(|e| e.into_inner());
        self.inner.config.server_addrs[index].clone()
    }

    /// Switch to the next server (for failover)
    fn switch_to_next_server(&self) {
        let mut index = self
            .inner
            .current_server_index
            .write()
            .unwrap_or_else(|e| e.into_inner());
        *index = (*index + 1) % self.inner.config.server_addrs.len();
        debug!("Switched to server index: {}", *index);
    }

    /// Build the full URL; each path segment is percent-encoded
    pub(crate) fn build_url(
        &self,
        base: &str,
        path: &str,
        params: &[(String, String)],
    ) -> Result<Url> {
        let mut url = Url::parse(base)?;
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| ConsulError::InvalidConfig(format!("invalid base url {base}")))?;
            segments.pop_if_empty();
            segments.extend(path.trim_start_matches('/').split('/'));
        }
        if !params.is_empty() {
            url.query_pairs_mut().extend_pairs(params.iter());
        }
        Ok(url)
    }

    /// Send one request, moving on to the next server on transport errors
    pub(crate) async fn send(
        &self,
        method: Method,
        path: &str,
        params: &[(String, String)],
        token: Option<&str>,
        wait_time: Option<Duration>,
        body: Body,
    ) -> Result<Response> {
        let max_retries = self.inner.config.server_addrs.len();
        let mut last_error = None;

        for _ in 0..max_retries {
            let url = self.build_url(&self.current_server(), path, params)?;
            debug!("{} {}", method, url);

            let mut request = self.inner.http.request(method.clone(), url);
            if let Some(token) = token.filter(|t| !t.is_empty()) {
                request = request.header(header::TOKEN, token);
            }
            if let Some(auth) = &self.inner.config.http_auth {
                request = request.basic_auth(&auth.username, Some(&auth.password));
            }
            if let Some(timeout) = self.blocking_timeout(wait_time) {
                request = request.timeout(timeout);
            }
            request = match &body {
                Body::Empty => request,
                Body::Json(bytes) => request
                    .header(reqwest::header::CONTENT_TYPE, "application/json")
                    .body(bytes.clone()),
                Body::Raw(bytes) => request.body(bytes.clone()),
            };

            match request.send().await {
                Ok(response) => return Ok(response),
                Err(e) => {
                    warn!("Request failed: {}, switching to next server", e);
                    self.switch_to_next_server();
                    last_error = Some(e);
                }
            }
        }

        Err(last_error
            .map(ConsulError::from)
            .unwrap_or(ConsulError::AllServersFailed))
    }

    /// Blocking queries may legitimately outlive the configured read timeout
    fn blocking_timeout(&self, wait_time: Option<Duration>) -> Option<Duration> {
        let read_timeout = self.inner.config.read_timeout_ms;
        match wait_time {
            Some(wait) if read_timeout > 0 => {
                Some(wait + wait / 16 + Duration::from_millis(read_timeout))
            }
            _ => None,
        }
    }
}

impl std::fmt::Debug for ConsulClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsulClient")
            .field("server_addrs", &self.inner.config.server_addrs)
            .field("datacenter", &self.inner.config.datacenter)
            .finish()
    }
}
