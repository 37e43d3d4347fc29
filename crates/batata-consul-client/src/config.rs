// Configuration for ConsulClient

use std::time::Duration;

use crate::constants::env;
use crate::error::{ConsulError, Result};

/// HTTP basic authentication credentials
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpBasicAuth {
    pub username: String,
    pub password: String,
}

/// Configuration for the Consul HTTP client
#[derive(Clone, Debug)]
pub struct ConsulClientConfig {
    /// Agent addresses tried in order on transport failure (e.g. ["http://127.0.0.1:8500"])
    pub server_addrs: Vec<String>,
    /// Default datacenter, agent datacenter when unset
    pub datacenter: Option<String>,
    /// Default ACL token sent as `X-Consul-Token`
    pub token: Option<String>,
    /// Default namespace (Enterprise)
    pub namespace: Option<String>,
    /// Default admin partition (Enterprise)
    pub partition: Option<String>,
    /// Default wait time for blocking queries that only set an index
    pub wait_time: Option<Duration>,
    /// Basic auth credentials for agents behind a proxy
    pub http_auth: Option<HttpBasicAuth>,
    /// Connection timeout in milliseconds (default: 5000)
    pub connect_timeout_ms: u64,
    /// Overall request timeout in milliseconds, 0 disables it (default: 0)
    pub read_timeout_ms: u64,
    /// Accept invalid TLS certificates
    pub tls_skip_verify: bool,
}

impl Default for ConsulClientConfig {
    fn default() -> Self {
        Self {
            server_addrs: vec!["http://127.0.0.1:8500".to_string()],
            datacenter: None,
            token: None,
            namespace: None,
            partition: None,
            wait_time: None,
            http_auth: None,
            connect_timeout_ms: 5000,
            read_timeout_ms: 0,
            tls_skip_verify: false,
        }
    }
}

impl ConsulClientConfig {
    /// Create a new config with a single agent address
    pub fn new(server_addr: &str) -> Self {
        Self {
            server_addrs: vec![server_addr.to_string()],
            ..Default::default()
        }
    }

    /// Create a config with multiple agent addresses
    pub fn with_servers(server_addrs: Vec<String>) -> Self {
        Self {
            server_addrs,
            ..Default::default()
        }
    }

    /// Build a config from the standard `CONSUL_*` environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_env_with(|key| std::env::var(key).ok())
    }

    /// Build a config from `CONSUL_*` variables resolved through `lookup`
    pub fn from_env_with<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let use_tls = match lookup(env::HTTP_SSL) {
            Some(v) => parse_env_bool(env::HTTP_SSL, &v)?,
            None => false,
        };

        if let Some(addr) = lookup(env::HTTP_ADDR) {
            config.server_addrs = addr
                .split(',')
                .map(str::trim)
                .filter(|a| !a.is_empty())
                .map(|a| normalize_address(a, use_tls))
                .collect::<Result<Vec<_>>>()?;
        } else if use_tls {
            config.server_addrs = vec!["https://127.0.0.1:8500".to_string()];
        }

        if let Some(verify) = lookup(env::HTTP_SSL_VERIFY) {
            config.tls_skip_verify = !parse_env_bool(env::HTTP_SSL_VERIFY, &verify)?;
        }

        config.token = lookup(env::HTTP_TOKEN);

        if let Some(auth) = lookup(env::HTTP_AUTH) {
            let (username, password) = match auth.split_once(':') {
                Some((user, pass)) => (user.to_string(), pass.to_string()),
                None => (auth, String::new()),
            };
            config.http_auth = Some(HttpBasicAuth { username, password });
        }

        config.namespace = lookup(env::NAMESPACE);
        config.partition = lookup(env::PARTITION);

        Ok(config)
    }

    /// Set the default datacenter
    pub fn with_datacenter(mut self, datacenter: &str) -> Self {
        self.datacenter = Some(datacenter.to_string());
        self
    }

    /// Set the default ACL token
    pub fn with_token(mut self, token: &str) -> Self {
        self.token = Some(token.to_string());
        self
    }

    /// Set the default namespace
    pub fn with_namespace(mut self, namespace: &str) -> Self {
        self.namespace = Some(namespace.to_string());
        self
    }

    /// Set the default admin partition
    pub fn with_partition(mut self, partition: &str) -> Self {
        self.partition = Some(partition.to_string());
        self
    }

    /// Set the default blocking query wait time
    pub fn with_wait_time(mut self, wait_time: Duration) -> Self {
        self.wait_time = Some(wait_time);
        self
    }

    /// Set basic auth credentials
    pub fn with_http_auth(mut self, username: &str, password: &str) -> Self {
        self.http_auth = Some(HttpBasicAuth {
            username: username.to_string(),
            password: password.to_string(),
        });
        self
    }

    /// Set timeouts
    pub fn with_timeouts(mut self, connect_ms: u64, read_ms: u64) -> Self {
        self.connect_timeout_ms = connect_ms;
        self.read_timeout_ms = read_ms;
        self
    }

    /// Skip TLS certificate verification
    pub fn with_tls_skip_verify(mut self, skip: bool) -> Self {
        self.tls_skip_verify = skip;
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.server_addrs.is_empty() {
            return Err(ConsulError::InvalidConfig(
                "at least one server address is required".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_env_bool(name: &str, value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "t" | "true" | "yes" => Ok(true),
        "0" | "f" | "false" | "no" => Ok(false),
        other => Err(ConsulError::InvalidConfig(format!(
            "could not parse {name}={other} as a boolean"
        ))),
    }
}

/// Prefix a bare `host:port` with a scheme
fn normalize_address(addr: &str, use_tls: bool) -> Result<String> {
    if addr.starts_with("unix://") {
        return Err(ConsulError::InvalidConfig(format!(
            "unix socket addresses are not supported: {addr}"
        )));
    }
    if let Some(rest) = addr.strip_prefix("http://") {
        let scheme = if use_tls { "https" } else { "http" };
        return Ok(format!("{scheme}://{}", rest.trim_end_matches('/')));
    }
    if addr.starts_with("https://") {
        return Ok(addr.trim_end_matches('/').to_string());
    }
    let scheme = if use_tls { "https" } else { "http" };
    Ok(format!("{scheme}://{}", addr.trim_end_matches('/')))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_config_default() {
        let config = ConsulClientConfig::default();
        assert_eq!(config.server_addrs, vec!["http://127.0.0.1:8500"]);
        assert_eq!(config.connect_timeout_ms, 5000);
        assert_eq!(config.read_timeout_ms, 0);
        assert!(config.token.is_none());
        assert!(!config.tls_skip_verify);
    }

    #[test]
    fn test_config_builder() {
        let config = ConsulClientConfig::new("http://consul:8500")
            .with_datacenter("dc2")
            .with_token("secret")
            .with_namespace("team-a")
            .with_wait_time(Duration::from_secs(30))
            .with_http_auth("admin", "pw")
            .with_timeouts(1000, 60000);

        assert_eq!(config.server_addrs[0], "http://consul:8500");
        assert_eq!(config.datacenter.as_deref(), Some("dc2"));
        assert_eq!(config.token.as_deref(), Some("secret"));
        assert_eq!(config.namespace.as_deref(), Some("team-a"));
        assert_eq!(config.wait_time, Some(Duration::from_secs(30)));
        assert_eq!(
            config.http_auth,
            Some(HttpBasicAuth {
                username: "admin".to_string(),
                password: "pw".to_string()
            })
        );
        assert_eq!(config.read_timeout_ms, 60000);
    }

    #[test]
    fn test_from_env_bare_address() {
        let config = ConsulClientConfig::from_env_with(env_of(&[
            ("CONSUL_HTTP_ADDR", "10.0.0.5:8500"),
            ("CONSUL_HTTP_TOKEN", "abc"),
        ]))
        .unwrap();
        assert_eq!(config.server_addrs, vec!["http://10.0.0.5:8500"]);
        assert_eq!(config.token.as_deref(), Some("abc"));
    }

    #[test]
    fn test_from_env_ssl_upgrades_scheme() {
        let config = ConsulClientConfig::from_env_with(env_of(&[
            ("CONSUL_HTTP_ADDR", "http://consul.local:8501"),
            ("CONSUL_HTTP_SSL", "true"),
            ("CONSUL_HTTP_SSL_VERIFY", "false"),
        ]))
        .unwrap();
        assert_eq!(config.server_addrs, vec!["https://consul.local:8501"]);
        assert!(config.tls_skip_verify);
    }

    #[test]
    fn test_from_env_auth_without_password() {
        let config =
            ConsulClientConfig::from_env_with(env_of(&[("CONSUL_HTTP_AUTH", "operator")]))
                .unwrap();
        let auth = config.http_auth.unwrap();
        assert_eq!(auth.username, "operator");
        assert!(auth.password.is_empty());
    }

    #[test]
    fn test_from_env_multiple_addresses() {
        let config = ConsulClientConfig::from_env_with(env_of(&[(
            "CONSUL_HTTP_ADDR",
            "a:8500, https://b:8501",
        )]))
        .unwrap();
        assert_eq!(config.server_addrs, vec!["http://a:8500", "https://b:8501"]);
    }

    #[test]
    fn test_from_env_rejects_bad_values() {
        assert!(
            ConsulClientConfig::from_env_with(env_of(&[("CONSUL_HTTP_SSL", "maybe")])).is_err()
        );
        assert!(
            ConsulClientConfig::from_env_with(env_of(&[(
                "CONSUL_HTTP_ADDR",
                "unix:///var/run/consul.sock"
            )]))
            .is_err()
        );
    }

    #[test]
    fn test_validate_requires_address() {
        let config = ConsulClientConfig::with_servers(vec![]);
        assert!(config.validate().is_err());
    }
}
