//! Shared helpers for the mock server tests

use batata_consul_client::{ConsulClient, ConsulClientConfig};
use tracing_subscriber::EnvFilter;
use wiremock::MockServer;

/// Install a fmt subscriber once; `RUST_LOG` controls verbosity
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Start a mock agent and a client pointed at it
#[allow(dead_code)]
pub async fn mock_agent() -> (MockServer, ConsulClient) {
    init_tracing();
    let server = MockServer::start().await;
    let client = ConsulClient::new(ConsulClientConfig::new(&server.uri()))
        .expect("Failed to build client");
    (server, client)
}

/// Client with extra configuration applied on top of the mock address
#[allow(dead_code)]
pub fn client_with(
    server: &MockServer,
    f: impl FnOnce(ConsulClientConfig) -> ConsulClientConfig,
) -> ConsulClient {
    ConsulClient::new(f(ConsulClientConfig::new(&server.uri()))).expect("Failed to build client")
}

/// Generate a unique name to avoid clashes on a shared live agent
#[allow(dead_code)]
pub fn unique_name(prefix: &str) -> String {
    format!("{}-{}", prefix, uuid::Uuid::new_v4().simple())
}
