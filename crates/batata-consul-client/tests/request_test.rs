//! Request pipeline tests: options, headers, metadata, failover and errors

mod common;

use std::time::Duration;

use batata_consul_client::{
    ConsulClient, ConsulClientConfig, ConsulError, QueryOptions, WriteOptions,
};
use serde_json::json;
use wiremock::matchers::{header, header_exists, method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{client_with, init_tracing, mock_agent};

#[tokio::test]
async fn test_query_meta_from_headers() {
    let (server, client) = mock_agent().await;
    Mock::given(method("GET"))
        .and(path("/v1/status/peers"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("X-Consul-Index", "42")
                .insert_header("X-Consul-LastContact", "15")
                .insert_header("X-Consul-KnownLeader", "true")
                .set_body_json(json!(["10.0.0.1:8300", "10.0.0.2:8300"])),
        )
        .mount(&server)
        .await;

    let result = client.status().peers(None).await.unwrap();
    assert_eq!(result.status, 200);
    assert_eq!(result.last_index(), 42);
    assert_eq!(result.meta.last_contact, Duration::from_millis(15));
    assert!(result.meta.known_leader);
    assert_eq!(result.response.len(), 2);
}

#[tokio::test]
async fn test_config_defaults_applied() {
    init_tracing();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/catalog/nodes"))
        .and(header("X-Consul-Token", "root-token"))
        .and(query_param("dc", "dc1"))
        .and(query_param("ns", "team-a"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_with(&server, |c| {
        c.with_datacenter("dc1")
            .with_token("root-token")
            .with_namespace("team-a")
    });
    let nodes = client.catalog().nodes(None).await.unwrap();
    assert!(nodes.response.is_empty());
}

#[tokio::test]
async fn test_query_options_override_config() {
    init_tracing();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/catalog/nodes"))
        .and(header("X-Consul-Token", "override"))
        .and(query_param("dc", "dc2"))
        .and(query_param("stale", ""))
        .and(query_param("near", "_agent"))
        .and(query_param("filter", "Meta.env == \"prod\""))
        .and(query_param("node-meta", "rack:r1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_with(&server, |c| c.with_datacenter("dc1").with_token("root-token"));
    let q = QueryOptions::new()
        .datacenter("dc2")
        .token("override")
        .stale()
        .near("_agent")
        .filter("Meta.env == \"prod\"")
        .node_meta("rack", "r1");
    client.catalog().nodes(Some(&q)).await.unwrap();
}

#[tokio::test]
async fn test_write_options_applied() {
    let (server, client) = mock_agent().await;
    Mock::given(method("DELETE"))
        .and(path("/v1/acl/policy/p1"))
        .and(header("X-Consul-Token", "writer"))
        .and(query_param("dc", "dc3"))
        .respond_with(ResponseTemplate::new(200).set_body_string("true"))
        .expect(1)
        .mount(&server)
        .await;

    let w = WriteOptions::new().datacenter("dc3").token("writer");
    let deleted = client.policies().delete("p1", Some(&w)).await.unwrap();
    assert!(deleted.response);
}

#[tokio::test]
async fn test_wait_only_sent_for_blocking_queries() {
    init_tracing();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/catalog/services"))
        .and(query_param("index", "12"))
        .and(query_param("wait", "2s"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"consul": []})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/catalog/datacenters"))
        .and(query_param_is_missing("wait"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(["dc1"])))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_with(&server, |c| c.with_wait_time(Duration::from_secs(2)));
    let q = QueryOptions::new().blocking(12, None);
    let services = client.catalog().services(Some(&q)).await.unwrap();
    assert!(services.response.contains_key("consul"));
    client.catalog().datacenters().await.unwrap();
}

#[tokio::test]
async fn test_empty_token_not_sent() {
    let (server, client) = mock_agent().await;
    Mock::given(method("GET"))
        .and(path("/v1/status/leader"))
        .and(header_exists("X-Consul-Token"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/status/leader"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!("10.0.0.1:8300")))
        .mount(&server)
        .await;

    let q = QueryOptions::new().token("");
    let leader = client.status().leader(Some(&q)).await.unwrap();
    assert_eq!(leader.response, "10.0.0.1:8300");
}

#[tokio::test]
async fn test_basic_auth() {
    init_tracing();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/status/leader"))
        // admin:secret
        .and(header("Authorization", "Basic YWRtaW46c2VjcmV0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!("")))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_with(&server, |c| c.with_http_auth("admin", "secret"));
    let leader = client.status().leader(None).await.unwrap();
    assert!(leader.response.is_empty());
}

#[tokio::test]
async fn test_failover_to_next_server() {
    init_tracing();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/status/leader"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!("10.0.0.1:8300")))
        .expect(2)
        .mount(&server)
        .await;

    let config = ConsulClientConfig::with_servers(vec![
        "http://127.0.0.1:1".to_string(),
        server.uri(),
    ])
    .with_timeouts(500, 0);
    let client = ConsulClient::new(config).unwrap();

    let leader = client.status().leader(None).await.unwrap();
    assert_eq!(leader.response, "10.0.0.1:8300");
    // The healthy server stays selected
    client.status().leader(None).await.unwrap();
}

#[tokio::test]
async fn test_all_servers_down() {
    init_tracing();
    let config = ConsulClientConfig::with_servers(vec![
        "http://127.0.0.1:1".to_string(),
        "http://127.0.0.1:2".to_string(),
    ])
    .with_timeouts(500, 0);
    let client = ConsulClient::new(config).unwrap();

    let err = client.status().leader(None).await.unwrap_err();
    assert!(matches!(err, ConsulError::Http(_)));
}

#[tokio::test]
async fn test_unexpected_status_carries_body() {
    let (server, client) = mock_agent().await;
    Mock::given(method("GET"))
        .and(path("/v1/catalog/nodes"))
        .respond_with(ResponseTemplate::new(403).set_body_string("Permission denied"))
        .mount(&server)
        .await;

    let err = client.catalog().nodes(None).await.unwrap_err();
    assert_eq!(err.status(), Some(403));
    match err {
        ConsulError::UnexpectedResponse { status, body } => {
            assert_eq!(status, 403);
            assert_eq!(body, "Permission denied");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_invalid_json_is_serialization_error() {
    let (server, client) = mock_agent().await;
    Mock::given(method("GET"))
        .and(path("/v1/status/peers"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let err = client.status().peers(None).await.unwrap_err();
    assert!(matches!(err, ConsulError::Serialization(_)));
}

#[tokio::test]
async fn test_raw_query_and_write() {
    let (server, client) = mock_agent().await;
    Mock::given(method("GET"))
        .and(path("/v1/agent/custom"))
        .and(query_param("dc", "dc1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"Answer": 42})))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/v1/agent/custom"))
        .and(header("Content-Type", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(true)))
        .expect(1)
        .mount(&server)
        .await;

    let q = QueryOptions::new().datacenter("dc1");
    let value: serde_json::Value = client
        .raw()
        .query("/v1/agent/custom", Some(&q))
        .await
        .unwrap()
        .response;
    assert_eq!(value["Answer"], 42);

    let written: bool = client
        .raw()
        .write("/v1/agent/custom", &json!({"Answer": 43}), None)
        .await
        .unwrap()
        .response;
    assert!(written);
}

#[tokio::test]
async fn test_raw_query_string_becomes_params() {
    let (server, client) = mock_agent().await;
    Mock::given(method("GET"))
        .and(path("/v1/agent/members"))
        .and(query_param("wan", ""))
        .and(query_param("segment", "a b"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let members: Vec<serde_json::Value> = client
        .raw()
        .query("/v1/agent/members?wan&segment=a+b", None)
        .await
        .unwrap()
        .response;
    assert!(members.is_empty());
}
