//! Catalog and health endpoint tests against a mock agent

mod common;

use batata_consul_client::ConsulError;
use batata_consul_client::model::{
    AgentService, CatalogDeregistration, CatalogRegistration, HealthStatus,
};
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

use common::mock_agent;

fn service_entry(id: &str, check_status: &str) -> serde_json::Value {
    json!({
        "Node": {"ID": "n1", "Node": "node-a", "Address": "10.0.0.1", "Datacenter": "dc1",
            "TaggedAddresses": null, "Meta": null},
        "Service": {"ID": id, "Service": "web", "Tags": ["v1"], "Port": 8080,
            "Address": "", "Meta": null},
        "Checks": [
            {"Node": "node-a", "CheckID": "serfHealth", "Name": "Serf Health Status",
                "Status": "passing", "ServiceTags": null},
            {"Node": "node-a", "CheckID": format!("service:{id}"), "Name": "web",
                "Status": check_status, "ServiceID": id, "ServiceName": "web"}
        ]
    })
}

#[tokio::test]
async fn test_register_and_deregister() {
    let (server, client) = mock_agent().await;
    Mock::given(method("PUT"))
        .and(path("/v1/catalog/register"))
        .and(body_partial_json(json!({
            "Node": "ext-db", "Address": "192.168.1.10",
            "Service": {"ID": "db-1", "Service": "db", "Port": 5432}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_string("true"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/v1/catalog/deregister"))
        .and(body_partial_json(json!({"Node": "ext-db", "ServiceID": "db-1"})))
        .respond_with(ResponseTemplate::new(200).set_body_string("true"))
        .expect(1)
        .mount(&server)
        .await;

    let registration = CatalogRegistration {
        node: "ext-db".to_string(),
        address: "192.168.1.10".to_string(),
        service: Some(AgentService {
            id: "db-1".to_string(),
            service: "db".to_string(),
            port: 5432,
            ..Default::default()
        }),
        ..Default::default()
    };
    assert!(client.catalog().register(&registration, None).await.unwrap().response);

    let deregistration = CatalogDeregistration {
        node: "ext-db".to_string(),
        service_id: Some("db-1".to_string()),
        ..Default::default()
    };
    assert!(client.catalog().deregister(&deregistration, None).await.unwrap().response);
}

#[tokio::test]
async fn test_catalog_service_with_tags() {
    let (server, client) = mock_agent().await;
    Mock::given(method("GET"))
        .and(path("/v1/catalog/service/web"))
        .and(query_param("tag", "v1"))
        .and(query_param("tag", "blue"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "ID": "n1", "Node": "node-a", "Address": "10.0.0.1", "Datacenter": "dc1",
            "TaggedAddresses": null, "NodeMeta": null,
            "ServiceID": "web-1", "ServiceName": "web", "ServiceAddress": "",
            "ServiceTags": ["v1", "blue"], "ServiceMeta": {}, "ServicePort": 8080,
            "ServiceEnableTagOverride": false, "CreateIndex": 5, "ModifyIndex": 5
        }])))
        .mount(&server)
        .await;

    let services = client
        .catalog()
        .service("web", &["v1", "blue"], None)
        .await
        .unwrap()
        .response;
    assert_eq!(services.len(), 1);
    assert_eq!(services[0].service_port, 8080);
    assert_eq!(services[0].effective_address(), "10.0.0.1");
}

#[tokio::test]
async fn test_catalog_node_missing() {
    let (server, client) = mock_agent().await;
    Mock::given(method("GET"))
        .and(path("/v1/catalog/node/ghost"))
        .respond_with(ResponseTemplate::new(200).set_body_string("null"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/catalog/node/node-a"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Node": {"ID": "n1", "Node": "node-a", "Address": "10.0.0.1"},
            "Services": {"web-1": {"ID": "web-1", "Service": "web", "Port": 8080}}
        })))
        .mount(&server)
        .await;

    assert!(client.catalog().node("ghost", None).await.unwrap().response.is_none());
    let node = client.catalog().node("node-a", None).await.unwrap().response.unwrap();
    assert_eq!(node.node.unwrap().address, "10.0.0.1");
    assert_eq!(node.services["web-1"].port, 8080);
}

#[tokio::test]
async fn test_health_service_passing_only() {
    let (server, client) = mock_agent().await;
    Mock::given(method("GET"))
        .and(path("/v1/health/service/web"))
        .and(query_param("passing", ""))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("X-Consul-Index", "31")
                .set_body_json(json!([service_entry("web-1", "passing")])),
        )
        .mount(&server)
        .await;

    let result = client.health().service("web", &[], true, None).await.unwrap();
    assert_eq!(result.last_index(), 31);
    let entry = &result.response[0];
    assert_eq!(entry.service.id, "web-1");
    assert_eq!(entry.aggregated_status(), HealthStatus::Passing);
}

#[tokio::test]
async fn test_health_service_aggregates_worst_check() {
    let (server, client) = mock_agent().await;
    Mock::given(method("GET"))
        .and(path("/v1/health/service/web"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([service_entry("web-2", "warning")])),
        )
        .mount(&server)
        .await;

    let entries = client.health().service("web", &[], false, None).await.unwrap().response;
    assert_eq!(entries[0].aggregated_status(), HealthStatus::Warning);
}

#[tokio::test]
async fn test_health_state() {
    let (server, client) = mock_agent().await;
    Mock::given(method("GET"))
        .and(path("/v1/health/state/critical"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"Node": "node-b", "CheckID": "serfHealth", "Status": "critical",
                "Output": "Agent not live or unreachable"}
        ])))
        .mount(&server)
        .await;

    let checks = client
        .health()
        .state(HealthStatus::Critical, None)
        .await
        .unwrap()
        .response;
    assert_eq!(checks[0].node, "node-b");
    assert_eq!(checks[0].status, HealthStatus::Critical);

    let err = client.health().state(HealthStatus::Maintenance, None).await.unwrap_err();
    assert!(matches!(err, ConsulError::InvalidArgument(_)));
}

#[tokio::test]
async fn test_health_checks_empty_list() {
    let (server, client) = mock_agent().await;
    Mock::given(method("GET"))
        .and(path("/v1/health/checks/nothing"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let checks = client.health().checks("nothing", None).await.unwrap().response;
    assert!(checks.is_empty());
}
