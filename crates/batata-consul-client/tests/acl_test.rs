//! ACL endpoint tests against a mock agent

mod common;

use std::time::Duration;

use batata_consul_client::ConsulError;
use batata_consul_client::model::{
    AclBindingRule, AclLink, AclLoginParams, AclPolicy, AclRole, AclToken, AclTokenFilter,
    BindingRuleBindType,
};
use serde_json::json;
use wiremock::matchers::{body_json, body_partial_json, method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

use common::mock_agent;

const KV_READ: &str = r#"key_prefix "" { policy = "read" }"#;

fn token_json(accessor: &str, description: &str) -> serde_json::Value {
    json!({
        "AccessorID": accessor,
        "SecretID": "45a3bd52-07c7-47a4-52fd-0745e0cfe967",
        "Description": description,
        "Policies": [{"ID": "p1", "Name": "deploy"}],
        "Roles": null,
        "Local": false,
        "CreateTime": "2024-01-02T03:04:05Z",
        "CreateIndex": 12,
        "ModifyIndex": 12
    })
}

#[tokio::test]
async fn test_token_create() {
    let (server, client) = mock_agent().await;
    Mock::given(method("PUT"))
        .and(path("/v1/acl/token"))
        .and(body_partial_json(json!({
            "Description": "ci", "Policies": [{"Name": "deploy"}], "ExpirationTTL": "1h0m0s"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_json("a1", "ci")))
        .expect(1)
        .mount(&server)
        .await;

    let token = AclToken::new("ci")
        .with_policy(AclLink::by_name("deploy"))
        .with_expiration_ttl(Duration::from_secs(3600));
    let created = client.tokens().create(&token, None).await.unwrap().response;
    assert_eq!(created.accessor_id, "a1");
    assert!(created.roles.is_empty());
}

#[tokio::test]
async fn test_token_update_requires_accessor() {
    let (_server, client) = mock_agent().await;
    let err = client
        .tokens()
        .update(&AclToken::new("no id"), None)
        .await
        .unwrap_err();
    assert!(matches!(err, ConsulError::InvalidArgument(_)));
}

#[tokio::test]
async fn test_token_clone() {
    let (server, client) = mock_agent().await;
    Mock::given(method("PUT"))
        .and(path("/v1/acl/token/a1/clone"))
        .and(body_json(json!({"Description": "copy"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_json("a2", "copy")))
        .expect(1)
        .mount(&server)
        .await;

    let cloned = client.tokens().clone("a1", "copy", None).await.unwrap().response;
    assert_eq!(cloned.accessor_id, "a2");
}

#[tokio::test]
async fn test_token_read_missing() {
    let (server, client) = mock_agent().await;
    Mock::given(method("GET"))
        .and(path("/v1/acl/token/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string("ACL not found"))
        .mount(&server)
        .await;

    let token = client.tokens().read("missing", None).await.unwrap();
    assert!(token.response.is_none());
}

#[tokio::test]
async fn test_token_list_filters() {
    let (server, client) = mock_agent().await;
    Mock::given(method("GET"))
        .and(path("/v1/acl/tokens"))
        .and(query_param("policy", "p1"))
        .and(query_param("servicename", "web"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([token_json("a1", "web token")])),
        )
        .mount(&server)
        .await;

    let filter = AclTokenFilter {
        policy: Some("p1".to_string()),
        service_name: Some("web".to_string()),
        ..Default::default()
    };
    let tokens = client.tokens().list(Some(&filter), None).await.unwrap().response;
    assert_eq!(tokens.len(), 1);
    assert_eq!(tokens[0].policies[0].id, "p1");
}

#[tokio::test]
async fn test_policy_crud() {
    let (server, client) = mock_agent().await;
    Mock::given(method("PUT"))
        .and(path("/v1/acl/policy"))
        .and(body_partial_json(json!({"Name": "kv-read", "Rules": KV_READ})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ID": "p9", "Name": "kv-read", "Rules": KV_READ,
            "CreateIndex": 20, "ModifyIndex": 20
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/acl/policy/name/kv-read"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ID": "p9", "Name": "kv-read", "Datacenters": null
        })))
        .mount(&server)
        .await;

    let policy = AclPolicy::new("kv-read", KV_READ);
    let created = client.policies().create(&policy, None).await.unwrap().response;
    assert_eq!(created.id, "p9");

    let by_name = client.policies().read_by_name("kv-read", None).await.unwrap();
    let by_name = by_name.response.unwrap();
    assert_eq!(by_name.id, "p9");
    assert!(by_name.datacenters.is_empty());

    let err = client.policies().update(&policy, None).await.unwrap_err();
    assert!(matches!(err, ConsulError::InvalidArgument(_)));
}

#[tokio::test]
async fn test_role_list_by_policy() {
    let (server, client) = mock_agent().await;
    Mock::given(method("GET"))
        .and(path("/v1/acl/roles"))
        .and(query_param("policy", "p9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"ID": "r1", "Name": "readers", "Policies": [{"ID": "p9", "Name": "kv-read"}]}
        ])))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/v1/acl/role/r1"))
        .and(body_partial_json(json!({"ID": "r1", "Name": "readers"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ID": "r1", "Name": "readers", "Policies": null
        })))
        .expect(1)
        .mount(&server)
        .await;

    let roles = client.roles().list(Some("p9"), None).await.unwrap().response;
    assert_eq!(roles[0].policies[0].name, "kv-read");

    let mut role = AclRole::new("readers");
    role.id = "r1".to_string();
    let updated = client.roles().update(&role, None).await.unwrap().response;
    assert!(updated.policies.is_empty());
}

#[tokio::test]
async fn test_binding_rules_by_method() {
    let (server, client) = mock_agent().await;
    Mock::given(method("GET"))
        .and(path("/v1/acl/binding-rules"))
        .and(query_param("authmethod", "minikube"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "ID": "b1", "AuthMethod": "minikube", "Selector": "",
            "BindType": "service", "BindName": "${serviceaccount.name}"
        }])))
        .mount(&server)
        .await;

    let rules: Vec<AclBindingRule> = client
        .binding_rules()
        .list(Some("minikube"), None)
        .await
        .unwrap()
        .response;
    assert_eq!(rules[0].bind_type, BindingRuleBindType::Service);
}

#[tokio::test]
async fn test_login_and_logout() {
    let (server, client) = mock_agent().await;
    Mock::given(method("POST"))
        .and(path("/v1/acl/login"))
        .and(body_json(json!({"AuthMethod": "minikube", "BearerToken": "jwt"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_json("a3", "login")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/acl/logout"))
        .and(wiremock::matchers::header("X-Consul-Token", "secret-a3"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let params = AclLoginParams {
        auth_method: "minikube".to_string(),
        bearer_token: "jwt".to_string(),
        ..Default::default()
    };
    let token = client.acl().login(&params, None).await.unwrap().response;
    assert_eq!(token.accessor_id, "a3");

    let w = batata_consul_client::WriteOptions::new().token("secret-a3");
    client.acl().logout(Some(&w)).await.unwrap();
}

#[tokio::test]
async fn test_bootstrap_already_done() {
    let (server, client) = mock_agent().await;
    Mock::given(method("PUT"))
        .and(path("/v1/acl/bootstrap"))
        .respond_with(
            ResponseTemplate::new(403)
                .set_body_string("Permission denied: ACL bootstrap no longer allowed"),
        )
        .mount(&server)
        .await;

    let err = client.acl().bootstrap().await.unwrap_err();
    assert_eq!(err.status(), Some(403));
}
