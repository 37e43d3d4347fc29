//! Lock acquire/release flow against a mock agent

mod common;

use std::time::Duration;

use batata_consul_client::{ConsulError, LockOptions};
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::mock_agent;

const LOCK_FLAGS: &str = "3304740253564472344";

async fn mount_session(server: &MockServer) {
    Mock::given(method("PUT"))
        .and(path("/v1/session/create"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ID": "sess-1"})))
        .expect(1)
        .mount(server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/v1/session/destroy/sess-1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("true"))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_acquire_and_release() {
    let (server, client) = mock_agent().await;
    mount_session(&server).await;
    Mock::given(method("GET"))
        .and(path("/v1/kv/service/leader"))
        .and(query_param("consistent", ""))
        .respond_with(ResponseTemplate::new(404).insert_header("X-Consul-Index", "7"))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/v1/kv/service/leader"))
        .and(query_param("acquire", "sess-1"))
        .and(query_param("flags", LOCK_FLAGS))
        .respond_with(ResponseTemplate::new(200).set_body_string("true"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/v1/kv/service/leader"))
        .and(query_param("release", "sess-1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("true"))
        .expect(1)
        .mount(&server)
        .await;

    let lock = client
        .lock(LockOptions::new("service/leader").with_value("node-a"))
        .unwrap();
    assert!(lock.acquire().await.unwrap());
    assert!(lock.is_held());
    assert!(matches!(lock.acquire().await, Err(ConsulError::LockHeld)));
    assert!(matches!(lock.destroy().await, Err(ConsulError::LockHeld)));

    lock.release().await.unwrap();
    assert!(!lock.is_held());
}

#[tokio::test]
async fn test_acquire_conflicting_key() {
    let (server, client) = mock_agent().await;
    mount_session(&server).await;
    Mock::given(method("GET"))
        .and(path("/v1/kv/service/leader"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "Key": "service/leader", "Flags": 0, "Value": null,
            "CreateIndex": 3, "ModifyIndex": 3, "LockIndex": 0
        }])))
        .mount(&server)
        .await;

    let lock = client.lock_key("service/leader").unwrap();
    assert!(matches!(lock.acquire().await, Err(ConsulError::LockConflict)));
    assert!(!lock.is_held());
}

#[tokio::test]
async fn test_try_once_gives_up() {
    let (server, client) = mock_agent().await;
    Mock::given(method("GET"))
        .and(path("/v1/kv/service/leader"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("X-Consul-Index", "9")
                .set_body_json(json!([{
                    "Key": "service/leader", "Flags": 3304740253564472344u64,
                    "Session": "other", "Value": null,
                    "CreateIndex": 3, "ModifyIndex": 9, "LockIndex": 1
                }]))
                .set_delay(Duration::from_millis(60)),
        )
        .mount(&server)
        .await;

    let opts = LockOptions::new("service/leader")
        .with_session("mine")
        .with_wait_time(Duration::from_millis(100))
        .try_once();
    let lock = client.lock(opts).unwrap();
    assert!(!lock.acquire().await.unwrap());
    assert!(!lock.is_held());
}

#[tokio::test]
async fn test_destroy_in_use() {
    let (server, client) = mock_agent().await;
    Mock::given(method("GET"))
        .and(path("/v1/kv/service/leader"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "Key": "service/leader", "Flags": 3304740253564472344u64,
            "Session": "other", "Value": null,
            "CreateIndex": 3, "ModifyIndex": 9, "LockIndex": 1
        }])))
        .mount(&server)
        .await;

    let lock = client.lock_key("service/leader").unwrap();
    assert!(matches!(lock.destroy().await, Err(ConsulError::LockInUse)));
}

#[tokio::test]
async fn test_destroy_free_lock() {
    let (server, client) = mock_agent().await;
    Mock::given(method("GET"))
        .and(path("/v1/kv/service/leader"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "Key": "service/leader", "Flags": 3304740253564472344u64, "Value": null,
            "CreateIndex": 3, "ModifyIndex": 12, "LockIndex": 1
        }])))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/v1/kv/service/leader"))
        .and(query_param("cas", "12"))
        .respond_with(ResponseTemplate::new(200).set_body_string("true"))
        .expect(1)
        .mount(&server)
        .await;

    let lock = client.lock_key("service/leader").unwrap();
    lock.destroy().await.unwrap();
}

#[tokio::test]
async fn test_acquire_retries_during_lock_delay() {
    let (server, client) = mock_agent().await;
    mount_session(&server).await;
    Mock::given(method("GET"))
        .and(path("/v1/kv/service/leader"))
        .respond_with(ResponseTemplate::new(404).insert_header("X-Consul-Index", "7"))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/v1/kv/service/leader"))
        .and(query_param("acquire", "sess-1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("false"))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/v1/kv/service/leader"))
        .and(query_param("acquire", "sess-1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("true"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/v1/kv/service/leader"))
        .and(query_param("release", "sess-1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("true"))
        .mount(&server)
        .await;

    let opts = LockOptions::new("service/leader").with_retry_time(Duration::from_millis(20));
    let lock = client.lock(opts).unwrap();
    assert!(lock.acquire().await.unwrap());
    assert!(lock.is_held());
    lock.release().await.unwrap();
}

#[tokio::test]
async fn test_lock_lost_when_session_expires() {
    let (server, client) = mock_agent().await;
    Mock::given(method("PUT"))
        .and(path("/v1/session/create"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ID": "sess-1"})))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/v1/session/renew/sess-1"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/kv/service/leader"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/v1/kv/service/leader"))
        .and(query_param("acquire", "sess-1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("true"))
        .mount(&server)
        .await;

    let opts = LockOptions::new("service/leader").with_session_ttl(Duration::from_millis(200));
    let lock = client.lock(opts).unwrap();
    assert!(lock.acquire().await.unwrap());

    tokio::time::sleep(Duration::from_millis(400)).await;
    assert!(!lock.is_held());
    assert!(matches!(lock.release().await, Err(ConsulError::LockNotHeld)));
}
