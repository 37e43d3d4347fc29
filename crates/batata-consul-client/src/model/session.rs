// Session models

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::codec::duration::{nanos, text_option};

/// What happens to locks held by a session when it is invalidated
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionBehavior {
    /// Held locks are released
    #[default]
    Release,
    /// Held keys are deleted
    Delete,
}

/// Service check a session is bound to
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceCheck {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "Namespace", default, skip_serializing_if = "String::is_empty")]
    pub namespace: String,
}

/// Session as stored by the servers
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionEntry {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "Name", default)]
    pub name: String,
    #[serde(rename = "Node", default)]
    pub node: String,
    /// Reported as an integer count of nanoseconds
    #[serde(rename = "LockDelay", default, with = "nanos")]
    pub lock_delay: Duration,
    #[serde(rename = "Behavior", default)]
    pub behavior: SessionBehavior,
    #[serde(rename = "TTL", default, with = "text_option")]
    pub ttl: Option<Duration>,
    #[serde(rename = "NodeChecks", default, deserialize_with = "crate::model::null_as_default")]
    pub node_checks: Vec<String>,
    #[serde(
        rename = "ServiceChecks",
        default,
        deserialize_with = "crate::model::null_as_default"
    )]
    pub service_checks: Vec<ServiceCheck>,
    #[serde(rename = "Checks", default, deserialize_with = "crate::model::null_as_default")]
    pub checks: Vec<String>,
    #[serde(rename = "Namespace", default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(rename = "CreateIndex", default)]
    pub create_index: u64,
    #[serde(rename = "ModifyIndex", default)]
    pub modify_index: u64,
}

/// Body of `PUT /v1/session/create`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionRequest {
    #[serde(rename = "Name", default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Defaults to the node of the agent serving the request
    #[serde(rename = "Node", default, skip_serializing_if = "Option::is_none")]
    pub node: Option<String>,
    #[serde(
        rename = "LockDelay",
        default,
        with = "text_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub lock_delay: Option<Duration>,
    #[serde(rename = "Behavior", default, skip_serializing_if = "Option::is_none")]
    pub behavior: Option<SessionBehavior>,
    /// Between 10s and 24h when set
    #[serde(rename = "TTL", default, with = "text_option", skip_serializing_if = "Option::is_none")]
    pub ttl: Option<Duration>,
    #[serde(rename = "NodeChecks", default, skip_serializing_if = "Option::is_none")]
    pub node_checks: Option<Vec<String>>,
    #[serde(rename = "ServiceChecks", default, skip_serializing_if = "Option::is_none")]
    pub service_checks: Option<Vec<ServiceCheck>>,
    #[serde(rename = "Checks", default, skip_serializing_if = "Option::is_none")]
    pub checks: Option<Vec<String>>,
}

impl SessionRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn with_node(mut self, node: &str) -> Self {
        self.node = Some(node.to_string());
        self
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    pub fn with_lock_delay(mut self, delay: Duration) -> Self {
        self.lock_delay = Some(delay);
        self
    }

    pub fn with_behavior(mut self, behavior: SessionBehavior) -> Self {
        self.behavior = Some(behavior);
        self
    }

    pub fn with_node_checks(mut self, checks: Vec<String>) -> Self {
        self.node_checks = Some(checks);
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct SessionId {
    #[serde(rename = "ID")]
    pub id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_entry_mixed_duration_formats() {
        let json = r#"{
            "ID": "adf4238a-882b-9ddc-4a9d-5b6758e4159e", "Name": "test-session",
            "Node": "raja-laptop-02", "LockDelay": 1500000000, "Behavior": "release",
            "TTL": "30s", "NodeChecks": ["serfHealth"], "ServiceChecks": null,
            "CreateIndex": 1086449, "ModifyIndex": 1086449
        }"#;
        let entry: SessionEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.lock_delay, Duration::from_millis(1500));
        assert_eq!(entry.ttl, Some(Duration::from_secs(30)));
        assert_eq!(entry.behavior, SessionBehavior::Release);
        assert!(entry.service_checks.is_empty());
    }

    #[test]
    fn test_session_entry_without_ttl() {
        let entry: SessionEntry =
            serde_json::from_str(r#"{"ID":"x","LockDelay":0,"Behavior":"delete","TTL":""}"#)
                .unwrap();
        assert!(entry.ttl.is_none());
        assert_eq!(entry.behavior, SessionBehavior::Delete);
    }

    #[test]
    fn test_session_request_writes_text_durations() {
        let req = SessionRequest::new()
            .with_name("lock")
            .with_ttl(Duration::from_secs(15))
            .with_lock_delay(Duration::from_secs(1))
            .with_behavior(SessionBehavior::Delete);
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "Name": "lock", "TTL": "15s", "LockDelay": "1s", "Behavior": "delete"
            })
        );
    }
}
