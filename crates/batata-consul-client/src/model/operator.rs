// Operator API models: raft, keyring and autopilot

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::codec::duration::{text, text_option};

// ============================================================================
// Raft
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RaftServer {
    #[serde(rename = "ID")]
    pub id: String,
    pub node: String,
    pub address: String,
    pub leader: bool,
    #[serde(default)]
    pub protocol_version: String,
    pub voter: bool,
    #[serde(default)]
    pub last_index: u64,
}

/// Raft peer set, `/v1/operator/raft/configuration`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RaftConfiguration {
    #[serde(default, deserialize_with = "crate::model::null_as_default")]
    pub servers: Vec<RaftServer>,
    #[serde(default)]
    pub index: u64,
}

impl RaftConfiguration {
    pub fn leader(&self) -> Option<&RaftServer> {
        self.servers.iter().find(|s| s.leader)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TransferLeaderResponse {
    pub success: bool,
}

// ============================================================================
// Keyring
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct KeyringRequest<'a> {
    pub key: &'a str,
}

/// Gossip keyring state of one pool
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct KeyringResponse {
    #[serde(rename = "WAN")]
    pub wan: bool,
    #[serde(default)]
    pub datacenter: String,
    #[serde(default)]
    pub segment: String,
    #[serde(default)]
    pub partition: String,
    #[serde(default, deserialize_with = "crate::model::null_as_default")]
    pub messages: HashMap<String, String>,
    /// Installed keys and how many nodes know each
    #[serde(default, deserialize_with = "crate::model::null_as_default")]
    pub keys: HashMap<String, i32>,
    #[serde(default, deserialize_with = "crate::model::null_as_default")]
    pub primary_keys: HashMap<String, i32>,
    #[serde(default)]
    pub num_nodes: i32,
}

/// Options for keyring calls
#[derive(Debug, Clone, Default)]
pub struct KeyringOptions {
    /// Ask only the local datacenter's servers
    pub local_only: bool,
    /// Gossip relay factor, 0 to 5
    pub relay_factor: Option<u8>,
}

// ============================================================================
// Autopilot
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AutopilotConfiguration {
    pub cleanup_dead_servers: bool,
    #[serde(with = "text")]
    pub last_contact_threshold: Duration,
    pub max_trailing_logs: u64,
    #[serde(default)]
    pub min_quorum: u32,
    #[serde(with = "text")]
    pub server_stabilization_time: Duration,
    #[serde(default)]
    pub redundancy_zone_tag: String,
    #[serde(default)]
    pub disable_upgrade_migration: bool,
    #[serde(default)]
    pub upgrade_version_tag: String,
    #[serde(default)]
    pub create_index: u64,
    /// Compared against on check-and-set updates
    #[serde(default)]
    pub modify_index: u64,
}

impl Default for AutopilotConfiguration {
    fn default() -> Self {
        Self {
            cleanup_dead_servers: true,
            last_contact_threshold: Duration::from_millis(200),
            max_trailing_logs: 250,
            min_quorum: 0,
            server_stabilization_time: Duration::from_secs(10),
            redundancy_zone_tag: String::new(),
            disable_upgrade_migration: false,
            upgrade_version_tag: String::new(),
            create_index: 0,
            modify_index: 0,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ServerHealth {
    #[serde(rename = "ID")]
    pub id: String,
    pub name: String,
    pub address: String,
    #[serde(default)]
    pub serf_status: String,
    #[serde(default)]
    pub version: String,
    pub leader: bool,
    #[serde(default, with = "text_option")]
    pub last_contact: Option<Duration>,
    #[serde(default)]
    pub last_term: u64,
    #[serde(default)]
    pub last_index: u64,
    pub healthy: bool,
    pub voter: bool,
    #[serde(default)]
    pub stable_since: Option<DateTime<Utc>>,
}

/// Reply of `/v1/operator/autopilot/health`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct OperatorHealthReply {
    pub healthy: bool,
    pub failure_tolerance: i32,
    #[serde(default, deserialize_with = "crate::model::null_as_default")]
    pub servers: Vec<ServerHealth>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AutopilotServer {
    #[serde(rename = "ID")]
    pub id: String,
    pub name: String,
    pub address: String,
    #[serde(default)]
    pub node_status: String,
    #[serde(default)]
    pub version: String,
    #[serde(default, with = "text_option")]
    pub last_contact: Option<Duration>,
    #[serde(default)]
    pub last_term: u64,
    #[serde(default)]
    pub last_index: u64,
    pub healthy: bool,
    #[serde(default)]
    pub stable_since: Option<DateTime<Utc>>,
    /// `leader`, `voter`, `non-voter`, `staging`
    #[serde(default)]
    pub status: String,
}

/// Reply of `/v1/operator/autopilot/state`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AutopilotState {
    pub healthy: bool,
    pub failure_tolerance: i32,
    #[serde(default)]
    pub optimistic_failure_tolerance: i32,
    #[serde(default)]
    pub leader: String,
    #[serde(default, deserialize_with = "crate::model::null_as_default")]
    pub voters: Vec<String>,
    #[serde(default, deserialize_with = "crate::model::null_as_default")]
    pub servers: HashMap<String, AutopilotServer>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_autopilot_configuration_durations() {
        let json = r#"{
            "CleanupDeadServers": true, "LastContactThreshold": "200ms",
            "MaxTrailingLogs": 250, "MinQuorum": 0, "ServerStabilizationTime": "10s",
            "RedundancyZoneTag": "", "DisableUpgradeMigration": false,
            "UpgradeVersionTag": "", "CreateIndex": 4, "ModifyIndex": 4
        }"#;
        let conf: AutopilotConfiguration = serde_json::from_str(json).unwrap();
        assert_eq!(conf.last_contact_threshold, Duration::from_millis(200));
        assert_eq!(conf.server_stabilization_time, Duration::from_secs(10));

        let out = serde_json::to_value(&conf).unwrap();
        assert_eq!(out["LastContactThreshold"], "200ms");
        assert_eq!(out["ServerStabilizationTime"], "10s");
    }

    #[test]
    fn test_health_reply() {
        let json = r#"{
            "Healthy": true, "FailureTolerance": 0,
            "Servers": [{
                "ID": "e349749b-3303-3ddf-959c-b5885a0e1f6e", "Name": "node1",
                "Address": "127.0.0.1:8300", "SerfStatus": "alive", "Version": "0.7.4",
                "Leader": true, "LastContact": "0s", "LastTerm": 2, "LastIndex": 46,
                "Healthy": true, "Voter": true, "StableSince": "2017-03-06T22:07:51Z"
            }]
        }"#;
        let reply: OperatorHealthReply = serde_json::from_str(json).unwrap();
        assert_eq!(reply.servers.len(), 1);
        assert_eq!(reply.servers[0].last_contact, Some(Duration::ZERO));
        assert!(reply.servers[0].stable_since.is_some());
    }

    #[test]
    fn test_raft_configuration_leader() {
        let json = r#"{"Servers": [
            {"ID": "a", "Node": "n1", "Address": "10.0.0.1:8300", "Leader": false, "Voter": true},
            {"ID": "b", "Node": "n2", "Address": "10.0.0.2:8300", "Leader": true, "Voter": true}
        ], "Index": 22}"#;
        let conf: RaftConfiguration = serde_json::from_str(json).unwrap();
        assert_eq!(conf.leader().map(|s| s.node.as_str()), Some("n2"));
    }
}
