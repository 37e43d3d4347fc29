// Health check models and the check status type

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::codec::duration::text_option;
use crate::error::ConsulError;
use crate::model::agent::AgentService;
use crate::model::catalog::Node;

/// Check id the agent uses when the whole node is in maintenance
pub const NODE_MAINTENANCE_CHECK_ID: &str = "_node_maintenance";
/// Prefix of the check id the agent uses for a service in maintenance
pub const SERVICE_MAINTENANCE_CHECK_PREFIX: &str = "_service_maintenance:";

/// Status of a health check.
///
/// `Any` is only meaningful as a filter for `/v1/health/state/:state`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HealthStatus {
    Passing,
    Warning,
    #[default]
    Critical,
    Maintenance,
    Any,
}

impl HealthStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Passing => "passing",
            HealthStatus::Warning => "warning",
            HealthStatus::Critical => "critical",
            HealthStatus::Maintenance => "maintenance",
            HealthStatus::Any => "any",
        }
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HealthStatus {
    type Err = ConsulError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "passing" => Ok(HealthStatus::Passing),
            "warning" => Ok(HealthStatus::Warning),
            "critical" => Ok(HealthStatus::Critical),
            "maintenance" => Ok(HealthStatus::Maintenance),
            "any" => Ok(HealthStatus::Any),
            other => Err(ConsulError::InvalidArgument(format!(
                "invalid health status '{other}'"
            ))),
        }
    }
}

impl Serialize for HealthStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for HealthStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// A health check as returned by the health and agent endpoints
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct HealthCheck {
    #[serde(default)]
    pub node: String,
    #[serde(rename = "CheckID")]
    pub check_id: String,
    #[serde(default)]
    pub name: String,
    pub status: HealthStatus,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub output: String,
    #[serde(rename = "ServiceID", default)]
    pub service_id: String,
    #[serde(default)]
    pub service_name: String,
    #[serde(default, deserialize_with = "crate::model::null_as_default")]
    pub service_tags: Vec<String>,
    #[serde(rename = "Type", default)]
    pub check_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub definition: Option<HealthCheckDefinition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default)]
    pub create_index: u64,
    #[serde(default)]
    pub modify_index: u64,
}

/// Definition details echoed back with a check
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct HealthCheckDefinition {
    #[serde(rename = "HTTP", default, skip_serializing_if = "Option::is_none")]
    pub http: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header: Option<HashMap<String, Vec<String>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(rename = "TLSSkipVerify", default)]
    pub tls_skip_verify: bool,
    #[serde(rename = "TCP", default, skip_serializing_if = "Option::is_none")]
    pub tcp: Option<String>,
    #[serde(default, with = "text_option", skip_serializing_if = "Option::is_none")]
    pub interval: Option<Duration>,
    #[serde(default, with = "text_option", skip_serializing_if = "Option::is_none")]
    pub timeout: Option<Duration>,
    #[serde(default, with = "text_option", skip_serializing_if = "Option::is_none")]
    pub deregister_critical_service_after: Option<Duration>,
}

/// Aggregate health of a set of checks.
///
/// Maintenance beats critical, critical beats warning, warning beats passing.
/// An empty set is passing.
pub fn aggregated_status(checks: &[HealthCheck]) -> HealthStatus {
    let mut warning = false;
    let mut critical = false;
    let mut maintenance = false;

    for check in checks {
        if check.check_id == NODE_MAINTENANCE_CHECK_ID
            || check.check_id.starts_with(SERVICE_MAINTENANCE_CHECK_PREFIX)
        {
            maintenance = true;
            continue;
        }
        match check.status {
            HealthStatus::Warning => warning = true,
            HealthStatus::Critical => critical = true,
            HealthStatus::Passing | HealthStatus::Maintenance | HealthStatus::Any => {}
        }
    }

    if maintenance {
        HealthStatus::Maintenance
    } else if critical {
        HealthStatus::Critical
    } else if warning {
        HealthStatus::Warning
    } else {
        HealthStatus::Passing
    }
}

/// Service health entry, `/v1/health/service/:service`
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ServiceEntry {
    pub node: Node,
    pub service: AgentService,
    #[serde(default, deserialize_with = "crate::model::null_as_default")]
    pub checks: Vec<HealthCheck>,
}

impl ServiceEntry {
    pub fn aggregated_status(&self) -> HealthStatus {
        aggregated_status(&self.checks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(id: &str, status: HealthStatus) -> HealthCheck {
        HealthCheck {
            check_id: id.to_string(),
            status,
            ..Default::default()
        }
    }

    #[test]
    fn test_status_serde() {
        let s: HealthStatus = serde_json::from_str("\"warning\"").unwrap();
        assert_eq!(s, HealthStatus::Warning);
        assert_eq!(
            serde_json::to_string(&HealthStatus::Maintenance).unwrap(),
            "\"maintenance\""
        );
        assert!(serde_json::from_str::<HealthStatus>("\"unknown\"").is_err());
    }

    #[test]
    fn test_aggregated_status_precedence() {
        assert_eq!(aggregated_status(&[]), HealthStatus::Passing);
        assert_eq!(
            aggregated_status(&[
                check("a", HealthStatus::Passing),
                check("b", HealthStatus::Warning)
            ]),
            HealthStatus::Warning
        );
        assert_eq!(
            aggregated_status(&[
                check("a", HealthStatus::Warning),
                check("b", HealthStatus::Critical)
            ]),
            HealthStatus::Critical
        );
        assert_eq!(
            aggregated_status(&[
                check("a", HealthStatus::Critical),
                check("_service_maintenance:web", HealthStatus::Critical)
            ]),
            HealthStatus::Maintenance
        );
        assert_eq!(
            aggregated_status(&[check(NODE_MAINTENANCE_CHECK_ID, HealthStatus::Critical)]),
            HealthStatus::Maintenance
        );
    }

    #[test]
    fn test_service_entry_deserialize() {
        let json = r#"{
            "Node": {"ID": "40e4a748", "Node": "foobar", "Address": "10.1.10.12", "Datacenter": "dc1"},
            "Service": {"ID": "redis", "Service": "redis", "Tags": ["primary"], "Port": 8000, "Address": "10.1.10.12"},
            "Checks": [
                {"Node": "foobar", "CheckID": "service:redis", "Name": "Service 'redis' check",
                 "Status": "passing", "ServiceID": "redis", "ServiceName": "redis", "ServiceTags": null}
            ]
        }"#;
        let entry: ServiceEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.node.node, "foobar");
        assert_eq!(entry.service.port, 8000);
        assert!(entry.checks[0].service_tags.is_empty());
        assert_eq!(entry.aggregated_status(), HealthStatus::Passing);
    }
}
