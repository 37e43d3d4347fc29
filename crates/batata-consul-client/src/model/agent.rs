// Agent API models: services, checks, members and agent metadata

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::codec::duration::text_option;
use crate::model::health::{HealthCheck, HealthStatus};

// ============================================================================
// Service Models
// ============================================================================

/// Service weights for DNS SRV answers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentWeights {
    #[serde(rename = "Passing", default = "default_weight")]
    pub passing: i32,
    #[serde(rename = "Warning", default = "default_weight")]
    pub warning: i32,
}

impl Default for AgentWeights {
    fn default() -> Self {
        Self {
            passing: 1,
            warning: 1,
        }
    }
}

fn default_weight() -> i32 {
    1
}

/// Address and port published under a tagged address key (`lan`, `wan`, ...)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceAddress {
    #[serde(rename = "Address")]
    pub address: String,
    #[serde(rename = "Port")]
    pub port: u16,
}

/// Service as reported by the agent and inside catalog/health entries
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentService {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "Service")]
    pub service: String,
    #[serde(rename = "Tags", default, deserialize_with = "crate::model::null_as_default")]
    pub tags: Vec<String>,
    #[serde(rename = "Port", default)]
    pub port: u16,
    #[serde(rename = "Address", default)]
    pub address: String,
    #[serde(rename = "Meta", default, deserialize_with = "crate::model::null_as_default")]
    pub meta: HashMap<String, String>,
    #[serde(rename = "Weights", default)]
    pub weights: AgentWeights,
    #[serde(rename = "EnableTagOverride", default)]
    pub enable_tag_override: bool,
    /// Empty for typical services, `connect-proxy`, `mesh-gateway`, ... otherwise
    #[serde(rename = "Kind", default, skip_serializing_if = "String::is_empty")]
    pub kind: String,
    #[serde(rename = "Proxy", default, skip_serializing_if = "Option::is_none")]
    pub proxy: Option<serde_json::Value>,
    #[serde(rename = "Connect", default, skip_serializing_if = "Option::is_none")]
    pub connect: Option<serde_json::Value>,
    #[serde(
        rename = "TaggedAddresses",
        default,
        deserialize_with = "crate::model::null_as_default",
        skip_serializing_if = "HashMap::is_empty"
    )]
    pub tagged_addresses: HashMap<String, ServiceAddress>,
    #[serde(rename = "ContentHash", default, skip_serializing_if = "String::is_empty")]
    pub content_hash: String,
    #[serde(rename = "Datacenter", default, skip_serializing_if = "Option::is_none")]
    pub datacenter: Option<String>,
    #[serde(rename = "Namespace", default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(rename = "Partition", default, skip_serializing_if = "Option::is_none")]
    pub partition: Option<String>,
    #[serde(rename = "CreateIndex", default)]
    pub create_index: u64,
    #[serde(rename = "ModifyIndex", default)]
    pub modify_index: u64,
}

/// Local service health, `/v1/agent/health/service/*`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentServiceChecksInfo {
    #[serde(rename = "AggregatedStatus")]
    pub aggregated_status: HealthStatus,
    #[serde(rename = "Service")]
    pub service: AgentService,
    #[serde(rename = "Checks", default, deserialize_with = "crate::model::null_as_default")]
    pub checks: Vec<HealthCheck>,
}

/// Check executed by the agent on behalf of a service or node
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentCheckDefinition {
    #[serde(rename = "Notes", default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Initial status; the agent starts checks as critical otherwise
    #[serde(rename = "Status", default, skip_serializing_if = "Option::is_none")]
    pub status: Option<HealthStatus>,
    #[serde(rename = "TTL", default, with = "text_option", skip_serializing_if = "Option::is_none")]
    pub ttl: Option<Duration>,
    #[serde(rename = "HTTP", default, skip_serializing_if = "Option::is_none")]
    pub http: Option<String>,
    #[serde(rename = "Method", default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(rename = "Header", default, skip_serializing_if = "Option::is_none")]
    pub header: Option<HashMap<String, Vec<String>>>,
    #[serde(rename = "Body", default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(rename = "TCP", default, skip_serializing_if = "Option::is_none")]
    pub tcp: Option<String>,
    #[serde(rename = "GRPC", default, skip_serializing_if = "Option::is_none")]
    pub grpc: Option<String>,
    #[serde(rename = "GRPCUseTLS", default, skip_serializing_if = "std::ops::Not::not")]
    pub grpc_use_tls: bool,
    #[serde(rename = "TLSSkipVerify", default, skip_serializing_if = "std::ops::Not::not")]
    pub tls_skip_verify: bool,
    #[serde(
        rename = "Interval",
        default,
        with = "text_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub interval: Option<Duration>,
    #[serde(
        rename = "Timeout",
        default,
        with = "text_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub timeout: Option<Duration>,
    #[serde(
        rename = "DeregisterCriticalServiceAfter",
        default,
        with = "text_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub deregister_critical_service_after: Option<Duration>,
}

impl AgentCheckDefinition {
    /// A TTL check that must be refreshed through the `*_ttl` agent calls
    pub fn ttl(ttl: Duration) -> Self {
        Self {
            ttl: Some(ttl),
            ..Default::default()
        }
    }

    pub fn http(url: &str, interval: Duration) -> Self {
        Self {
            http: Some(url.to_string()),
            interval: Some(interval),
            ..Default::default()
        }
    }

    pub fn tcp(addr: &str, interval: Duration) -> Self {
        Self {
            tcp: Some(addr.to_string()),
            interval: Some(interval),
            ..Default::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_deregister_after(mut self, after: Duration) -> Self {
        self.deregister_critical_service_after = Some(after);
        self
    }

    pub fn with_status(mut self, status: HealthStatus) -> Self {
        self.status = Some(status);
        self
    }
}

/// Check embedded in a service registration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentServiceCheck {
    #[serde(rename = "CheckID", default, skip_serializing_if = "Option::is_none")]
    pub check_id: Option<String>,
    #[serde(rename = "Name", default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub definition: AgentCheckDefinition,
}

impl From<AgentCheckDefinition> for AgentServiceCheck {
    fn from(definition: AgentCheckDefinition) -> Self {
        Self {
            check_id: None,
            name: None,
            definition,
        }
    }
}

/// Service registration body, `PUT /v1/agent/service/register`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentServiceRegistration {
    #[serde(rename = "ID", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Tags", default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(rename = "Address", default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(rename = "Port", default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(rename = "Meta", default, skip_serializing_if = "HashMap::is_empty")]
    pub meta: HashMap<String, String>,
    #[serde(rename = "EnableTagOverride", default)]
    pub enable_tag_override: bool,
    #[serde(rename = "Weights", default, skip_serializing_if = "Option::is_none")]
    pub weights: Option<AgentWeights>,
    #[serde(rename = "Kind", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(rename = "Proxy", default, skip_serializing_if = "Option::is_none")]
    pub proxy: Option<serde_json::Value>,
    #[serde(rename = "Connect", default, skip_serializing_if = "Option::is_none")]
    pub connect: Option<serde_json::Value>,
    #[serde(rename = "TaggedAddresses", default, skip_serializing_if = "HashMap::is_empty")]
    pub tagged_addresses: HashMap<String, ServiceAddress>,
    #[serde(rename = "Check", default, skip_serializing_if = "Option::is_none")]
    pub check: Option<AgentServiceCheck>,
    #[serde(rename = "Checks", default, skip_serializing_if = "Vec::is_empty")]
    pub checks: Vec<AgentServiceCheck>,
    #[serde(rename = "Namespace", default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(rename = "Partition", default, skip_serializing_if = "Option::is_none")]
    pub partition: Option<String>,
}

impl AgentServiceRegistration {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }

    pub fn with_address(mut self, address: &str, port: u16) -> Self {
        self.address = Some(address.to_string());
        self.port = Some(port);
        self
    }

    pub fn with_tags(mut self, tags: &[&str]) -> Self {
        self.tags = tags.iter().map(|t| t.to_string()).collect();
        self
    }

    pub fn with_meta(mut self, key: &str, value: &str) -> Self {
        self.meta.insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_check(mut self, check: impl Into<AgentServiceCheck>) -> Self {
        self.checks.push(check.into());
        self
    }

    /// Effective service id: the explicit id, or the name when none is set
    pub fn service_id(&self) -> &str {
        self.id.as_deref().unwrap_or(&self.name)
    }
}

/// Standalone check registration body, `PUT /v1/agent/check/register`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentCheckRegistration {
    #[serde(rename = "ID", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "ServiceID", default, skip_serializing_if = "Option::is_none")]
    pub service_id: Option<String>,
    #[serde(flatten)]
    pub definition: AgentCheckDefinition,
}

impl AgentCheckRegistration {
    pub fn new(name: &str, definition: AgentCheckDefinition) -> Self {
        Self {
            id: None,
            name: name.to_string(),
            service_id: None,
            definition,
        }
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }

    pub fn for_service(mut self, service_id: &str) -> Self {
        self.service_id = Some(service_id.to_string());
        self
    }
}

/// Body of `PUT /v1/agent/check/update/:check_id`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckUpdate {
    #[serde(rename = "Status")]
    pub status: HealthStatus,
    #[serde(rename = "Output", default)]
    pub output: String,
}

// ============================================================================
// Agent Core Models
// ============================================================================

/// Serf member, `/v1/agent/members`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentMember {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Addr")]
    pub addr: String,
    #[serde(rename = "Port")]
    pub port: u16,
    #[serde(rename = "Tags", default, deserialize_with = "crate::model::null_as_default")]
    pub tags: HashMap<String, String>,
    /// Serf status: 0 none, 1 alive, 2 leaving, 3 left, 4 failed
    #[serde(rename = "Status", default)]
    pub status: i32,
    #[serde(rename = "ProtocolMin", default)]
    pub protocol_min: u8,
    #[serde(rename = "ProtocolMax", default)]
    pub protocol_max: u8,
    #[serde(rename = "ProtocolCur", default)]
    pub protocol_cur: u8,
    #[serde(rename = "DelegateMin", default)]
    pub delegate_min: u8,
    #[serde(rename = "DelegateMax", default)]
    pub delegate_max: u8,
    #[serde(rename = "DelegateCur", default)]
    pub delegate_cur: u8,
}

impl AgentMember {
    pub fn is_alive(&self) -> bool {
        self.status == 1
    }
}

/// Options for `/v1/agent/members`
#[derive(Debug, Clone, Default)]
pub struct MembersOptions {
    pub wan: bool,
    pub segment: Option<String>,
}

/// Subset of the agent configuration returned by `/v1/agent/self`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentConfig {
    #[serde(rename = "Datacenter", default)]
    pub datacenter: String,
    #[serde(rename = "PrimaryDatacenter", default)]
    pub primary_datacenter: String,
    #[serde(rename = "NodeName", default)]
    pub node_name: String,
    #[serde(rename = "NodeID", default)]
    pub node_id: String,
    #[serde(rename = "Server", default)]
    pub server: bool,
    #[serde(rename = "Revision", default)]
    pub revision: String,
    #[serde(rename = "Version", default)]
    pub version: String,
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

/// Response of `/v1/agent/self`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentSelf {
    #[serde(rename = "Config", default)]
    pub config: AgentConfig,
    #[serde(rename = "Coord", default, skip_serializing_if = "Option::is_none")]
    pub coord: Option<crate::model::coordinate::Coord>,
    #[serde(rename = "Member", default)]
    pub member: AgentMember,
    #[serde(rename = "Meta", default, deserialize_with = "crate::model::null_as_default")]
    pub meta: HashMap<String, String>,
    #[serde(rename = "Stats", default, deserialize_with = "crate::model::null_as_default")]
    pub stats: HashMap<String, HashMap<String, String>>,
}

/// Response of `/v1/agent/version`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentVersion {
    #[serde(rename = "Version", default)]
    pub version: String,
    #[serde(rename = "Revision", default)]
    pub revision: String,
    #[serde(rename = "Prerelease", default)]
    pub prerelease: String,
    #[serde(rename = "HumanVersion", default)]
    pub human_version: String,
    #[serde(rename = "BuildDate", default)]
    pub build_date: String,
    #[serde(rename = "FIPS", default)]
    pub fips: String,
}

/// ACL tokens the agent can be told to use, `PUT /v1/agent/token/:kind`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentTokenKind {
    Default,
    Agent,
    AgentRecovery,
    Replication,
}

impl AgentTokenKind {
    pub fn as_path(&self) -> &'static str {
        match self {
            AgentTokenKind::Default => "default",
            AgentTokenKind::Agent => "agent",
            AgentTokenKind::AgentRecovery => "agent_recovery",
            AgentTokenKind::Replication => "replication",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct AgentToken<'a> {
    #[serde(rename = "Token")]
    pub token: &'a str,
}

// ============================================================================
// Metrics Models
// ============================================================================

/// In-memory telemetry snapshot, `/v1/agent/metrics`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetricsInfo {
    #[serde(rename = "Timestamp", default)]
    pub timestamp: String,
    #[serde(rename = "Gauges", default, deserialize_with = "crate::model::null_as_default")]
    pub gauges: Vec<GaugeValue>,
    #[serde(rename = "Points", default, deserialize_with = "crate::model::null_as_default")]
    pub points: Vec<PointValue>,
    #[serde(rename = "Counters", default, deserialize_with = "crate::model::null_as_default")]
    pub counters: Vec<SampledValue>,
    #[serde(rename = "Samples", default, deserialize_with = "crate::model::null_as_default")]
    pub samples: Vec<SampledValue>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GaugeValue {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Value")]
    pub value: f64,
    #[serde(rename = "Labels", default, deserialize_with = "crate::model::null_as_default")]
    pub labels: HashMap<String, String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PointValue {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Points", default, deserialize_with = "crate::model::null_as_default")]
    pub points: Vec<f64>,
}

/// Aggregated counter or sample
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SampledValue {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Count", default)]
    pub count: i64,
    #[serde(rename = "Sum", default)]
    pub sum: f64,
    #[serde(rename = "Min", default)]
    pub min: f64,
    #[serde(rename = "Max", default)]
    pub max: f64,
    #[serde(rename = "Mean", default)]
    pub mean: f64,
    #[serde(rename = "Stddev", default)]
    pub stddev: f64,
    #[serde(rename = "Labels", default, deserialize_with = "crate::model::null_as_default")]
    pub labels: HashMap<String, String>,
}
