// Service mesh configuration entries, `/v1/config`
//
// Entries are polymorphic on their `Kind` field. Known kinds decode into typed
// structs; anything else is kept as a generic map so newer servers still work.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::codec::duration::text_option;
use crate::model::discovery_chain::{DiscoveryHttpRouteMatch, MeshGatewayConfig};

pub const SERVICE_DEFAULTS: &str = "service-defaults";
pub const PROXY_DEFAULTS: &str = "proxy-defaults";
pub const SERVICE_ROUTER: &str = "service-router";
pub const SERVICE_SPLITTER: &str = "service-splitter";
pub const SERVICE_RESOLVER: &str = "service-resolver";
pub const INGRESS_GATEWAY: &str = "ingress-gateway";
pub const TERMINATING_GATEWAY: &str = "terminating-gateway";
pub const MESH: &str = "mesh";

/// Name every proxy-defaults entry must carry
pub const PROXY_CONFIG_GLOBAL: &str = "global";
/// Name every mesh entry must carry
pub const MESH_CONFIG_MESH: &str = "mesh";

// ============================================================================
// Entry kinds
// ============================================================================

/// `service-defaults`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ServiceConfigEntry {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partition: Option<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub protocol: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub mode: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mesh_gateway: Option<MeshGatewayConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expose: Option<serde_json::Value>,
    #[serde(rename = "ExternalSNI", default, skip_serializing_if = "String::is_empty")]
    pub external_sni: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upstream_config: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub max_inbound_connections: u32,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub local_connect_timeout_ms: u32,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub local_request_timeout_ms: u32,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub meta: HashMap<String, String>,
    #[serde(default)]
    pub create_index: u64,
    #[serde(default)]
    pub modify_index: u64,
}

/// `proxy-defaults`; the name is always `global`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ProxyConfigEntry {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partition: Option<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub mode: String,
    #[serde(default, deserialize_with = "crate::model::null_as_default")]
    pub config: HashMap<String, serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mesh_gateway: Option<MeshGatewayConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expose: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub meta: HashMap<String, String>,
    #[serde(default)]
    pub create_index: u64,
    #[serde(default)]
    pub modify_index: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ServiceRouteMatch {
    #[serde(rename = "HTTP", default, skip_serializing_if = "Option::is_none")]
    pub http: Option<DiscoveryHttpRouteMatch>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ServiceRouteDestination {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub service: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub service_subset: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub prefix_rewrite: String,
    #[serde(default, with = "text_option", skip_serializing_if = "Option::is_none")]
    pub request_timeout: Option<Duration>,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub num_retries: u32,
    #[serde(default)]
    pub retry_on_connect_failure: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub retry_on_status_codes: Vec<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ServiceRoute {
    #[serde(rename = "Match", default, skip_serializing_if = "Option::is_none")]
    pub route_match: Option<ServiceRouteMatch>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<ServiceRouteDestination>,
}

/// `service-router`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ServiceRouterConfigEntry {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partition: Option<String>,
    #[serde(default, deserialize_with = "crate::model::null_as_default")]
    pub routes: Vec<ServiceRoute>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub meta: HashMap<String, String>,
    #[serde(default)]
    pub create_index: u64,
    #[serde(default)]
    pub modify_index: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ServiceSplit {
    pub weight: f32,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub service: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub service_subset: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

/// `service-splitter`; split weights must add up to 100
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ServiceSplitterConfigEntry {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partition: Option<String>,
    #[serde(default, deserialize_with = "crate::model::null_as_default")]
    pub splits: Vec<ServiceSplit>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub meta: HashMap<String, String>,
    #[serde(default)]
    pub create_index: u64,
    #[serde(default)]
    pub modify_index: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ServiceResolverSubset {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub filter: String,
    #[serde(default)]
    pub only_passing: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ServiceResolverRedirect {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub service: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub service_subset: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub datacenter: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ServiceResolverFailover {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub service: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub service_subset: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub datacenters: Vec<String>,
}

/// `service-resolver`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ServiceResolverConfigEntry {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partition: Option<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub default_subset: String,
    #[serde(
        default,
        deserialize_with = "crate::model::null_as_default",
        skip_serializing_if = "HashMap::is_empty"
    )]
    pub subsets: HashMap<String, ServiceResolverSubset>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect: Option<ServiceResolverRedirect>,
    #[serde(
        default,
        deserialize_with = "crate::model::null_as_default",
        skip_serializing_if = "HashMap::is_empty"
    )]
    pub failover: HashMap<String, ServiceResolverFailover>,
    #[serde(default, with = "text_option", skip_serializing_if = "Option::is_none")]
    pub connect_timeout: Option<Duration>,
    #[serde(default, with = "text_option", skip_serializing_if = "Option::is_none")]
    pub request_timeout: Option<Duration>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub meta: HashMap<String, String>,
    #[serde(default)]
    pub create_index: u64,
    #[serde(default)]
    pub modify_index: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GatewayTlsConfig {
    #[serde(default)]
    pub enabled: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct IngressService {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hosts: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct IngressListener {
    pub port: u16,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub protocol: String,
    #[serde(default, deserialize_with = "crate::model::null_as_default")]
    pub services: Vec<IngressService>,
}

/// `ingress-gateway`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct IngressGatewayConfigEntry {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partition: Option<String>,
    #[serde(rename = "TLS", default)]
    pub tls: GatewayTlsConfig,
    #[serde(default, deserialize_with = "crate::model::null_as_default")]
    pub listeners: Vec<IngressListener>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub meta: HashMap<String, String>,
    #[serde(default)]
    pub create_index: u64,
    #[serde(default)]
    pub modify_index: u64,
}

/// External service a terminating gateway proxies to
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LinkedService {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(rename = "CAFile", default, skip_serializing_if = "String::is_empty")]
    pub ca_file: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub cert_file: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub key_file: String,
    #[serde(rename = "SNI", default, skip_serializing_if = "String::is_empty")]
    pub sni: String,
}

/// `terminating-gateway`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TerminatingGatewayConfigEntry {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partition: Option<String>,
    #[serde(default, deserialize_with = "crate::model::null_as_default")]
    pub services: Vec<LinkedService>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub meta: HashMap<String, String>,
    #[serde(default)]
    pub create_index: u64,
    #[serde(default)]
    pub modify_index: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TransparentProxyMeshConfig {
    #[serde(default)]
    pub mesh_destinations_only: bool,
}

/// `mesh`; the name is always `mesh`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MeshConfigEntry {
    #[serde(default = "mesh_name")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partition: Option<String>,
    #[serde(default)]
    pub transparent_proxy: TransparentProxyMeshConfig,
    #[serde(default)]
    pub allow_enabling_permissive_mutual_tls: bool,
    #[serde(rename = "TLS", default, skip_serializing_if = "Option::is_none")]
    pub tls: Option<serde_json::Value>,
    #[serde(rename = "HTTP", default, skip_serializing_if = "Option::is_none")]
    pub http: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub meta: HashMap<String, String>,
    #[serde(default)]
    pub create_index: u64,
    #[serde(default)]
    pub modify_index: u64,
}

fn mesh_name() -> String {
    MESH_CONFIG_MESH.to_string()
}

fn is_zero(v: &u32) -> bool {
    *v == 0
}

/// Entry of a kind without a typed representation
#[derive(Debug, Clone, Default)]
pub struct GenericConfigEntry {
    pub kind: String,
    pub name: String,
    /// Every field except `Kind`, as sent by the server
    pub fields: serde_json::Map<String, serde_json::Value>,
}

impl GenericConfigEntry {
    fn index(&self, field: &str) -> u64 {
        self.fields
            .get(field)
            .and_then(serde_json::Value::as_u64)
            .unwrap_or(0)
    }
}

// ============================================================================
// Polymorphic entry
// ============================================================================

/// A configuration entry of any kind
#[derive(Debug, Clone)]
pub enum ConfigEntry {
    ServiceDefaults(ServiceConfigEntry),
    ProxyDefaults(ProxyConfigEntry),
    ServiceRouter(ServiceRouterConfigEntry),
    ServiceSplitter(ServiceSplitterConfigEntry),
    ServiceResolver(ServiceResolverConfigEntry),
    IngressGateway(IngressGatewayConfigEntry),
    TerminatingGateway(TerminatingGatewayConfigEntry),
    Mesh(MeshConfigEntry),
    Other(GenericConfigEntry),
}

impl ConfigEntry {
    pub fn kind(&self) -> &str {
        match self {
            ConfigEntry::ServiceDefaults(_) => SERVICE_DEFAULTS,
            ConfigEntry::ProxyDefaults(_) => PROXY_DEFAULTS,
            ConfigEntry::ServiceRouter(_) => SERVICE_ROUTER,
            ConfigEntry::ServiceSplitter(_) => SERVICE_SPLITTER,
            ConfigEntry::ServiceResolver(_) => SERVICE_RESOLVER,
            ConfigEntry::IngressGateway(_) => INGRESS_GATEWAY,
            ConfigEntry::TerminatingGateway(_) => TERMINATING_GATEWAY,
            ConfigEntry::Mesh(_) => MESH,
            ConfigEntry::Other(e) => &e.kind,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            ConfigEntry::ServiceDefaults(e) => &e.name,
            ConfigEntry::ProxyDefaults(e) => &e.name,
            ConfigEntry::ServiceRouter(e) => &e.name,
            ConfigEntry::ServiceSplitter(e) => &e.name,
            ConfigEntry::ServiceResolver(e) => &e.name,
            ConfigEntry::IngressGateway(e) => &e.name,
            ConfigEntry::TerminatingGateway(e) => &e.name,
            ConfigEntry::Mesh(e) => &e.name,
            ConfigEntry::Other(e) => &e.name,
        }
    }

    pub fn create_index(&self) -> u64 {
        match self {
            ConfigEntry::ServiceDefaults(e) => e.create_index,
            ConfigEntry::ProxyDefaults(e) => e.create_index,
            ConfigEntry::ServiceRouter(e) => e.create_index,
            ConfigEntry::ServiceSplitter(e) => e.create_index,
            ConfigEntry::ServiceResolver(e) => e.create_index,
            ConfigEntry::IngressGateway(e) => e.create_index,
            ConfigEntry::TerminatingGateway(e) => e.create_index,
            ConfigEntry::Mesh(e) => e.create_index,
            ConfigEntry::Other(e) => e.index("CreateIndex"),
        }
    }

    /// Index compared against by check-and-set writes
    pub fn modify_index(&self) -> u64 {
        match self {
            ConfigEntry::ServiceDefaults(e) => e.modify_index,
            ConfigEntry::ProxyDefaults(e) => e.modify_index,
            ConfigEntry::ServiceRouter(e) => e.modify_index,
            ConfigEntry::ServiceSplitter(e) => e.modify_index,
            ConfigEntry::ServiceResolver(e) => e.modify_index,
            ConfigEntry::IngressGateway(e) => e.modify_index,
            ConfigEntry::TerminatingGateway(e) => e.modify_index,
            ConfigEntry::Mesh(e) => e.modify_index,
            ConfigEntry::Other(e) => e.index("ModifyIndex"),
        }
    }

    fn body(&self) -> serde_json::Result<serde_json::Value> {
        match self {
            ConfigEntry::ServiceDefaults(e) => serde_json::to_value(e),
            ConfigEntry::ProxyDefaults(e) => serde_json::to_value(e),
            ConfigEntry::ServiceRouter(e) => serde_json::to_value(e),
            ConfigEntry::ServiceSplitter(e) => serde_json::to_value(e),
            ConfigEntry::ServiceResolver(e) => serde_json::to_value(e),
            ConfigEntry::IngressGateway(e) => serde_json::to_value(e),
            ConfigEntry::TerminatingGateway(e) => serde_json::to_value(e),
            ConfigEntry::Mesh(e) => serde_json::to_value(e),
            ConfigEntry::Other(e) => {
                let mut fields = e.fields.clone();
                fields.insert("Name".to_string(), e.name.clone().into());
                Ok(serde_json::Value::Object(fields))
            }
        }
    }

    /// Decode an entry from its JSON object, dispatching on `Kind`
    pub fn from_value(value: serde_json::Value) -> serde_json::Result<Self> {
        let invalid = <serde_json::Error as serde::de::Error>::custom;

        let serde_json::Value::Object(mut fields) = value else {
            return Err(invalid("config entry must be a JSON object"));
        };
        let kind = match fields.remove("Kind") {
            Some(serde_json::Value::String(kind)) => kind,
            _ => return Err(invalid("config entry is missing its Kind")),
        };

        let entry = match kind.as_str() {
            SERVICE_DEFAULTS => ConfigEntry::ServiceDefaults(decode(fields)?),
            PROXY_DEFAULTS => ConfigEntry::ProxyDefaults(decode(fields)?),
            SERVICE_ROUTER => ConfigEntry::ServiceRouter(decode(fields)?),
            SERVICE_SPLITTER => ConfigEntry::ServiceSplitter(decode(fields)?),
            SERVICE_RESOLVER => ConfigEntry::ServiceResolver(decode(fields)?),
            INGRESS_GATEWAY => ConfigEntry::IngressGateway(decode(fields)?),
            TERMINATING_GATEWAY => ConfigEntry::TerminatingGateway(decode(fields)?),
            MESH => ConfigEntry::Mesh(decode(fields)?),
            _ => {
                let name = match fields.remove("Name") {
                    Some(serde_json::Value::String(name)) => name,
                    _ => String::new(),
                };
                ConfigEntry::Other(GenericConfigEntry { kind, name, fields })
            }
        };
        Ok(entry)
    }
}

fn decode<T: serde::de::DeserializeOwned>(
    fields: serde_json::Map<String, serde_json::Value>,
) -> serde_json::Result<T> {
    serde_json::from_value(serde_json::Value::Object(fields))
}

impl Serialize for ConfigEntry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut body = self.body().map_err(serde::ser::Error::custom)?;
        if let serde_json::Value::Object(fields) = &mut body {
            fields.insert("Kind".to_string(), self.kind().into());
        }
        body.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ConfigEntry {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        ConfigEntry::from_value(value).map_err(serde::de::Error::custom)
    }
}

macro_rules! impl_from_entry {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for ConfigEntry {
                fn from(entry: $ty) -> Self {
                    ConfigEntry::$variant(entry)
                }
            }
        )*
    };
}

impl_from_entry!(
    ServiceConfigEntry => ServiceDefaults,
    ProxyConfigEntry => ProxyDefaults,
    ServiceRouterConfigEntry => ServiceRouter,
    ServiceSplitterConfigEntry => ServiceSplitter,
    ServiceResolverConfigEntry => ServiceResolver,
    IngressGatewayConfigEntry => IngressGateway,
    TerminatingGatewayConfigEntry => TerminatingGateway,
    MeshConfigEntry => Mesh,
);
