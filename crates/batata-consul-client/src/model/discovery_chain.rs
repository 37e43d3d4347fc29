// Compiled discovery chain models, `/v1/discovery-chain/:service`

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::codec::duration::{text, text_option};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DiscoveryGraphNodeType {
    Router,
    Splitter,
    Resolver,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DiscoveryHttpHeaderMatch {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exact: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suffix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regex: Option<String>,
    #[serde(default)]
    pub present: bool,
    #[serde(default)]
    pub invert: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DiscoveryHttpQueryMatch {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exact: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regex: Option<String>,
    #[serde(default)]
    pub present: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DiscoveryHttpRouteMatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path_exact: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path_prefix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path_regex: Option<String>,
    #[serde(default, deserialize_with = "crate::model::null_as_default")]
    pub header: Vec<DiscoveryHttpHeaderMatch>,
    #[serde(default, deserialize_with = "crate::model::null_as_default")]
    pub query_param: Vec<DiscoveryHttpQueryMatch>,
    #[serde(default, deserialize_with = "crate::model::null_as_default")]
    pub methods: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DiscoveryRouteMatch {
    #[serde(rename = "HTTP", default)]
    pub http: Option<DiscoveryHttpRouteMatch>,
}

/// Route definition as written in the service-router entry
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DiscoveryRouteDefinition {
    #[serde(rename = "Match", default)]
    pub route_match: Option<DiscoveryRouteMatch>,
    #[serde(default)]
    pub destination: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DiscoveryRoute {
    #[serde(default)]
    pub definition: Option<DiscoveryRouteDefinition>,
    pub next_node: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DiscoverySplitDefinition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_subset: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partition: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DiscoverySplit {
    #[serde(default)]
    pub definition: Option<DiscoverySplitDefinition>,
    pub weight: f32,
    pub next_node: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DiscoveryFailover {
    #[serde(default, deserialize_with = "crate::model::null_as_default")]
    pub targets: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DiscoveryResolver {
    #[serde(default)]
    pub default: bool,
    #[serde(default, with = "text")]
    pub connect_timeout: Duration,
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failover: Option<DiscoveryFailover>,
}

/// Router, splitter or resolver step of a compiled chain
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DiscoveryGraphNode {
    #[serde(rename = "Type")]
    pub node_type: DiscoveryGraphNodeType,
    pub name: String,
    #[serde(default, deserialize_with = "crate::model::null_as_default")]
    pub routes: Vec<DiscoveryRoute>,
    #[serde(default, deserialize_with = "crate::model::null_as_default")]
    pub splits: Vec<DiscoverySplit>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolver: Option<DiscoveryResolver>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MeshGatewayConfig {
    /// `none`, `local` or `remote`; empty means the default
    #[serde(default)]
    pub mode: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DiscoveryTargetSubset {
    #[serde(default)]
    pub filter: String,
    #[serde(default)]
    pub only_passing: bool,
}

/// Concrete upstream a chain resolves to
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DiscoveryTarget {
    #[serde(rename = "ID")]
    pub id: String,
    pub service: String,
    #[serde(default)]
    pub service_subset: String,
    #[serde(default)]
    pub namespace: String,
    #[serde(default)]
    pub partition: String,
    #[serde(default)]
    pub datacenter: String,
    #[serde(default)]
    pub mesh_gateway: MeshGatewayConfig,
    #[serde(default)]
    pub subset: DiscoveryTargetSubset,
    #[serde(default, with = "text")]
    pub connect_timeout: Duration,
    #[serde(rename = "SNI", default)]
    pub sni: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CompiledDiscoveryChain {
    pub service_name: String,
    #[serde(default)]
    pub namespace: String,
    #[serde(default)]
    pub datacenter: String,
    #[serde(default)]
    pub customization_hash: String,
    #[serde(default)]
    pub default: bool,
    #[serde(default)]
    pub protocol: String,
    #[serde(default)]
    pub start_node: String,
    #[serde(default, deserialize_with = "crate::model::null_as_default")]
    pub nodes: HashMap<String, DiscoveryGraphNode>,
    #[serde(default, deserialize_with = "crate::model::null_as_default")]
    pub targets: HashMap<String, DiscoveryTarget>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DiscoveryChainResponse {
    pub chain: CompiledDiscoveryChain,
}

/// Overrides applied when compiling the chain, sent as a POST body
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DiscoveryChainOptions {
    /// Datacenter to compile the chain for, sent as `compile-dc`
    #[serde(skip)]
    pub evaluate_in_datacenter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub override_mesh_gateway: Option<MeshGatewayConfig>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub override_protocol: String,
    #[serde(default, with = "text_option", skip_serializing_if = "Option::is_none")]
    pub override_connect_timeout: Option<Duration>,
}

impl DiscoveryChainOptions {
    pub(crate) fn requires_post(&self) -> bool {
        self.override_mesh_gateway.is_some()
            || !self.override_protocol.is_empty()
            || self.override_connect_timeout.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_response_deserialize() {
        let json = r#"{"Chain": {
            "ServiceName": "web", "Namespace": "default", "Datacenter": "dc1",
            "Protocol": "tcp", "StartNode": "resolver:web.default.default.dc1",
            "Nodes": {
                "resolver:web.default.default.dc1": {
                    "Type": "resolver", "Name": "web.default.default.dc1",
                    "Resolver": {"Default": true, "ConnectTimeout": "5s", "Target": "web.default.default.dc1"}
                }
            },
            "Targets": {
                "web.default.default.dc1": {
                    "ID": "web.default.default.dc1", "Service": "web", "Datacenter": "dc1",
                    "ConnectTimeout": "5s", "SNI": "web.default.dc1.internal.example.consul",
                    "Name": "web.default.dc1.internal.example.consul"
                }
            }
        }}"#;
        let resp: DiscoveryChainResponse = serde_json::from_str(json).unwrap();
        let chain = resp.chain;
        let start = &chain.nodes[&chain.start_node];
        assert_eq!(start.node_type, DiscoveryGraphNodeType::Resolver);
        let resolver = start.resolver.as_ref().unwrap();
        assert_eq!(resolver.connect_timeout, Duration::from_secs(5));
        assert!(start.routes.is_empty());
        assert_eq!(chain.targets[&resolver.target].service, "web");
    }

    #[test]
    fn test_options_body() {
        let opts = DiscoveryChainOptions {
            evaluate_in_datacenter: Some("dc2".to_string()),
            override_protocol: "grpc".to_string(),
            override_connect_timeout: Some(Duration::from_secs(2)),
            ..Default::default()
        };
        assert!(opts.requires_post());
        let json = serde_json::to_value(&opts).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"OverrideProtocol": "grpc", "OverrideConnectTimeout": "2s"})
        );
        assert!(!DiscoveryChainOptions::default().requires_post());
    }
}
