// Catalog API models

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::model::agent::{AgentService, AgentWeights, ServiceAddress};
use crate::model::health::HealthCheck;

/// Catalog node
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Node {
    #[serde(rename = "ID", default)]
    pub id: String,
    #[serde(rename = "Node")]
    pub node: String,
    #[serde(rename = "Address", default)]
    pub address: String,
    #[serde(rename = "Datacenter", default)]
    pub datacenter: String,
    #[serde(
        rename = "TaggedAddresses",
        default,
        deserialize_with = "crate::model::null_as_default"
    )]
    pub tagged_addresses: HashMap<String, String>,
    #[serde(rename = "Meta", default, deserialize_with = "crate::model::null_as_default")]
    pub meta: HashMap<String, String>,
    #[serde(rename = "Partition", default, skip_serializing_if = "Option::is_none")]
    pub partition: Option<String>,
    #[serde(rename = "CreateIndex", default)]
    pub create_index: u64,
    #[serde(rename = "ModifyIndex", default)]
    pub modify_index: u64,
}

/// One instance of a service, `/v1/catalog/service/:service`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogService {
    #[serde(rename = "ID", default)]
    pub id: String,
    #[serde(rename = "Node")]
    pub node: String,
    #[serde(rename = "Address", default)]
    pub address: String,
    #[serde(rename = "Datacenter", default)]
    pub datacenter: String,
    #[serde(
        rename = "TaggedAddresses",
        default,
        deserialize_with = "crate::model::null_as_default"
    )]
    pub tagged_addresses: HashMap<String, String>,
    #[serde(rename = "NodeMeta", default, deserialize_with = "crate::model::null_as_default")]
    pub node_meta: HashMap<String, String>,
    #[serde(rename = "ServiceID")]
    pub service_id: String,
    #[serde(rename = "ServiceName")]
    pub service_name: String,
    #[serde(rename = "ServiceAddress", default)]
    pub service_address: String,
    #[serde(
        rename = "ServiceTaggedAddresses",
        default,
        deserialize_with = "crate::model::null_as_default"
    )]
    pub service_tagged_addresses: HashMap<String, ServiceAddress>,
    #[serde(rename = "ServiceTags", default, deserialize_with = "crate::model::null_as_default")]
    pub service_tags: Vec<String>,
    #[serde(rename = "ServiceMeta", default, deserialize_with = "crate::model::null_as_default")]
    pub service_meta: HashMap<String, String>,
    #[serde(rename = "ServicePort", default)]
    pub service_port: u16,
    #[serde(rename = "ServiceWeights", default)]
    pub service_weights: AgentWeights,
    #[serde(rename = "ServiceEnableTagOverride", default)]
    pub service_enable_tag_override: bool,
    #[serde(rename = "ServiceKind", default, skip_serializing_if = "String::is_empty")]
    pub service_kind: String,
    #[serde(rename = "ServiceProxy", default, skip_serializing_if = "Option::is_none")]
    pub service_proxy: Option<serde_json::Value>,
    #[serde(rename = "Namespace", default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(rename = "CreateIndex", default)]
    pub create_index: u64,
    #[serde(rename = "ModifyIndex", default)]
    pub modify_index: u64,
}

impl CatalogService {
    /// Address to dial: the service address, or the node address when unset
    pub fn effective_address(&self) -> &str {
        if self.service_address.is_empty() {
            &self.address
        } else {
            &self.service_address
        }
    }
}

/// A node with every service registered on it, `/v1/catalog/node/:node`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogNode {
    #[serde(rename = "Node", default)]
    pub node: Option<Node>,
    #[serde(rename = "Services", default, deserialize_with = "crate::model::null_as_default")]
    pub services: HashMap<String, AgentService>,
}

/// Body of `PUT /v1/catalog/register`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogRegistration {
    #[serde(rename = "ID", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "Node")]
    pub node: String,
    #[serde(rename = "Address")]
    pub address: String,
    #[serde(rename = "TaggedAddresses", default, skip_serializing_if = "HashMap::is_empty")]
    pub tagged_addresses: HashMap<String, String>,
    #[serde(rename = "NodeMeta", default, skip_serializing_if = "HashMap::is_empty")]
    pub node_meta: HashMap<String, String>,
    #[serde(rename = "Datacenter", default, skip_serializing_if = "Option::is_none")]
    pub datacenter: Option<String>,
    #[serde(rename = "Service", default, skip_serializing_if = "Option::is_none")]
    pub service: Option<AgentService>,
    #[serde(rename = "Check", default, skip_serializing_if = "Option::is_none")]
    pub check: Option<HealthCheck>,
    #[serde(rename = "Checks", default, skip_serializing_if = "Vec::is_empty")]
    pub checks: Vec<HealthCheck>,
    #[serde(rename = "SkipNodeUpdate", default)]
    pub skip_node_update: bool,
    #[serde(rename = "Partition", default, skip_serializing_if = "Option::is_none")]
    pub partition: Option<String>,
}

/// Body of `PUT /v1/catalog/deregister`.
///
/// With only `node` set the whole node is removed; `service_id` or `check_id`
/// narrow the removal.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogDeregistration {
    #[serde(rename = "Node")]
    pub node: String,
    #[serde(rename = "Address", default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(rename = "Datacenter", default, skip_serializing_if = "Option::is_none")]
    pub datacenter: Option<String>,
    #[serde(rename = "ServiceID", default, skip_serializing_if = "Option::is_none")]
    pub service_id: Option<String>,
    #[serde(rename = "CheckID", default, skip_serializing_if = "Option::is_none")]
    pub check_id: Option<String>,
    #[serde(rename = "Namespace", default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(rename = "Partition", default, skip_serializing_if = "Option::is_none")]
    pub partition: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompoundServiceName {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Namespace", default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(rename = "Partition", default, skip_serializing_if = "Option::is_none")]
    pub partition: Option<String>,
}

/// Service linked to an ingress or terminating gateway
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GatewayService {
    #[serde(rename = "Gateway")]
    pub gateway: CompoundServiceName,
    #[serde(rename = "Service")]
    pub service: CompoundServiceName,
    #[serde(rename = "GatewayKind", default)]
    pub gateway_kind: String,
    #[serde(rename = "Port", default)]
    pub port: u16,
    #[serde(rename = "Protocol", default)]
    pub protocol: String,
    #[serde(rename = "Hosts", default, deserialize_with = "crate::model::null_as_default")]
    pub hosts: Vec<String>,
    #[serde(rename = "CAFile", default)]
    pub ca_file: String,
    #[serde(rename = "CertFile", default)]
    pub cert_file: String,
    #[serde(rename = "KeyFile", default)]
    pub key_file: String,
    #[serde(rename = "SNI", default)]
    pub sni: String,
    #[serde(rename = "FromWildcard", default)]
    pub from_wildcard: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_service_effective_address() {
        let json = r#"[{
            "ID": "40e4a748", "Node": "foobar", "Address": "192.168.10.10",
            "Datacenter": "dc1", "TaggedAddresses": null, "NodeMeta": {"somekey": "somevalue"},
            "ServiceID": "32a2a47f7992:nodea:5000", "ServiceName": "foobar",
            "ServiceAddress": "", "ServiceTags": ["tacos"], "ServicePort": 5000,
            "CreateIndex": 51, "ModifyIndex": 51
        }]"#;
        let services: Vec<CatalogService> = serde_json::from_str(json).unwrap();
        assert_eq!(services.len(), 1);
        assert_eq!(services[0].effective_address(), "192.168.10.10");
        assert_eq!(services[0].service_port, 5000);
        assert_eq!(services[0].service_weights.passing, 1);
    }

    #[test]
    fn test_catalog_node_without_node() {
        let node: CatalogNode = serde_json::from_str(r#"{"Node":null,"Services":null}"#).unwrap();
        assert!(node.node.is_none());
        assert!(node.services.is_empty());
    }

    #[test]
    fn test_deregistration_skips_unset_fields() {
        let dereg = CatalogDeregistration {
            node: "foobar".to_string(),
            service_id: Some("redis1".to_string()),
            ..Default::default()
        };
        let json = serde_json::to_value(&dereg).unwrap();
        assert_eq!(json, serde_json::json!({"Node": "foobar", "ServiceID": "redis1"}));
    }
}
