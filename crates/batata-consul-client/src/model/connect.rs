// Connect (service mesh) models: CA roots, CA configuration, leaf certs and intentions

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// CA Models
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CARoot {
    #[serde(rename = "ID")]
    pub id: String,
    pub name: String,
    #[serde(rename = "RootCert")]
    pub root_cert_pem: String,
    #[serde(default, deserialize_with = "crate::model::null_as_default")]
    pub intermediate_certs: Vec<String>,
    pub active: bool,
    #[serde(default)]
    pub not_before: Option<DateTime<Utc>>,
    #[serde(default)]
    pub not_after: Option<DateTime<Utc>>,
    #[serde(default)]
    pub create_index: u64,
    #[serde(default)]
    pub modify_index: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CARootList {
    #[serde(rename = "ActiveRootID", default)]
    pub active_root_id: String,
    #[serde(default)]
    pub trust_domain: String,
    #[serde(default, deserialize_with = "crate::model::null_as_default")]
    pub roots: Vec<CARoot>,
}

impl CARootList {
    pub fn active_root(&self) -> Option<&CARoot> {
        self.roots.iter().find(|r| r.id == self.active_root_id)
    }
}

/// Provider configuration of the Connect CA
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CAConfig {
    /// `consul`, `vault`, `aws-pca`
    pub provider: String,
    #[serde(default, deserialize_with = "crate::model::null_as_default")]
    pub config: HashMap<String, serde_json::Value>,
    #[serde(
        default,
        deserialize_with = "crate::model::null_as_default",
        skip_serializing_if = "HashMap::is_empty"
    )]
    pub state: HashMap<String, String>,
    #[serde(default)]
    pub force_without_cross_signing: bool,
    #[serde(default)]
    pub create_index: u64,
    #[serde(default)]
    pub modify_index: u64,
}

/// Leaf certificate issued to a service, `/v1/agent/connect/ca/leaf/:service`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LeafCert {
    pub serial_number: String,
    #[serde(rename = "CertPEM")]
    pub cert_pem: String,
    #[serde(rename = "PrivateKeyPEM")]
    pub private_key_pem: String,
    pub service: String,
    #[serde(rename = "ServiceURI")]
    pub service_uri: String,
    #[serde(default)]
    pub valid_after: Option<DateTime<Utc>>,
    #[serde(default)]
    pub valid_before: Option<DateTime<Utc>>,
    #[serde(default)]
    pub create_index: u64,
    #[serde(default)]
    pub modify_index: u64,
}

// ============================================================================
// Intention Models
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntentionAction {
    #[default]
    Allow,
    Deny,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct IntentionHttpPermission {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path_exact: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path_prefix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path_regex: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub methods: Vec<String>,
}

/// L7 permission of an intention
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct IntentionPermission {
    pub action: IntentionAction,
    #[serde(rename = "HTTP", default, skip_serializing_if = "Option::is_none")]
    pub http: Option<IntentionHttpPermission>,
}

/// Authorization rule between a source and a destination service
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Intention {
    #[serde(rename = "ID", default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "SourceNS", default, skip_serializing_if = "String::is_empty")]
    pub source_ns: String,
    pub source_name: String,
    #[serde(rename = "DestinationNS", default, skip_serializing_if = "String::is_empty")]
    pub destination_ns: String,
    pub destination_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub source_type: String,
    /// Unset for L7 intentions, which carry `permissions` instead
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<IntentionAction>,
    #[serde(
        default,
        deserialize_with = "crate::model::null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub permissions: Vec<IntentionPermission>,
    #[serde(
        default,
        deserialize_with = "crate::model::null_as_default",
        skip_serializing_if = "HashMap::is_empty"
    )]
    pub meta: HashMap<String, String>,
    #[serde(default, skip_serializing)]
    pub precedence: i32,
    #[serde(default, skip_serializing)]
    pub create_index: u64,
    #[serde(default, skip_serializing)]
    pub modify_index: u64,
}

impl Intention {
    pub fn new(source: &str, destination: &str, action: IntentionAction) -> Self {
        Self {
            source_name: source.to_string(),
            destination_name: destination.to_string(),
            action: Some(action),
            ..Default::default()
        }
    }
}

/// Which side of an intention `intention_match` looks at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntentionMatchType {
    Source,
    Destination,
}

impl IntentionMatchType {
    pub fn as_str(&self) -> &'static str {
        match self {
            IntentionMatchType::Source => "source",
            IntentionMatchType::Destination => "destination",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct IntentionCheckResponse {
    pub allowed: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ca_roots_active_root() {
        let json = r#"{
            "ActiveRootID": "c7:bd:55",
            "TrustDomain": "7f42f496-fbc7-8692-05ed-334aa5340c1e.consul",
            "Roots": [{
                "ID": "c7:bd:55", "Name": "Consul CA Root Cert",
                "RootCert": "-----BEGIN CERTIFICATE-----", "IntermediateCerts": null,
                "Active": true, "CreateIndex": 8, "ModifyIndex": 8
            }]
        }"#;
        let roots: CARootList = serde_json::from_str(json).unwrap();
        let active = roots.active_root().unwrap();
        assert_eq!(active.name, "Consul CA Root Cert");
        assert!(active.intermediate_certs.is_empty());
    }

    #[test]
    fn test_intention_upsert_body() {
        let intention = Intention::new("web", "db", IntentionAction::Deny);
        let json = serde_json::to_value(&intention).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "Description": "", "SourceName": "web",
                "DestinationName": "db", "Action": "deny"
            })
        );
    }
}
