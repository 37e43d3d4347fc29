// Namespace models

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::acl::AclLink;

/// Default policies and roles applied to tokens in a namespace
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct NamespaceAclConfig {
    #[serde(default, deserialize_with = "crate::model::null_as_default")]
    pub policy_defaults: Vec<AclLink>,
    #[serde(default, deserialize_with = "crate::model::null_as_default")]
    pub role_defaults: Vec<AclLink>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Namespace {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "ACLs", default, skip_serializing_if = "Option::is_none")]
    pub acls: Option<NamespaceAclConfig>,
    #[serde(
        default,
        deserialize_with = "crate::model::null_as_default",
        skip_serializing_if = "HashMap::is_empty"
    )]
    pub meta: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partition: Option<String>,
    /// Set while the namespace is being deleted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing)]
    pub create_index: u64,
    #[serde(default, skip_serializing)]
    pub modify_index: u64,
}

impl Namespace {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }
}
