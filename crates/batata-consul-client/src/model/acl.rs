// ACL models: tokens, policies, roles, auth methods and binding rules

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::codec::duration::text_option;

/// Anonymous token accessor id, present in every cluster with ACLs enabled
pub const ANONYMOUS_TOKEN_ID: &str = "00000000-0000-0000-0000-000000000002";
/// Policy granting every privilege, created on bootstrap
pub const GLOBAL_MANAGEMENT_POLICY_ID: &str = "00000000-0000-0000-0000-000000000001";

/// Reference to a policy or role by id or by name
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AclLink {
    #[serde(rename = "ID", default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(rename = "Name", default, skip_serializing_if = "String::is_empty")]
    pub name: String,
}

impl AclLink {
    pub fn by_id(id: &str) -> Self {
        Self {
            id: id.to_string(),
            name: String::new(),
        }
    }

    pub fn by_name(name: &str) -> Self {
        Self {
            id: String::new(),
            name: name.to_string(),
        }
    }
}

pub type PolicyLink = AclLink;
pub type RoleLink = AclLink;

/// Grants the privileges of a service (and its sidecar) to a token or role
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ServiceIdentity {
    pub service_name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub datacenters: Vec<String>,
}

/// Grants the privileges of a node agent to a token or role
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct NodeIdentity {
    pub node_name: String,
    pub datacenter: String,
}

/// ACL token.
///
/// The same type is used as the body of create/update calls; fields the
/// server assigns are skipped when empty.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AclToken {
    #[serde(rename = "AccessorID", default, skip_serializing_if = "String::is_empty")]
    pub accessor_id: String,
    #[serde(rename = "SecretID", default, skip_serializing_if = "String::is_empty")]
    pub secret_id: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, deserialize_with = "crate::model::null_as_default")]
    pub policies: Vec<PolicyLink>,
    #[serde(default, deserialize_with = "crate::model::null_as_default")]
    pub roles: Vec<RoleLink>,
    #[serde(
        default,
        deserialize_with = "crate::model::null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub service_identities: Vec<ServiceIdentity>,
    #[serde(
        default,
        deserialize_with = "crate::model::null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub node_identities: Vec<NodeIdentity>,
    #[serde(default)]
    pub local: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub auth_method: String,
    #[serde(
        rename = "ExpirationTTL",
        default,
        with = "text_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub expiration_ttl: Option<Duration>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default)]
    pub create_index: u64,
    #[serde(default)]
    pub modify_index: u64,
}

impl AclToken {
    pub fn new(description: &str) -> Self {
        Self {
            description: description.to_string(),
            ..Default::default()
        }
    }

    pub fn with_policy(mut self, link: PolicyLink) -> Self {
        self.policies.push(link);
        self
    }

    pub fn with_role(mut self, link: RoleLink) -> Self {
        self.roles.push(link);
        self
    }

    pub fn with_service_identity(mut self, service_name: &str) -> Self {
        self.service_identities.push(ServiceIdentity {
            service_name: service_name.to_string(),
            datacenters: Vec::new(),
        });
        self
    }

    pub fn with_expiration_ttl(mut self, ttl: Duration) -> Self {
        self.expiration_ttl = Some(ttl);
        self
    }

    pub fn local(mut self) -> Self {
        self.local = true;
        self
    }
}

/// Filters for `GET /v1/acl/tokens`
#[derive(Clone, Debug, Default)]
pub struct AclTokenFilter {
    pub policy: Option<String>,
    pub role: Option<String>,
    pub auth_method: Option<String>,
    pub service_name: Option<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AclPolicy {
    #[serde(rename = "ID", default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// HCL or JSON rule document; list responses leave it empty
    #[serde(default)]
    pub rules: String,
    #[serde(
        default,
        deserialize_with = "crate::model::null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub datacenters: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default)]
    pub create_index: u64,
    #[serde(default)]
    pub modify_index: u64,
}

impl AclPolicy {
    pub fn new(name: &str, rules: &str) -> Self {
        Self {
            name: name.to_string(),
            rules: rules.to_string(),
            ..Default::default()
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AclRole {
    #[serde(rename = "ID", default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, deserialize_with = "crate::model::null_as_default")]
    pub policies: Vec<PolicyLink>,
    #[serde(
        default,
        deserialize_with = "crate::model::null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub service_identities: Vec<ServiceIdentity>,
    #[serde(
        default,
        deserialize_with = "crate::model::null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub node_identities: Vec<NodeIdentity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default)]
    pub create_index: u64,
    #[serde(default)]
    pub modify_index: u64,
}

impl AclRole {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn with_policy(mut self, link: PolicyLink) -> Self {
        self.policies.push(link);
        self
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AclAuthMethod {
    pub name: String,
    /// `kubernetes`, `jwt`, `oidc`, ...
    #[serde(rename = "Type")]
    pub method_type: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub display_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(
        rename = "MaxTokenTTL",
        default,
        with = "text_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub max_token_ttl: Option<Duration>,
    /// `local` or `global`
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub token_locality: String,
    #[serde(default, deserialize_with = "crate::model::null_as_default")]
    pub config: HashMap<String, serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default)]
    pub create_index: u64,
    #[serde(default)]
    pub modify_index: u64,
}

/// What a binding rule binds a logged-in identity to
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BindingRuleBindType {
    #[default]
    Service,
    Node,
    Role,
    Policy,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AclBindingRule {
    #[serde(rename = "ID", default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default)]
    pub description: String,
    pub auth_method: String,
    #[serde(default)]
    pub selector: String,
    pub bind_type: BindingRuleBindType,
    pub bind_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default)]
    pub create_index: u64,
    #[serde(default)]
    pub modify_index: u64,
}

/// Status of ACL replication in a secondary datacenter
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AclReplicationStatus {
    pub enabled: bool,
    pub running: bool,
    #[serde(default)]
    pub source_datacenter: String,
    #[serde(default)]
    pub replication_type: String,
    #[serde(default)]
    pub replicated_index: u64,
    #[serde(default)]
    pub replicated_role_index: u64,
    #[serde(default)]
    pub replicated_token_index: u64,
    #[serde(default)]
    pub last_success: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_error: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_error_message: String,
}

/// Body of `POST /v1/acl/login`
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AclLoginParams {
    pub auth_method: String,
    pub bearer_token: String,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub meta: HashMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_deserialize() {
        let json = r#"{
            "AccessorID": "6a1253d2-1785-24fd-91c2-f8e78c745511",
            "SecretID": "45a3bd52-07c7-47a4-52fd-0745e0cfe967",
            "Description": "Agent token for 'node1'",
            "Policies": [{"ID": "165d4317-e379-f732-ce70-86278c4558f7", "Name": "node1-write"}],
            "Roles": null,
            "Local": false,
            "ExpirationTTL": "1h0m0s",
            "ExpirationTime": "2018-10-24T13:24:12.345Z",
            "CreateTime": "2018-10-24T12:50:29.74574-04:00",
            "Hash": "UuiRkOQPRCvoRZHRtUxxbrmwZ5crYrOdZ0Z1FTFbTbA=",
            "CreateIndex": 59,
            "ModifyIndex": 59
        }"#;
        let token: AclToken = serde_json::from_str(json).unwrap();
        assert_eq!(token.accessor_id, "6a1253d2-1785-24fd-91c2-f8e78c745511");
        assert_eq!(token.policies[0].name, "node1-write");
        assert!(token.roles.is_empty());
        assert_eq!(token.expiration_ttl, Some(Duration::from_secs(3600)));
        let created = token.create_time.unwrap();
        assert_eq!(created.to_rfc3339(), "2018-10-24T16:50:29.745740+00:00");
    }

    #[test]
    fn test_new_token_body_omits_server_fields() {
        let token = AclToken::new("ci")
            .with_policy(AclLink::by_name("deploy"))
            .with_expiration_ttl(Duration::from_secs(600));
        let json = serde_json::to_value(&token).unwrap();
        assert!(json.get("AccessorID").is_none());
        assert!(json.get("SecretID").is_none());
        assert!(json.get("CreateTime").is_none());
        assert_eq!(json["Policies"], serde_json::json!([{"Name": "deploy"}]));
        assert_eq!(json["ExpirationTTL"], "10m0s");
    }

    #[test]
    fn test_binding_rule_bind_type() {
        let rule: AclBindingRule = serde_json::from_str(
            r#"{"ID":"r1","AuthMethod":"minikube","Selector":"","BindType":"role","BindName":"dev"}"#,
        )
        .unwrap();
        assert_eq!(rule.bind_type, BindingRuleBindType::Role);
    }
}
