// Prepared query models, `/v1/query`

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::model::health::ServiceEntry;

/// Where to look when no healthy instance is found locally
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct QueryFailoverOptions {
    /// Try the N nearest remote datacenters by RTT
    #[serde(default)]
    pub nearest_n: i32,
    #[serde(default, deserialize_with = "crate::model::null_as_default")]
    pub datacenters: Vec<String>,
    #[serde(
        default,
        deserialize_with = "crate::model::null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub targets: Vec<QueryFailoverTarget>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct QueryFailoverTarget {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub peer: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub datacenter: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub partition: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub namespace: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ServiceQuery {
    pub service: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub namespace: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub partition: String,
    /// Node to sort by distance from, `_agent` for the serving agent
    #[serde(default)]
    pub near: String,
    #[serde(default)]
    pub failover: QueryFailoverOptions,
    #[serde(rename = "IgnoreCheckIDs", default, deserialize_with = "crate::model::null_as_default")]
    pub ignore_check_ids: Vec<String>,
    #[serde(default)]
    pub only_passing: bool,
    /// Required tags; a leading `!` excludes the tag
    #[serde(default, deserialize_with = "crate::model::null_as_default")]
    pub tags: Vec<String>,
    #[serde(default, deserialize_with = "crate::model::null_as_default")]
    pub node_meta: HashMap<String, String>,
    #[serde(default, deserialize_with = "crate::model::null_as_default")]
    pub service_meta: HashMap<String, String>,
    #[serde(default)]
    pub connect: bool,
}

impl ServiceQuery {
    pub fn new(service: &str) -> Self {
        Self {
            service: service.to_string(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct QueryDnsOptions {
    /// TTL as duration text, e.g. `10s`
    #[serde(rename = "TTL", default)]
    pub ttl: String,
}

/// Turns a query into a template matched by name prefix or regexp
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct QueryTemplate {
    /// `name_prefix_match`
    #[serde(rename = "Type", default)]
    pub template_type: String,
    #[serde(default)]
    pub regexp: String,
    #[serde(default)]
    pub remove_empty_tags: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PreparedQueryDefinition {
    #[serde(rename = "ID", default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// Session whose invalidation deletes the query
    #[serde(default)]
    pub session: String,
    #[serde(default)]
    pub token: String,
    pub service: ServiceQuery,
    #[serde(rename = "DNS", default)]
    pub dns: QueryDnsOptions,
    #[serde(default)]
    pub template: QueryTemplate,
    #[serde(default, skip_serializing)]
    pub create_index: u64,
    #[serde(default, skip_serializing)]
    pub modify_index: u64,
}

impl PreparedQueryDefinition {
    pub fn new(name: &str, service: ServiceQuery) -> Self {
        Self {
            name: name.to_string(),
            service,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct PreparedQueryCreated {
    #[serde(rename = "ID")]
    pub id: String,
}

/// Result of running a prepared query
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PreparedQueryExecuteResponse {
    pub service: String,
    #[serde(default)]
    pub namespace: String,
    #[serde(default, deserialize_with = "crate::model::null_as_default")]
    pub nodes: Vec<ServiceEntry>,
    #[serde(rename = "DNS", default)]
    pub dns: QueryDnsOptions,
    /// Datacenter that served the query after any failover
    #[serde(default)]
    pub datacenter: String,
    /// Number of remote datacenters tried
    #[serde(default)]
    pub failovers: i32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PreparedQueryExplainResponse {
    pub query: PreparedQueryDefinition,
}
