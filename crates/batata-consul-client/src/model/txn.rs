// Transaction (`PUT /v1/txn`) operations and response
//
// A transaction is a list of operations, each tagged by the kind of object it
// touches. The server applies all of them atomically or none of them.

use serde::{Deserialize, Serialize};

use crate::model::agent::AgentService;
use crate::model::catalog::Node;
use crate::model::health::HealthCheck;
use crate::model::kv::KVPair;

/// Upper bound the servers enforce on operations per transaction
pub const MAX_TXN_OPS: usize = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum KvOp {
    Set,
    Delete,
    DeleteCas,
    DeleteTree,
    Cas,
    Lock,
    Unlock,
    Get,
    GetTree,
    CheckSession,
    CheckIndex,
    CheckNotExists,
}

/// Verb shared by node, service and check operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CatalogOp {
    Set,
    Cas,
    Get,
    Delete,
    DeleteCas,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KvTxnOp {
    #[serde(rename = "Verb")]
    pub verb: KvOp,
    #[serde(rename = "Key")]
    pub key: String,
    #[serde(
        rename = "Value",
        default,
        with = "crate::codec::base64_payload",
        skip_serializing_if = "Option::is_none"
    )]
    pub value: Option<Vec<u8>>,
    #[serde(rename = "Flags", default, skip_serializing_if = "is_zero")]
    pub flags: u64,
    #[serde(rename = "Index", default, skip_serializing_if = "is_zero")]
    pub index: u64,
    #[serde(rename = "Session", default, skip_serializing_if = "Option::is_none")]
    pub session: Option<String>,
    #[serde(rename = "Namespace", default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

fn is_zero(v: &u64) -> bool {
    *v == 0
}

impl KvTxnOp {
    fn new(verb: KvOp, key: &str) -> Self {
        Self {
            verb,
            key: key.to_string(),
            value: None,
            flags: 0,
            index: 0,
            session: None,
            namespace: None,
        }
    }

    pub fn set(key: &str, value: impl Into<Vec<u8>>) -> Self {
        Self {
            value: Some(value.into()),
            ..Self::new(KvOp::Set, key)
        }
    }

    pub fn cas(key: &str, value: impl Into<Vec<u8>>, index: u64) -> Self {
        Self {
            value: Some(value.into()),
            index,
            ..Self::new(KvOp::Cas, key)
        }
    }

    pub fn get(key: &str) -> Self {
        Self::new(KvOp::Get, key)
    }

    pub fn get_tree(prefix: &str) -> Self {
        Self::new(KvOp::GetTree, prefix)
    }

    pub fn delete(key: &str) -> Self {
        Self::new(KvOp::Delete, key)
    }

    pub fn delete_cas(key: &str, index: u64) -> Self {
        Self {
            index,
            ..Self::new(KvOp::DeleteCas, key)
        }
    }

    pub fn delete_tree(prefix: &str) -> Self {
        Self::new(KvOp::DeleteTree, prefix)
    }

    pub fn lock(key: &str, value: impl Into<Vec<u8>>, session: &str) -> Self {
        Self {
            value: Some(value.into()),
            session: Some(session.to_string()),
            ..Self::new(KvOp::Lock, key)
        }
    }

    pub fn unlock(key: &str, session: &str) -> Self {
        Self {
            session: Some(session.to_string()),
            ..Self::new(KvOp::Unlock, key)
        }
    }

    pub fn check_index(key: &str, index: u64) -> Self {
        Self {
            index,
            ..Self::new(KvOp::CheckIndex, key)
        }
    }

    pub fn check_session(key: &str, session: &str) -> Self {
        Self {
            session: Some(session.to_string()),
            ..Self::new(KvOp::CheckSession, key)
        }
    }

    pub fn check_not_exists(key: &str) -> Self {
        Self::new(KvOp::CheckNotExists, key)
    }

    pub fn with_flags(mut self, flags: u64) -> Self {
        self.flags = flags;
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeTxnOp {
    #[serde(rename = "Verb")]
    pub verb: CatalogOp,
    #[serde(rename = "Node")]
    pub node: Node,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceTxnOp {
    #[serde(rename = "Verb")]
    pub verb: CatalogOp,
    #[serde(rename = "Node")]
    pub node: String,
    #[serde(rename = "Service")]
    pub service: AgentService,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckTxnOp {
    #[serde(rename = "Verb")]
    pub verb: CatalogOp,
    #[serde(rename = "Check")]
    pub check: HealthCheck,
}

/// One operation of a transaction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TxnOp {
    #[serde(rename = "KV")]
    Kv(KvTxnOp),
    Node(NodeTxnOp),
    Service(ServiceTxnOp),
    Check(CheckTxnOp),
}

impl From<KvTxnOp> for TxnOp {
    fn from(op: KvTxnOp) -> Self {
        TxnOp::Kv(op)
    }
}

impl From<NodeTxnOp> for TxnOp {
    fn from(op: NodeTxnOp) -> Self {
        TxnOp::Node(op)
    }
}

impl From<ServiceTxnOp> for TxnOp {
    fn from(op: ServiceTxnOp) -> Self {
        TxnOp::Service(op)
    }
}

impl From<CheckTxnOp> for TxnOp {
    fn from(op: CheckTxnOp) -> Self {
        TxnOp::Check(op)
    }
}

/// Result of one read or write operation of a committed transaction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TxnResult {
    #[serde(rename = "KV")]
    Kv(KVPair),
    Node(Node),
    Service(AgentService),
    Check(HealthCheck),
}

/// Why an operation made the whole transaction roll back
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TxnError {
    /// Position of the failing operation in the submitted list
    #[serde(rename = "OpIndex", default)]
    pub op_index: usize,
    #[serde(rename = "What", default)]
    pub what: String,
}

/// Response of `PUT /v1/txn`.
///
/// `committed` is false when the server rolled the transaction back (HTTP 409);
/// `errors` then lists the offending operations.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TxnResponse {
    #[serde(skip)]
    pub committed: bool,
    #[serde(rename = "Results", default, deserialize_with = "crate::model::null_as_default")]
    pub results: Vec<TxnResult>,
    #[serde(rename = "Errors", default, deserialize_with = "crate::model::null_as_default")]
    pub errors: Vec<TxnError>,
}

impl TxnResponse {
    /// Key/value pairs returned by `get`, `get-tree` and write operations
    pub fn kv_pairs(&self) -> impl Iterator<Item = &KVPair> {
        self.results.iter().filter_map(|r| match r {
            TxnResult::Kv(pair) => Some(pair),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kv_op_wire_format() {
        let ops: Vec<TxnOp> = vec![
            KvTxnOp::set("a", "1").with_flags(7).into(),
            KvTxnOp::delete_cas("b", 12).into(),
            KvTxnOp::check_not_exists("c").into(),
        ];
        let json = serde_json::to_value(&ops).unwrap();
        assert_eq!(
            json,
            serde_json::json!([
                {"KV": {"Verb": "set", "Key": "a", "Value": "MQ==", "Flags": 7}},
                {"KV": {"Verb": "delete-cas", "Key": "b", "Index": 12}},
                {"KV": {"Verb": "check-not-exists", "Key": "c"}}
            ])
        );
    }

    #[test]
    fn test_node_op_wire_format() {
        let op: TxnOp = NodeTxnOp {
            verb: CatalogOp::Set,
            node: Node {
                node: "foo".to_string(),
                address: "127.0.0.1".to_string(),
                ..Default::default()
            },
        }
        .into();
        let json = serde_json::to_value(&op).unwrap();
        assert_eq!(json["Node"]["Verb"], "set");
        assert_eq!(json["Node"]["Node"]["Node"], "foo");
    }

    #[test]
    fn test_response_results_and_errors() {
        let json = r#"{
            "Results": [{"KV": {"Key": "a", "Value": "MQ==", "CreateIndex": 5, "ModifyIndex": 5}}],
            "Errors": null
        }"#;
        let resp: TxnResponse = serde_json::from_str(json).unwrap();
        assert!(!resp.committed);
        assert!(resp.errors.is_empty());
        let pairs: Vec<_> = resp.kv_pairs().collect();
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].value_str(), Some("1"));

        let rolled_back: TxnResponse = serde_json::from_str(
            r#"{"Results": null, "Errors": [{"OpIndex": 1, "What": "failed to delete key"}]}"#,
        )
        .unwrap();
        assert!(rolled_back.results.is_empty());
        assert_eq!(rolled_back.errors[0].op_index, 1);
    }
}
