// Key/value store models

use serde::{Deserialize, Serialize};

/// Entry of the key/value store.
///
/// `value` travels base64 encoded on the wire and is decoded here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KVPair {
    #[serde(rename = "Key")]
    pub key: String,
    #[serde(rename = "CreateIndex", default)]
    pub create_index: u64,
    /// Compared against on check-and-set writes
    #[serde(rename = "ModifyIndex", default)]
    pub modify_index: u64,
    /// Number of times the key has been acquired through a session
    #[serde(rename = "LockIndex", default)]
    pub lock_index: u64,
    #[serde(rename = "Flags", default)]
    pub flags: u64,
    #[serde(
        rename = "Value",
        default,
        with = "crate::codec::base64_payload",
        skip_serializing_if = "Option::is_none"
    )]
    pub value: Option<Vec<u8>>,
    /// Session currently holding the key, if any
    #[serde(rename = "Session", default, skip_serializing_if = "Option::is_none")]
    pub session: Option<String>,
    #[serde(rename = "Namespace", default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(rename = "Partition", default, skip_serializing_if = "Option::is_none")]
    pub partition: Option<String>,
}

impl KVPair {
    pub fn new(key: &str, value: impl Into<Vec<u8>>) -> Self {
        Self {
            key: key.to_string(),
            value: Some(value.into()),
            ..Default::default()
        }
    }

    pub fn with_flags(mut self, flags: u64) -> Self {
        self.flags = flags;
        self
    }

    /// Set the index a check-and-set write compares against
    pub fn with_modify_index(mut self, index: u64) -> Self {
        self.modify_index = index;
        self
    }

    pub fn with_session(mut self, session: &str) -> Self {
        self.session = Some(session.to_string());
        self
    }

    /// Value as UTF-8 text, `None` when absent or not valid UTF-8
    pub fn value_str(&self) -> Option<&str> {
        self.value
            .as_deref()
            .and_then(|v| std::str::from_utf8(v).ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kv_pair_decodes_value() {
        let json = r#"[{
            "LockIndex": 1, "Session": "adf4238a-882b-9ddc-4a9d-5b6758e4159e",
            "Key": "zip", "Flags": 42, "Value": "dGVzdA==",
            "CreateIndex": 100, "ModifyIndex": 200
        }]"#;
        let pairs: Vec<KVPair> = serde_json::from_str(json).unwrap();
        let pair = &pairs[0];
        assert_eq!(pair.value_str(), Some("test"));
        assert_eq!(pair.flags, 42);
        assert_eq!(pair.lock_index, 1);
        assert!(pair.session.is_some());
    }

    #[test]
    fn test_kv_pair_null_value() {
        let pair: KVPair = serde_json::from_str(r#"{"Key":"folder/","Value":null}"#).unwrap();
        assert!(pair.value.is_none());
        assert!(pair.value_str().is_none());
    }
}
