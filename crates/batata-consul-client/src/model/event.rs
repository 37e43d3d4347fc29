// User event models

use serde::{Deserialize, Serialize};

/// Custom event propagated through the gossip layer
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserEvent {
    #[serde(rename = "ID", default)]
    pub id: String,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(
        rename = "Payload",
        default,
        with = "crate::codec::base64_payload",
        skip_serializing_if = "Option::is_none"
    )]
    pub payload: Option<Vec<u8>>,
    /// Regular expression on node names
    #[serde(rename = "NodeFilter", default)]
    pub node_filter: String,
    /// Regular expression on service names
    #[serde(rename = "ServiceFilter", default)]
    pub service_filter: String,
    /// Regular expression on service tags; needs `service_filter`
    #[serde(rename = "TagFilter", default)]
    pub tag_filter: String,
    #[serde(rename = "Version", default)]
    pub version: u32,
    #[serde(rename = "LTime", default)]
    pub ltime: u64,
}

impl UserEvent {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn with_payload(mut self, payload: impl Into<Vec<u8>>) -> Self {
        self.payload = Some(payload.into());
        self
    }

    pub fn with_node_filter(mut self, filter: &str) -> Self {
        self.node_filter = filter.to_string();
        self
    }

    pub fn with_service_filter(mut self, filter: &str) -> Self {
        self.service_filter = filter.to_string();
        self
    }

    pub fn with_tag_filter(mut self, filter: &str) -> Self {
        self.tag_filter = filter.to_string();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_payload_is_base64() {
        let json = r#"[{
            "ID": "b54fe110-7af5-cafc-d1fb-afc8ba432b1c", "Name": "deploy",
            "Payload": "MTYwOTAzMA==", "NodeFilter": "", "ServiceFilter": "",
            "TagFilter": "", "Version": 1, "LTime": 19
        }]"#;
        let events: Vec<UserEvent> = serde_json::from_str(json).unwrap();
        assert_eq!(events[0].payload.as_deref(), Some(&b"1609030"[..]));
        assert_eq!(events[0].ltime, 19);
    }
}
