// Request and response models for the Consul HTTP API

pub mod acl;
pub mod agent;
pub mod catalog;
pub mod config_entry;
pub mod connect;
pub mod coordinate;
pub mod discovery_chain;
pub mod event;
pub mod health;
pub mod kv;
pub mod namespace;
pub mod operator;
pub mod prepared_query;
pub mod session;
pub mod txn;

pub use acl::*;
pub use agent::*;
pub use catalog::*;
pub use config_entry::*;
pub use connect::*;
pub use coordinate::*;
pub use discovery_chain::*;
pub use event::*;
pub use health::*;
pub use kv::*;
pub use namespace::*;
pub use operator::*;
pub use prepared_query::*;
pub use session::*;
pub use txn::*;

use serde::{Deserialize, Deserializer};

/// Consul writes `null` for empty lists and maps; read it as the empty value
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Holder {
        #[serde(default, deserialize_with = "super::null_as_default")]
        tags: Vec<String>,
        #[serde(default, deserialize_with = "super::null_as_default")]
        meta: HashMap<String, String>,
    }

    #[test]
    fn test_null_as_default() {
        let h: Holder = serde_json::from_str(r#"{"tags":null,"meta":null}"#).unwrap();
        assert!(h.tags.is_empty());
        assert!(h.meta.is_empty());

        let h: Holder = serde_json::from_str(r#"{"tags":["a"]}"#).unwrap();
        assert_eq!(h.tags, vec!["a"]);
        assert!(h.meta.is_empty());
    }
}
