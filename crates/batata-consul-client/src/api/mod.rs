// Endpoint façades, one type per group of agent routes

mod acl;
mod agent;
mod catalog;
mod config_entry;
mod connect;
mod coordinate;
mod discovery_chain;
mod event;
mod health;
mod kv;
mod lock;
mod namespace;
mod operator;
mod prepared_query;
mod raw;
mod session;
mod snapshot;
mod status;

pub use acl::{Acl, AuthMethods, BindingRules, Policies, Roles, Tokens};
pub use agent::{Agent, LogLines};
pub use catalog::Catalog;
pub use config_entry::ConfigEntries;
pub use connect::Connect;
pub use coordinate::Coordinate;
pub use discovery_chain::DiscoveryChain;
pub use event::{Event, event_id_to_index};
pub use health::Health;
pub use kv::Kv;
pub use lock::{
    DEFAULT_LOCK_RETRY_TIME, DEFAULT_LOCK_SESSION_TTL, LOCK_FLAG_VALUE, Lock, LockOptions,
};
pub use namespace::Namespaces;
pub use operator::Operator;
pub use prepared_query::PreparedQuery;
pub use raw::Raw;
pub use session::Session;
pub use snapshot::Snapshot;
pub use status::Status;
