// batata-consul-client: typed HTTP client for the Consul agent API

pub mod api;
pub mod client;
pub mod codec;
pub mod config;
pub mod constants;
pub mod error;
pub mod model;
pub mod request;

pub use api::{Lock, LockOptions};
pub use client::ConsulClient;
pub use config::{ConsulClientConfig, HttpBasicAuth};
pub use error::{ConsulError, Result};
pub use request::{
    ConsistencyMode, ConsulRequest, QueryMeta, QueryOptions, QueryResult, WriteOptions,
    WriteResult,
};
