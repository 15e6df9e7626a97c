//! kvgate: key/value adapter between a resource provider and a Consul-style
//! KV store.
//!
//! A [`KeyClient`] is bound to one transport and one pair of read/write
//! options for its lifetime. Each of its operations is a single round trip
//! to the store. Absent keys and rejected compare-and-swaps are ordinary
//! results; only failed exchanges are errors.
//!
//! ## Module Organization
//!
//! * **Client**: the key client facade (`client`)
//! * **Configuration**: provider configuration and per-resource scopes (`config`)
//! * **Telemetry**: tracing subscriber setup (`telemetry`)

pub mod client;
pub mod config;
pub mod telemetry;

pub use client::KeyClient;
pub use config::{ClientConfig, ResourceScope};

// Re-export the pieces callers need alongside the client
pub use kvgate_error::{
    ConfigError, ConfigResult, ErrorMessage, KeyClientError, KeyClientResult, KvGateError,
    ReadOp, TransportError, WriteOp,
};
pub use kvgate_transport::{HttpTransport, KvTransport, MemoryTransport};
pub use kvgate_types::{Consistency, KeyValueEntry, ReadOptions, StoredValue, WriteOptions};
