//! kvgate types: the data model shared between the transport and the client.
//!
//! * **Entries**: records as the KV store returns them (`entry`)
//! * **Options**: datacenter-scoped read and write options (`options`)
//! * **Metadata**: response metadata reported by the transport (`meta`)
//! * **Values**: the decoded result handed to callers (`value`)

pub mod entry;
pub mod meta;
pub mod options;
pub mod value;

pub use entry::KeyValueEntry;
pub use meta::{QueryMeta, WriteMeta};
pub use options::{Consistency, ReadOptions, WriteOptions, DEFAULT_DATACENTER_LABEL};
pub use value::StoredValue;
