//! Transports for the kvgate key client.
//!
//! A [`KvTransport`] performs exactly one exchange with a KV store per call
//! and reports the store's answer verbatim. Two implementations ship here:
//!
//! * [`HttpTransport`]: the Consul-style `/v1/kv` HTTP/JSON API
//! * [`MemoryTransport`]: an in-process store with the same index and
//!   compare-and-swap rules, used by tests and dry runs

use std::fmt::Debug;

use async_trait::async_trait;

use kvgate_error::TransportResult;
use kvgate_types::{KeyValueEntry, QueryMeta, ReadOptions, WriteMeta, WriteOptions};

pub mod http;
mod keys;
pub mod memory;

pub use http::{HttpBasicAuth, HttpTransport, HttpTransportConfig};
pub use memory::MemoryTransport;

/// The remote key/value client consumed by the key client.
///
/// Implementations must not retry, cache or reinterpret answers: a missing
/// key is `Ok(None)` / an empty listing, and a rejected compare-and-swap is
/// `Ok((false, _))`. Only failures to complete the exchange are errors.
#[async_trait]
pub trait KvTransport: Send + Sync + Debug {
    /// Fetch the entry stored at `key`
    async fn get(
        &self,
        key: &str,
        opts: &ReadOptions,
    ) -> TransportResult<(Option<KeyValueEntry>, QueryMeta)>;

    /// Fetch every entry whose key starts with `prefix`, in key order
    async fn list(
        &self,
        prefix: &str,
        opts: &ReadOptions,
    ) -> TransportResult<(Vec<KeyValueEntry>, QueryMeta)>;

    /// Unconditionally store `entry.value` and `entry.flags` at `entry.key`
    async fn put(&self, entry: &KeyValueEntry, opts: &WriteOptions) -> TransportResult<WriteMeta>;

    /// Store `entry` only if the key's modify-index equals `entry.modify_index`
    async fn cas(
        &self,
        entry: &KeyValueEntry,
        opts: &WriteOptions,
    ) -> TransportResult<(bool, WriteMeta)>;

    /// Delete `entry.key` only if its modify-index equals `entry.modify_index`
    async fn delete_cas(
        &self,
        entry: &KeyValueEntry,
        opts: &WriteOptions,
    ) -> TransportResult<(bool, WriteMeta)>;

    /// Delete `key`; deleting a missing key succeeds
    async fn delete(&self, key: &str, opts: &WriteOptions) -> TransportResult<WriteMeta>;

    /// Delete every entry whose key starts with `prefix`
    async fn delete_tree(&self, prefix: &str, opts: &WriteOptions) -> TransportResult<WriteMeta>;
}
