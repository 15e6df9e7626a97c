//! Key client for provider reconciliation
//!
//! Translates get / list / put / compare-and-swap / delete requests into
//! single calls on a [`KvTransport`], using the read and write options the
//! client was built with.

use std::sync::Arc;

use tracing::debug;

use kvgate_error::{KeyClientError, KeyClientResult, ReadOp, TransportError, WriteOp};
use kvgate_transport::KvTransport;
use kvgate_types::{KeyValueEntry, ReadOptions, StoredValue, WriteOptions};

/// Facade over a remote KV store bound to fixed read and write options.
///
/// The client holds no mutable state; it can be cloned and shared across
/// tasks. Concurrent writes to one key race at the store, and the CAS
/// operations are the only way to detect that.
#[derive(Debug, Clone)]
pub struct KeyClient {
    transport: Arc<dyn KvTransport>,
    read_options: ReadOptions,
    write_options: WriteOptions,
}

impl KeyClient {
    pub fn new(
        transport: Arc<dyn KvTransport>,
        read_options: ReadOptions,
        write_options: WriteOptions,
    ) -> Self {
        Self {
            transport,
            read_options,
            write_options,
        }
    }

    pub fn read_options(&self) -> &ReadOptions {
        &self.read_options
    }

    pub fn write_options(&self) -> &WriteOptions {
        &self.write_options
    }

    /// Fetch the value stored at `path`.
    ///
    /// Returns `Ok(None)` when the key does not exist.
    pub async fn get(&self, path: &str) -> KeyClientResult<Option<StoredValue>> {
        debug!(
            key = path,
            datacenter = self.read_options.datacenter_label(),
            "Reading key"
        );
        let (entry, _) = self
            .transport
            .get(path, &self.read_options)
            .await
            .map_err(|e| self.read_error(ReadOp::Get, path, e))?;
        Ok(entry.map(|entry| entry.to_stored_value()))
    }

    /// Like [`get`](Self::get), but an absent key yields the zero value `("", 0, 0)`.
    pub async fn get_or_default(&self, path: &str) -> KeyClientResult<StoredValue> {
        Ok(self.get(path).await?.unwrap_or_default())
    }

    /// List every entry whose key starts with `prefix`, in the store's order.
    pub async fn get_under_prefix(&self, prefix: &str) -> KeyClientResult<Vec<KeyValueEntry>> {
        debug!(
            prefix,
            datacenter = self.read_options.datacenter_label(),
            "Listing keys under prefix"
        );
        let (entries, _) = self
            .transport
            .list(prefix, &self.read_options)
            .await
            .map_err(|e| self.read_error(ReadOp::List, prefix, e))?;
        Ok(entries)
    }

    /// Unconditionally write `value` and `flags` to `path`.
    pub async fn put(&self, path: &str, value: &str, flags: u64) -> KeyClientResult<()> {
        debug!(
            key = path,
            value_len = value.len(),
            flags,
            datacenter = self.write_options.datacenter_label(),
            "Setting key"
        );
        let entry = KeyValueEntry::new(path, value, flags);
        self.transport
            .put(&entry, &self.write_options)
            .await
            .map_err(|e| self.write_error(WriteOp::Put, path, e))?;
        Ok(())
    }

    /// Write `value` and `flags` to `path` only if its modify-index is `cas`.
    ///
    /// `cas == 0` only writes when the key does not exist. Returns whether
    /// the store applied the write; `false` is not an error.
    pub async fn cas(&self, path: &str, value: &str, flags: u64, cas: u64) -> KeyClientResult<bool> {
        debug!(
            key = path,
            value_len = value.len(),
            flags,
            cas,
            datacenter = self.write_options.datacenter_label(),
            "Setting key with cas"
        );
        let entry = KeyValueEntry::new(path, value, flags).with_modify_index(cas);
        let (applied, _) = self
            .transport
            .cas(&entry, &self.write_options)
            .await
            .map_err(|e| self.write_error(WriteOp::Cas, path, e))?;
        Ok(applied)
    }

    /// Delete `path` only if its modify-index is `cas`.
    pub async fn delete_cas(&self, path: &str, cas: u64) -> KeyClientResult<bool> {
        debug!(
            key = path,
            cas,
            datacenter = self.write_options.datacenter_label(),
            "Deleting key with cas"
        );
        let entry = KeyValueEntry::key_only(path).with_modify_index(cas);
        let (applied, _) = self
            .transport
            .delete_cas(&entry, &self.write_options)
            .await
            .map_err(|e| self.write_error(WriteOp::DeleteCas, path, e))?;
        Ok(applied)
    }

    /// Delete `path`. Deleting a missing key succeeds.
    pub async fn delete(&self, path: &str) -> KeyClientResult<()> {
        debug!(
            key = path,
            datacenter = self.write_options.datacenter_label(),
            "Deleting key"
        );
        self.transport
            .delete(path, &self.write_options)
            .await
            .map_err(|e| self.write_error(WriteOp::Delete, path, e))?;
        Ok(())
    }

    /// Delete every key that starts with `prefix`.
    pub async fn delete_under_prefix(&self, prefix: &str) -> KeyClientResult<()> {
        debug!(
            prefix,
            datacenter = self.write_options.datacenter_label(),
            "Deleting all keys under prefix"
        );
        self.transport
            .delete_tree(prefix, &self.write_options)
            .await
            .map_err(|e| self.write_error(WriteOp::DeleteTree, prefix, e))?;
        Ok(())
    }

    fn read_error(&self, op: ReadOp, key: &str, source: TransportError) -> KeyClientError {
        KeyClientError::read(op, key, self.read_options.datacenter_label(), source)
    }

    fn write_error(&self, op: WriteOp, key: &str, source: TransportError) -> KeyClientError {
        KeyClientError::write(op, key, self.write_options.datacenter_label(), source)
    }
}

//-----------------------------------------------------------------------------
// Tests
//-----------------------------------------------------------------------------
