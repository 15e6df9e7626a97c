//! In-memory KV transport.
//!
//! Keeps one ordered keyspace per datacenter and assigns indexes from a
//! single counter, the way the store's raft log does. Compare-and-swap
//! follows the store's rules: index 0 means "only if absent", any other
//! index must equal the key's current modify-index, and a rejected
//! operation changes nothing. Keys follow the same path rules as the HTTP
//! transport: a leading `/` is dropped on reads and deletes and refused on
//! writes, and `.`/`..` segments are refused.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;

use kvgate_error::{TransportError, TransportResult};
use kvgate_types::{KeyValueEntry, QueryMeta, ReadOptions, WriteMeta, WriteOptions};

use crate::keys::{relative_key, write_key};
use crate::KvTransport;

#[derive(Debug, Default)]
struct MemoryState {
    /// Datacenter name ("" for the default) to its keyspace
    datacenters: BTreeMap<String, BTreeMap<String, KeyValueEntry>>,
    /// Last index handed out
    index: u64,
    /// Failure returned by every call while set
    failure: Option<TransportError>,
}

impl MemoryState {
    fn check_failure(&self) -> TransportResult<()> {
        match &self.failure {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn keyspace(&self, datacenter: &Option<String>) -> Option<&BTreeMap<String, KeyValueEntry>> {
        self.datacenters.get(datacenter.as_deref().unwrap_or_default())
    }

    fn keyspace_mut(&mut self, datacenter: &Option<String>) -> &mut BTreeMap<String, KeyValueEntry> {
        self.datacenters
            .entry(datacenter.clone().unwrap_or_default())
            .or_default()
    }

    fn next_index(&mut self) -> u64 {
        self.index += 1;
        self.index
    }

    fn query_meta(&self) -> QueryMeta {
        QueryMeta {
            last_index: self.index,
            known_leader: true,
            last_contact_ms: 0,
            request_time: Duration::ZERO,
        }
    }

    fn store(&mut self, datacenter: &Option<String>, entry: &KeyValueEntry) {
        let index = self.next_index();
        let keyspace = self.keyspace_mut(datacenter);
        let stored = keyspace
            .entry(entry.key.clone())
            .or_insert_with(|| KeyValueEntry {
                key: entry.key.clone(),
                create_index: index,
                ..Default::default()
            });
        stored.value = Some(entry.value_bytes().to_vec());
        stored.flags = entry.flags;
        stored.modify_index = index;
    }

    fn current_index(&self, datacenter: &Option<String>, key: &str) -> Option<u64> {
        self.keyspace(datacenter)
            .and_then(|keyspace| keyspace.get(key))
            .map(|entry| entry.modify_index)
    }
}

/// In-process KV store behind the [`KvTransport`] seam
#[derive(Debug, Default)]
pub struct MemoryTransport {
    state: RwLock<MemoryState>,
}

impl MemoryTransport {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following call fail with `err` until [`clear_failure`](Self::clear_failure)
    pub async fn inject_failure(&self, err: TransportError) {
        self.state.write().await.failure = Some(err);
    }

    pub async fn clear_failure(&self) {
        self.state.write().await.failure = None;
    }

    /// Last index assigned by a mutation
    pub async fn last_index(&self) -> u64 {
        self.state.read().await.index
    }

    /// Number of keys stored in a datacenter (`None` for the default one)
    pub async fn len(&self, datacenter: Option<&str>) -> usize {
        let state = self.state.read().await;
        state
            .datacenters
            .get(datacenter.unwrap_or_default())
            .map(BTreeMap::len)
            .unwrap_or(0)
    }
}

fn under_prefix<'a>(
    keyspace: &'a BTreeMap<String, KeyValueEntry>,
    prefix: &'a str,
) -> impl Iterator<Item = (&'a String, &'a KeyValueEntry)> + 'a {
    keyspace
        .range(prefix.to_string()..)
        .take_while(move |(key, _)| key.starts_with(prefix))
}

#[async_trait]
impl KvTransport for MemoryTransport {
    async fn get(
        &self,
        key: &str,
        opts: &ReadOptions,
    ) -> TransportResult<(Option<KeyValueEntry>, QueryMeta)> {
        let state = self.state.read().await;
        state.check_failure()?;
        let key = relative_key(key)?;
        let entry = state
            .keyspace(&opts.datacenter)
            .and_then(|keyspace| keyspace.get(key))
            .cloned();
        Ok((entry, state.query_meta()))
    }

    async fn list(
        &self,
        prefix: &str,
        opts: &ReadOptions,
    ) -> TransportResult<(Vec<KeyValueEntry>, QueryMeta)> {
        let state = self.state.read().await;
        state.check_failure()?;
        let prefix = relative_key(prefix)?;
        let entries: Vec<KeyValueEntry> = state
            .keyspace(&opts.datacenter)
            .map(|keyspace| {
                under_prefix(keyspace, prefix)
                    .map(|(_, entry)| entry.clone())
                    .collect()
            })
            .unwrap_or_default();
        Ok((entries, state.query_meta()))
    }

    async fn put(&self, entry: &KeyValueEntry, opts: &WriteOptions) -> TransportResult<WriteMeta> {
        let mut state = self.state.write().await;
        state.check_failure()?;
        write_key(&entry.key)?;
        state.store(&opts.datacenter, entry);
        Ok(WriteMeta::default())
    }

    async fn cas(
        &self,
        entry: &KeyValueEntry,
        opts: &WriteOptions,
    ) -> TransportResult<(bool, WriteMeta)> {
        let mut state = self.state.write().await;
        state.check_failure()?;
        write_key(&entry.key)?;

        let applies = match state.current_index(&opts.datacenter, &entry.key) {
            Some(current) => current == entry.modify_index,
            None => entry.modify_index == 0,
        };
        if applies {
            state.store(&opts.datacenter, entry);
        }
        Ok((applies, WriteMeta::default()))
    }

    async fn delete_cas(
        &self,
        entry: &KeyValueEntry,
        opts: &WriteOptions,
    ) -> TransportResult<(bool, WriteMeta)> {
        let mut state = self.state.write().await;
        state.check_failure()?;

        let key = relative_key(&entry.key)?;

        // A missing key counts as deleted, whatever the index
        let current = state.current_index(&opts.datacenter, key);
        let applies = current.map_or(true, |index| index == entry.modify_index);
        if applies && current.is_some() {
            state.next_index();
            state.keyspace_mut(&opts.datacenter).remove(key);
        }
        Ok((applies, WriteMeta::default()))
    }

    async fn delete(&self, key: &str, opts: &WriteOptions) -> TransportResult<WriteMeta> {
        let mut state = self.state.write().await;
        state.check_failure()?;
        let key = relative_key(key)?;
        if state.keyspace_mut(&opts.datacenter).remove(key).is_some() {
            state.next_index();
        }
        Ok(WriteMeta::default())
    }

    async fn delete_tree(&self, prefix: &str, opts: &WriteOptions) -> TransportResult<WriteMeta> {
        let mut state = self.state.write().await;
        state.check_failure()?;
        let prefix = relative_key(prefix)?;

        let keyspace = state.keyspace_mut(&opts.datacenter);
        let doomed: Vec<String> = under_prefix(keyspace, prefix)
            .map(|(key, _)| key.clone())
            .collect();
        for key in &doomed {
            keyspace.remove(key);
        }
        if !doomed.is_empty() {
            state.next_index();
        }
        Ok(WriteMeta::default())
    }
}
