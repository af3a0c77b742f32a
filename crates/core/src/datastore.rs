//! # Datastore
//!
//! Byte-level key/value storage backing the typed [`crate::StateStore`].
//! Implementers choose the medium (in-memory, distributed cache, database);
//! [`MemoryStore`] is the in-process default.

use std::sync::Arc;

use anyhow::Result;
use dashmap::DashMap;

/// `Datastore` is used by implementers to provide data storage
/// capability.
pub trait Datastore: Sized + Send + Sync {
    /// Store a data item in the underlying item store, replacing any
    /// existing item with the same key.
    fn put(
        &self, owner: &str, partition: &str, key: &str, data: Vec<u8>,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Fetches a single item from the underlying store, returning `None` if
    /// no match was found.
    fn get(
        &self, owner: &str, partition: &str, key: &str,
    ) -> impl Future<Output = Result<Option<Vec<u8>>>> + Send;

    /// Delete the specified data item.
    fn delete(
        &self, owner: &str, partition: &str, key: &str,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Remove and return the specified data item in one atomic step. Of any
    /// number of concurrent callers, at most one receives the item.
    fn take(
        &self, owner: &str, partition: &str, key: &str,
    ) -> impl Future<Output = Result<Option<Vec<u8>>>> + Send;

    /// Fetches all items for the owner/partition.
    fn get_all(
        &self, owner: &str, partition: &str,
    ) -> impl Future<Output = Result<Vec<(String, Vec<u8>)>>> + Send;
}

/// In-memory [`Datastore`] backed by a concurrent map. Clones share the same
/// underlying map.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    items: Arc<DashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn qualify(owner: &str, partition: &str, key: &str) -> String {
        format!("{owner}/{partition}/{key}")
    }
}

impl Datastore for MemoryStore {
    async fn put(&self, owner: &str, partition: &str, key: &str, data: Vec<u8>) -> Result<()> {
        self.items.insert(Self::qualify(owner, partition, key), data);
        Ok(())
    }

    async fn get(&self, owner: &str, partition: &str, key: &str) -> Result<Option<Vec<u8>>> {
        let item = self.items.get(&Self::qualify(owner, partition, key));
        Ok(item.map(|entry| entry.value().clone()))
    }

    async fn delete(&self, owner: &str, partition: &str, key: &str) -> Result<()> {
        self.items.remove(&Self::qualify(owner, partition, key));
        Ok(())
    }

    async fn take(&self, owner: &str, partition: &str, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.items.remove(&Self::qualify(owner, partition, key)).map(|(_, data)| data))
    }

    async fn get_all(&self, owner: &str, partition: &str) -> Result<Vec<(String, Vec<u8>)>> {
        let prefix = Self::qualify(owner, partition, "");
        let all = self
            .items
            .iter()
            .filter_map(|entry| {
                let key = entry.key().strip_prefix(&prefix)?;
                Some((key.to_string(), entry.value().clone()))
            })
            .collect();
        Ok(all)
    }
}
