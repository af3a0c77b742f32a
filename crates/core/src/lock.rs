//! # Keyed Lock
//!
//! Per-key mutual exclusion so at most one writer touches a given session at
//! a time. Locks for different keys never contend.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// A set of async mutexes, one per key, created on first use.
#[derive(Clone, Debug, Default)]
pub struct KeyedLock {
    locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

impl KeyedLock {
    /// Create an empty lock set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the lock for `key`, waiting for any current holder to release
    /// it. The lock is released when the returned guard is dropped.
    pub async fn lock(&self, key: &str) -> OwnedMutexGuard<()> {
        let mutex = self.locks.entry(key.to_string()).or_default().clone();
        mutex.lock_owned().await
    }

    /// Drop the mutex for `key` when no one holds or waits on it.
    pub fn release(&self, key: &str) {
        self.locks.remove_if(key, |_, mutex| Arc::strong_count(mutex) == 1);
    }
}
