//! # State
//!
//! State is used to persist request information between steps in a flow.
//! Every entry carries an expiry; expired entries are treated as absent and
//! evicted lazily when touched.

use anyhow::{Result, anyhow};
use chrono::{DateTime, TimeDelta, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::datastore::Datastore;

const OWNER: &str = "vcflow";
const STATE: &str = "STATE";

/// State is used to persist request information between steps of an
/// issuance or presentation flow.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct State<T> {
    /// Body holds data relevant to the current state.
    pub body: T,

    /// Time state should expire.
    pub expires_at: DateTime<Utc>,
}

impl<T> State<T> {
    /// Wrap `body` in state that expires `ttl` from now.
    ///
    /// # Errors
    ///
    /// Returns an error when the expiry is not a representable time.
    pub fn new(body: T, ttl: TimeDelta) -> Result<Self> {
        Ok(Self {
            body,
            expires_at: expiry(ttl)?,
        })
    }

    /// Determines whether state has expired or not.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expires_at < Utc::now()
    }
}

/// The time `ttl` from now.
///
/// # Errors
///
/// Returns an error when the result is not a representable time.
pub fn expiry(ttl: TimeDelta) -> Result<DateTime<Utc>> {
    Utc::now().checked_add_signed(ttl).ok_or_else(|| anyhow!("expiry {ttl} from now is out of range"))
}

/// The `StateStore` trait is implemented to provide concrete storage and
/// retrieval of server state between requests.
pub trait StateStore: Send + Sync {
    /// Store state using the provided key, replacing any existing entry.
    fn put<T: Serialize + Sync>(
        &self, key: &str, state: &State<T>,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Retrieve state using the provided key. Missing and expired entries
    /// both yield `None`.
    fn get<T: DeserializeOwned + Send>(
        &self, key: &str,
    ) -> impl Future<Output = Result<Option<State<T>>>> + Send;

    /// Remove state using the key provided.
    fn purge(&self, key: &str) -> impl Future<Output = Result<()>> + Send;

    /// Atomically remove and return state. When several callers race on the
    /// same key, at most one receives the entry.
    fn take<T: DeserializeOwned + Send>(
        &self, key: &str,
    ) -> impl Future<Output = Result<Option<State<T>>>> + Send;

    /// List unexpired entries whose key starts with `prefix`.
    fn list<T: DeserializeOwned + Send>(
        &self, prefix: &str,
    ) -> impl Future<Output = Result<Vec<(String, State<T>)>>> + Send;
}

impl<D> StateStore for D
where
    D: Datastore,
{
    async fn put<T: Serialize + Sync>(&self, key: &str, state: &State<T>) -> Result<()> {
        let data = serde_json::to_vec(state)?;
        Datastore::put(self, OWNER, STATE, key, data).await
    }

    async fn get<T: DeserializeOwned + Send>(&self, key: &str) -> Result<Option<State<T>>> {
        let Some(data) = Datastore::get(self, OWNER, STATE, key).await? else {
            return Ok(None);
        };
        let state: State<T> = serde_json::from_slice(&data)?;
        if state.is_expired() {
            tracing::debug!(key, "evicting expired state");
            Datastore::delete(self, OWNER, STATE, key).await?;
            return Ok(None);
        }
        Ok(Some(state))
    }

    async fn purge(&self, key: &str) -> Result<()> {
        Datastore::delete(self, OWNER, STATE, key).await
    }

    async fn take<T: DeserializeOwned + Send>(&self, key: &str) -> Result<Option<State<T>>> {
        let Some(data) = Datastore::take(self, OWNER, STATE, key).await? else {
            return Ok(None);
        };
        let state: State<T> = serde_json::from_slice(&data)?;
        if state.is_expired() {
            return Ok(None);
        }
        Ok(Some(state))
    }

    async fn list<T: DeserializeOwned + Send>(
        &self, prefix: &str,
    ) -> Result<Vec<(String, State<T>)>> {
        let mut live = vec![];
        for (key, data) in Datastore::get_all(self, OWNER, STATE).await? {
            if !key.starts_with(prefix) {
                continue;
            }
            let state: State<T> = serde_json::from_slice(&data)?;
            if !state.is_expired() {
                live.push((key, state));
            }
        }
        Ok(live)
    }
}

/// Remove every expired entry under `prefix`, returning the number removed.
///
/// # Errors
///
/// Returns an error if the underlying store cannot be read or written.
pub async fn sweep<D: Datastore>(store: &D, prefix: &str) -> Result<usize> {
    let mut removed = 0;
    for (key, data) in Datastore::get_all(store, OWNER, STATE).await? {
        if !key.starts_with(prefix) {
            continue;
        }
        let Ok(state) = serde_json::from_slice::<State<serde_json::Value>>(&data) else {
            continue;
        };
        if state.is_expired() {
            Datastore::delete(store, OWNER, STATE, &key).await?;
            removed += 1;
        }
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStore;

    #[tokio::test]
    async fn expired_state_is_absent() {
        let store = MemoryStore::new();
        let state = State {
            body: "stale".to_string(),
            expires_at: Utc::now() - TimeDelta::seconds(1),
        };
        StateStore::put(&store, "session:1", &state).await.unwrap();

        let got: Option<State<String>> = StateStore::get(&store, "session:1").await.unwrap();
        assert!(got.is_none());

        // evicted on access
        assert!(Datastore::get(&store, OWNER, STATE, "session:1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn list_and_sweep() {
        let store = MemoryStore::new();
        let live = State::new(1, TimeDelta::minutes(5)).unwrap();
        let dead = State {
            body: 2,
            expires_at: Utc::now() - TimeDelta::seconds(1),
        };
        StateStore::put(&store, "deferred:a", &live).await.unwrap();
        StateStore::put(&store, "deferred:b", &dead).await.unwrap();
        StateStore::put(&store, "nonce:c", &live).await.unwrap();

        let listed: Vec<(String, State<i32>)> = store.list("deferred:").await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].0, "deferred:a");

        assert_eq!(sweep(&store, "deferred:").await.unwrap(), 1);
        assert_eq!(sweep(&store, "deferred:").await.unwrap(), 0);
    }

    #[test]
    fn expiry_out_of_range() {
        assert!(State::new((), TimeDelta::MAX).is_err());
        assert!(expiry(TimeDelta::days(1)).is_ok());
    }
}
