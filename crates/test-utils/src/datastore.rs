use anyhow::{Result, bail};
use vcflow_did::Document;

/// Implement `Datastore` for a provider by delegating to its `store`
/// field.
macro_rules! delegate_datastore {
    ($provider:ty) => {
        impl vcflow_core::Datastore for $provider {
            async fn put(
                &self, owner: &str, partition: &str, key: &str, data: Vec<u8>,
            ) -> anyhow::Result<()> {
                vcflow_core::Datastore::put(&self.store, owner, partition, key, data).await
            }

            async fn get(
                &self, owner: &str, partition: &str, key: &str,
            ) -> anyhow::Result<Option<Vec<u8>>> {
                vcflow_core::Datastore::get(&self.store, owner, partition, key).await
            }

            async fn delete(&self, owner: &str, partition: &str, key: &str) -> anyhow::Result<()> {
                vcflow_core::Datastore::delete(&self.store, owner, partition, key).await
            }

            async fn take(
                &self, owner: &str, partition: &str, key: &str,
            ) -> anyhow::Result<Option<Vec<u8>>> {
                vcflow_core::Datastore::take(&self.store, owner, partition, key).await
            }

            async fn get_all(
                &self, owner: &str, partition: &str,
            ) -> anyhow::Result<Vec<(String, Vec<u8>)>> {
                vcflow_core::Datastore::get_all(&self.store, owner, partition).await
            }
        }
    };
}
pub(crate) use delegate_datastore;

/// Tests never reach the network: only `did:key` and `did:jwk`, which
/// resolve locally, are used.
pub fn offline(url: &str) -> Result<Document> {
    bail!("no network in tests: cannot fetch {url}")
}
