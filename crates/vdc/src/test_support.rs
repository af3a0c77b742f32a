//! Shared fixtures for unit tests.

use async_trait::async_trait;
use vcflow_did::{Document, Resolver};
use vcflow_jose::LocalKey;

/// Resolver for tests that only use locally resolvable DID methods.
pub struct NoNetwork;

#[async_trait]
impl Resolver for NoNetwork {
    async fn resolve(&self, url: &str) -> anyhow::Result<Document> {
        anyhow::bail!("no network access in tests: {url}")
    }
}

/// The `did:key` DID of a local key.
pub fn did_key(key: &LocalKey) -> String {
    vcflow_did::key::did_from_jwk(&key.jwk.public).unwrap()
}

/// The `did:key` DID URL of a local key's verification method.
pub fn did_key_url(key: &LocalKey) -> String {
    let did = did_key(key);
    let multibase = did.trim_start_matches("did:key:").to_string();
    format!("{did}#{multibase}")
}
