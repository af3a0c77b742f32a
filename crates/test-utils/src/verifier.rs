use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use vcflow_core::{KeyedLock, MemoryStore};
use vcflow_did::{Document, Resolver};
use vcflow_jose::{Curve, Key, LocalKey};
use vcflow_oid4vp::VerifierConfig;
use vcflow_oid4vp::provider::{Metadata, Policies, Signature};
use vcflow_policy::PolicyRegistry;

use crate::datastore::{delegate_datastore, offline};

#[derive(Clone, Debug)]
pub struct Verifier {
    config: VerifierConfig,
    registry: Arc<PolicyRegistry>,
    locks: KeyedLock,
    key: LocalKey,
    store: MemoryStore,
}

impl Verifier {
    #[must_use]
    pub fn new(client_id: &str) -> Self {
        let response_uri = format!("{}/openid4vc/verify", client_id.trim_end_matches('/'));
        Self {
            config: VerifierConfig::new(client_id, response_uri),
            registry: Arc::new(PolicyRegistry::with_builtins().expect("should register builtins")),
            locks: KeyedLock::new(),
            key: LocalKey::generate(Curve::Ed25519).expect("should generate"),
            store: MemoryStore::new(),
        }
    }

    /// Adjust the verifier's settings.
    #[must_use]
    pub fn configure(mut self, f: impl FnOnce(&mut VerifierConfig)) -> Self {
        f(&mut self.config);
        self
    }

    /// The `did:key` of the request signing key.
    #[must_use]
    pub fn did(&self) -> String {
        vcflow_did::key::did_from_jwk(&self.key.jwk.public).expect("should derive DID")
    }
}

impl Metadata for Verifier {
    async fn verifier(&self, _verifier: &str) -> Result<VerifierConfig> {
        Ok(self.config.clone())
    }
}

impl Policies for Verifier {
    fn registry(&self) -> &PolicyRegistry {
        &self.registry
    }

    fn session_locks(&self) -> &KeyedLock {
        &self.locks
    }
}

impl Signature for Verifier {
    async fn signing_key(&self, _verifier: &str) -> Result<Key> {
        Ok(Key::Jwk(self.key.clone()))
    }

    async fn verification_method(&self, _verifier: &str) -> Result<String> {
        let did = self.did();
        let multibase = did.trim_start_matches("did:key:").to_string();
        Ok(format!("{did}#{multibase}"))
    }
}

#[async_trait]
impl Resolver for Verifier {
    async fn resolve(&self, url: &str) -> Result<Document> {
        offline(url)
    }
}

delegate_datastore!(Verifier);
