use anyhow::Result;
use async_trait::async_trait;
use vcflow_core::MemoryStore;
use vcflow_did::{Document, Resolver};
use vcflow_jose::{Curve, Key, LocalKey};
use vcflow_oid4vci::IssuerConfig;
use vcflow_oid4vci::provider::Metadata;

use crate::datastore::{delegate_datastore, offline};

#[derive(Clone, Debug)]
pub struct Issuer {
    config: IssuerConfig,
    key: LocalKey,
    store: MemoryStore,
}

impl Issuer {
    #[must_use]
    pub fn new(credential_issuer: &str) -> Self {
        Self {
            config: IssuerConfig::new(credential_issuer),
            key: LocalKey::generate(Curve::Ed25519).expect("should generate"),
            store: MemoryStore::new(),
        }
    }

    /// Adjust the issuer's settings.
    #[must_use]
    pub fn configure(mut self, f: impl FnOnce(&mut IssuerConfig)) -> Self {
        f(&mut self.config);
        self
    }

    /// The issuer's signing key.
    #[must_use]
    pub fn key(&self) -> Key {
        Key::Jwk(self.key.clone())
    }

    /// The `did:key` of the signing key.
    #[must_use]
    pub fn did(&self) -> String {
        vcflow_did::key::did_from_jwk(&self.key.jwk.public).expect("should derive DID")
    }
}

impl Metadata for Issuer {
    async fn issuer(&self, _issuer: &str) -> Result<IssuerConfig> {
        Ok(self.config.clone())
    }
}

#[async_trait]
impl Resolver for Issuer {
    async fn resolve(&self, url: &str) -> Result<Document> {
        offline(url)
    }
}

delegate_datastore!(Issuer);
