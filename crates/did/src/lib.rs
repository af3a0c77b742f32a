//! # DID Resolution
//!
//! Resolves Decentralized Identifiers to the verification keys used to check
//! credential and presentation signatures. `did:key` and `did:jwk` resolve
//! locally; `did:web` fetches its document through a [`Resolver`].

pub mod document;
mod error;
pub mod jwk;
pub mod key;
pub mod web;

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use vcflow_jose::PublicKeyJwk;

pub use crate::document::{Document, VerificationMethod};
pub use crate::error::Error;

/// Fetches DID documents for methods that live on the network.
///
/// Implementers are free to cache, retry with backoff, or serve documents
/// from local storage.
#[async_trait]
pub trait Resolver: Send + Sync {
    /// Fetch the DID document published at `url`.
    async fn resolve(&self, url: &str) -> anyhow::Result<Document>;
}

/// [`Resolver`] fetching documents over HTTP(S).
#[derive(Clone, Debug)]
pub struct HttpResolver {
    client: reqwest::Client,
}

impl HttpResolver {
    /// Create a resolver whose requests time out after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Resolver for HttpResolver {
    async fn resolve(&self, url: &str) -> anyhow::Result<Document> {
        tracing::debug!(url, "did::resolve");
        let response = self.client.get(url).send().await.context("fetching DID document")?;
        let document = response.error_for_status()?.json().await.context("parsing DID document")?;
        Ok(document)
    }
}

/// Resolve a DID (or DID URL) to its document.
///
/// # Errors
///
/// Returns [`Error::MethodNotSupported`] for unknown methods, otherwise the
/// method's resolution error.
pub async fn resolve_document(did: &str, resolver: &dyn Resolver) -> Result<Document, Error> {
    match did_method(did) {
        Some("key") => key::resolve(did),
        Some("jwk") => jwk::resolve(did),
        Some("web") => web::resolve(did, resolver).await,
        Some(method) => Err(Error::MethodNotSupported(method.to_string())),
        None => Err(Error::InvalidDid(format!("{did} is not a DID"))),
    }
}

/// Resolve a DID URL to a verification key. A DID URL with a fragment
/// selects that verification method; a bare DID selects the first.
///
/// # Errors
///
/// Returns an error if the DID cannot be resolved or has no matching
/// JWK-bearing verification method.
pub async fn resolve_jwk(did_url: &str, resolver: &dyn Resolver) -> Result<PublicKeyJwk, Error> {
    let document = resolve_document(did_url, resolver).await?;
    let Some(method) = document.find_method(did_url) else {
        return Err(Error::NotFound(format!("no verification method matches {did_url}")));
    };
    method
        .public_key_jwk
        .clone()
        .ok_or_else(|| Error::InvalidPublicKey(format!("{} has no JWK", method.id)))
}

fn did_method(did: &str) -> Option<&str> {
    let rest = did.strip_prefix("did:")?;
    rest.split(':').next().filter(|m| !m.is_empty())
}
