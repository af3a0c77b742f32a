//! # Issuer Provider
//!
//! The library reaches its collaborators through the traits in this module.
//! Implementers supply storage, DID resolution and issuer settings; anything
//! implementing all of them is an issuer [`Provider`].

use std::future::Future;

use anyhow::Result;
pub use vcflow_core::{Datastore, StateStore};
pub use vcflow_did::Resolver;

use crate::config::IssuerConfig;

/// Issuer Provider trait.
pub trait Provider: Metadata + Datastore + Resolver + Clone {}

/// A blanket implementation for `Provider` trait so that any type
/// implementing the required super traits is considered a `Provider`.
impl<T> Provider for T where T: Metadata + Datastore + Resolver + Clone {}

/// The `Metadata` trait is used by implementers to provide issuer settings
/// to the library.
pub trait Metadata: Send + Sync {
    /// Settings for the issuer identified by `issuer`.
    fn issuer(&self, issuer: &str) -> impl Future<Output = Result<IssuerConfig>> + Send;
}
