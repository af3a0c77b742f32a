//! # Verifier Provider
//!
//! Implementers supply storage, DID resolution, verifier settings, the
//! policy registry and a request signing key. Anything implementing all of
//! them is a verifier [`Provider`].

use std::future::Future;

use anyhow::Result;
pub use vcflow_core::{Datastore, KeyedLock, StateStore};
pub use vcflow_did::Resolver;
pub use vcflow_jose::Key;
pub use vcflow_policy::PolicyRegistry;

use crate::config::VerifierConfig;

/// Verifier Provider trait.
pub trait Provider: Metadata + Policies + Signature + Datastore + Resolver + Clone {}

/// A blanket implementation for `Provider` trait so that any type
/// implementing the required super traits is considered a `Provider`.
impl<T> Provider for T where T: Metadata + Policies + Signature + Datastore + Resolver + Clone {}

/// The `Metadata` trait is used by implementers to provide verifier
/// settings to the library.
pub trait Metadata: Send + Sync {
    /// Settings for the verifier identified by `verifier`.
    fn verifier(&self, verifier: &str) -> impl Future<Output = Result<VerifierConfig>> + Send;
}

/// Verification policies and the per-session locks guarding response
/// handling. Both must be shared by every clone of the provider.
pub trait Policies: Send + Sync {
    /// Registered policies.
    fn registry(&self) -> &PolicyRegistry;

    /// Locks serializing responses to the same session.
    fn session_locks(&self) -> &KeyedLock;
}

/// The key Authorization Request objects are signed with.
pub trait Signature: Send + Sync {
    /// Signing key for `verifier`.
    fn signing_key(&self, verifier: &str) -> impl Future<Output = Result<Key>> + Send;

    /// DID URL wallets resolve to the signing key's public half. Sent as the
    /// request object's `kid`.
    fn verification_method(&self, verifier: &str) -> impl Future<Output = Result<String>> + Send;
}
