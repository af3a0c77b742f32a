//! # Mock Provider
//!
//! In-memory issuer and verifier providers, and a wallet able to prove
//! possession of its key and present credentials.

pub mod issuer;
pub mod verifier;
pub mod wallet;

mod datastore;

pub use issuer::Issuer;
pub use verifier::Verifier;
pub use wallet::Wallet;
