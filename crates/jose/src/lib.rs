//! # JOSE
//!
//! JSON Object Signing and Encryption primitives: keys ([`jwk`]), compact
//! signatures ([`jws`]), compact encryption ([`jwe`]) and signing key
//! backings ([`key`]).

pub mod jwe;
pub mod jwk;
pub mod jws;
pub mod key;

pub use crate::jwk::{Curve, Jwks, KeyType, KeyUse, PrivateKeyJwk, PublicKeyJwk};
pub use crate::jws::{Header, Jwt};
pub use crate::key::{Algorithm, Key, LocalKey, Signer, TransitKey};
