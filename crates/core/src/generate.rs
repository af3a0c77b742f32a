//! # Generate
//!
//! Random strings for pre-authorized codes, access tokens, state and nonce
//! values.

use base64ct::{Base64UrlUnpadded, Encoding};
use rand::Rng;

const TOKEN_BYTES: usize = 24;

/// Generates a base64url-encoded random string for use as a nonce.
#[must_use]
pub fn nonce() -> String {
    random_token(TOKEN_BYTES)
}

/// Generates a base64url-encoded random string for access tokens,
/// pre-authorized codes and `issuer_state`.
#[must_use]
pub fn uri_token() -> String {
    random_token(TOKEN_BYTES)
}

/// Generates a random identifier for sessions and deferred transactions.
#[must_use]
pub fn session_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Generates a six-digit numeric transaction code for pre-authorized code
/// offers.
#[must_use]
pub fn tx_code() -> String {
    format!("{:06}", rand::rng().random_range(0..1_000_000_u32))
}

/// Generates `len` bytes of cryptographically secure random data, encoded as
/// base64url.
#[must_use]
pub fn random_token(len: usize) -> String {
    let mut bytes = vec![0u8; len];
    rand::rng().fill(bytes.as_mut_slice());
    Base64UrlUnpadded::encode_string(&bytes)
}
