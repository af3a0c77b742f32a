//! # Issuance State
//!
//! An issuance session moves through the store under a series of keys:
//!
//! 1. `session:<id>` from offer creation until the pre-authorized code (the
//!    session id) is exchanged at the token endpoint;
//! 2. `nonce:<c_nonce>` once the token is issued, read by each credential
//!    request whose proof carries the nonce;
//! 3. `deferred:<transaction_id>` for a deferred request, until claimed.
//!
//! Alongside, `offer:<uri token>` holds offers sent by reference and
//! `token:<access token>` binds an access token to its `c_nonce`.

use serde::{Deserialize, Serialize};
use vcflow_vdc::Format;

use crate::types::IssuanceRequest;

pub const SESSION: &str = "session:";
pub const NONCE: &str = "nonce:";
pub const TOKEN: &str = "token:";
pub const OFFER: &str = "offer:";
pub const DEFERRED: &str = "deferred:";

pub fn key(prefix: &str, id: &str) -> String {
    format!("{prefix}{id}")
}

/// A credential waiting to be issued, its issuer DID settled.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Pending {
    pub issuer_did: String,
    pub request: IssuanceRequest,
}

/// An offered issuance session.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Offered {
    pub pending: Vec<Pending>,
    pub tx_code: Option<String>,
}

/// An issuance session bound to a `c_nonce` by the token endpoint.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Bound {
    pub session_id: String,
    pub pending: Vec<Pending>,
}

/// An access token.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Token {
    pub c_nonce: String,
}

/// A deferred credential request: everything needed to issue later.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Deferred {
    pub format: Format,
    pub holder_did: String,
    pub pending: Pending,
}
