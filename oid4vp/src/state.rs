//! # Presentation State
//!
//! A presentation session is stored under `presentation:<session id>` from
//! creation until it expires. The wallet's response updates it once.

use serde::{Deserialize, Serialize};
use vcflow_jose::PrivateKeyJwk;

use crate::types::PresentationSession;

pub const SESSION: &str = "presentation:";

pub fn key(session_id: &str) -> String {
    format!("{SESSION}{session_id}")
}

/// A stored session together with the private key its encrypted
/// responses are decrypted with.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Stored {
    pub session: PresentationSession,
    pub response_key: Option<PrivateKeyJwk>,
}
