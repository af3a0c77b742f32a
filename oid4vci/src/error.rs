//! # Issuance Errors
//!
//! Errors returned by the issuer endpoints. Each serializes to the OAuth
//! 2.0 error shape so it can be returned to a wallet as-is:
//!
//! ```json
//! {"error": "unmapped_session_id", "error_description": "..."}
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// `OpenID` error codes for Verifiable Credential Issuance.
#[derive(Error, Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
#[serde(tag = "error", content = "error_description")]
pub enum Error {
    /// The request is missing a required parameter, includes an unsupported
    /// parameter value, repeats a parameter, or is otherwise malformed.
    #[error(r#"{{"error": "invalid_request", "error_description": "{0}"}}"#)]
    InvalidRequest(String),

    /// The provided grant (pre-authorized code plus transaction code) is
    /// invalid.
    #[error(r#"{{"error": "invalid_grant", "error_description": "{0}"}}"#)]
    InvalidGrant(String),

    /// The pre-authorized code does not name a pending issuance session. The
    /// session may never have existed, may have expired, or was already
    /// exchanged for a token.
    #[error(r#"{{"error": "unmapped_session_id", "error_description": "{0}"}}"#)]
    UnmappedSessionId(String),

    /// The proof `nonce` is not bound to any pending issuance.
    #[error(r#"{{"error": "unmapped_nonce", "error_description": "{0}"}}"#)]
    UnmappedNonce(String),

    /// The Credential Request did not contain a valid proof of possession.
    #[error(r#"{{"error": "invalid_proof", "error_description": "{0}"}}"#)]
    InvalidProof(String),

    /// The requested credential format is not supported.
    #[error(r#"{{"error": "unsupported_credential_format", "error_description": "{0}"}}"#)]
    UnsupportedCredentialFormat(String),

    /// The Deferred Credential Request contains an invalid or unknown
    /// `transaction_id`.
    #[error(r#"{{"error": "invalid_transaction_id", "error_description": "{0}"}}"#)]
    InvalidTransactionId(String),

    /// The access token is missing, unknown or expired.
    #[error(r#"{{"error": "invalid_token", "error_description": "{0}"}}"#)]
    InvalidToken(String),

    /// The issuer encountered an unexpected condition that prevented it from
    /// fulfilling the request.
    #[error(r#"{{"error": "server_error", "error_description": "{0}"}}"#)]
    ServerError(String),
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast_ref::<Self>() {
            Some(Self::InvalidRequest(e)) => Self::InvalidRequest(format!("{err}: {e}")),
            Some(Self::InvalidGrant(e)) => Self::InvalidGrant(format!("{err}: {e}")),
            Some(Self::UnmappedSessionId(e)) => Self::UnmappedSessionId(format!("{err}: {e}")),
            Some(Self::UnmappedNonce(e)) => Self::UnmappedNonce(format!("{err}: {e}")),
            Some(Self::InvalidProof(e)) => Self::InvalidProof(format!("{err}: {e}")),
            Some(Self::UnsupportedCredentialFormat(e)) => {
                Self::UnsupportedCredentialFormat(format!("{err}: {e}"))
            }
            Some(Self::InvalidTransactionId(e)) => {
                Self::InvalidTransactionId(format!("{err}: {e}"))
            }
            Some(Self::InvalidToken(e)) => Self::InvalidToken(format!("{err}: {e}")),
            Some(Self::ServerError(e)) => Self::ServerError(format!("{err}: {e}")),
            None => {
                let stack = err.chain().fold(String::new(), |cause, e| format!("{cause} -> {e}"));
                let stack = stack.trim_start_matches(" -> ").to_string();
                Self::ServerError(stack)
            }
        }
    }
}

/// Construct an `Error::InvalidRequest` error from a string or existing error
/// value.
macro_rules! invalid {
    ($fmt:expr, $($arg:tt)*) => {
        $crate::Error::InvalidRequest(format!($fmt, $($arg)*))
    };
     ($err:expr $(,)?) => {
        $crate::Error::InvalidRequest(format!($err))
    };
}
pub(crate) use invalid;

/// Construct an `Error::ServerError` error from a string or existing error
/// value.
macro_rules! server {
    ($fmt:expr, $($arg:tt)*) => {
        $crate::Error::ServerError(format!($fmt, $($arg)*))
    };
     ($err:expr $(,)?) => {
        $crate::Error::ServerError(format!($err))
    };
}
pub(crate) use server;
