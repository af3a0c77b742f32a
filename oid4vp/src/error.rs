//! # Verification Errors
//!
//! Errors returned by the verifier endpoints, serialized in the OAuth 2.0
//! error shape (`error` and `error_description`).

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// `OpenID` error codes for Verifiable Presentations.
#[derive(Error, Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
#[serde(tag = "error", content = "error_description")]
pub enum Error {
    /// The request is missing a required parameter, includes an unsupported
    /// parameter value, repeats a parameter, or is otherwise malformed.
    #[error(r#"{{"error": "invalid_request", "error_description": "{0}"}}"#)]
    InvalidRequest(String),

    /// No presentation session exists for the id: it was never created or
    /// has expired.
    #[error(r#"{{"error": "session_not_found", "error_description": "{0}"}}"#)]
    SessionNotFound(String),

    /// The requested credentials do not share a single format.
    #[error(r#"{{"error": "inconsistent_format", "error_description": "{0}"}}"#)]
    InconsistentFormat(String),

    /// The presentation format cannot be verified.
    #[error(r#"{{"error": "unsupported_format", "error_description": "{0}"}}"#)]
    UnsupportedFormat(String),

    /// One or more verification policies failed.
    #[error(r#"{{"error": "policy_evaluation_failure", "error_description": "{0}"}}"#)]
    PolicyEvaluationFailure(String),

    /// The verifier encountered an unexpected condition that prevented it
    /// from fulfilling the request.
    #[error(r#"{{"error": "server_error", "error_description": "{0}"}}"#)]
    ServerError(String),
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast_ref::<Self>() {
            Some(Self::InvalidRequest(e)) => Self::InvalidRequest(format!("{err}: {e}")),
            Some(Self::SessionNotFound(e)) => Self::SessionNotFound(format!("{err}: {e}")),
            Some(Self::InconsistentFormat(e)) => Self::InconsistentFormat(format!("{err}: {e}")),
            Some(Self::UnsupportedFormat(e)) => Self::UnsupportedFormat(format!("{err}: {e}")),
            Some(Self::PolicyEvaluationFailure(e)) => {
                Self::PolicyEvaluationFailure(format!("{err}: {e}"))
            }
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

#[cfg(test)]
mod test {
    use anyhow::Context;
    use serde_json::json;

    use super::*;

    #[test]
    fn session_context() {
        let result = Err::<(), Error>(Error::SessionNotFound("abc".to_string()))
            .context("looking up session");
        let err: Error = result.unwrap_err().into();

        assert_eq!(
            err.to_string(),
            r#"{"error": "session_not_found", "error_description": "looking up session: abc"}"#
        );
    }

    #[test]
    fn json() {
        let err = Error::InconsistentFormat("Credentials formats must be distinct".to_string());
        let ser = serde_json::to_value(&err).unwrap();
        assert_eq!(
            ser,
            json!({
                "error": "inconsistent_format",
                "error_description": "Credentials formats must be distinct"
            })
        );
    }
}
