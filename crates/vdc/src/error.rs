//! # Credential Errors

use thiserror::Error;

/// Errors raised while issuing or verifying credentials.
#[derive(Error, Debug)]
pub enum Error {
    /// The token signature could not be verified, either because the signer
    /// could not be resolved to a key or because the signature is invalid.
    #[error("signature verification failed: {reason}")]
    SignatureVerification {
        /// What went wrong.
        reason: String,

        /// The resolution failure, when resolution was the cause.
        #[source]
        resolution: Option<vcflow_did::Error>,
    },

    /// The credential format is not supported by this operation.
    #[error("unsupported credential format: {0}")]
    UnsupportedFormat(String),

    /// The credential or presentation is malformed or fails a check.
    #[error("invalid credential: {0}")]
    InvalidCredential(String),

    /// Any other failure.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    pub(crate) fn signature(reason: impl Into<String>) -> Self {
        Self::SignatureVerification {
            reason: reason.into(),
            resolution: None,
        }
    }
}

impl From<vcflow_did::Error> for Error {
    fn from(err: vcflow_did::Error) -> Self {
        Self::SignatureVerification {
            reason: format!("issue resolving signer: {err}"),
            resolution: Some(err),
        }
    }
}
