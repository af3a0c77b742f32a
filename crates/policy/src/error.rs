//! # Policy Errors

use thiserror::Error;

/// Errors raised while registering or requesting policies.
#[derive(Error, Debug)]
pub enum Error {
    /// A policy with the same name is already registered.
    #[error("policy `{0}` is already registered")]
    DuplicatePolicyName(String),

    /// No policy is registered under the requested name.
    #[error("no policy named `{0}`")]
    UnknownPolicy(String),

    /// The policy's arguments are missing or malformed.
    #[error("invalid arguments for policy `{policy}`: {reason}")]
    InvalidArguments {
        /// Policy name.
        policy: String,

        /// What is wrong with the arguments.
        reason: String,
    },

    /// Any other failure.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    pub(crate) fn arguments(policy: &str, reason: impl Into<String>) -> Self {
        Self::InvalidArguments {
            policy: policy.to_string(),
            reason: reason.into(),
        }
    }
}
