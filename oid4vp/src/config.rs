//! # Verifier Configuration
//!
//! Settings for a single verifier, handed to the library through
//! [`crate::provider::Metadata`].

use std::time::Duration;

use anyhow::{Result, anyhow};
use chrono::TimeDelta;
use serde::{Deserialize, Serialize};

/// Verifier settings.
///
/// ```json
/// {
///   "client_id": "https://verifier.example",
///   "response_uri": "https://verifier.example/openid4vc/verify"
/// }
/// ```
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct VerifierConfig {
    /// The verifier's client identifier. Presentations must name it as
    /// their audience.
    pub client_id: String,

    /// Base of the endpoint the wallet posts its response to. The session
    /// id is appended as a path segment.
    pub response_uri: String,

    /// Base of the endpoint serving presentation definitions. When set,
    /// definitions are sent by reference (`presentation_definition_uri`)
    /// rather than inline.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub definition_uri: Option<String>,

    /// Base of the endpoint serving signed request objects. When set, the
    /// authorization URI carries only `client_id` and a `request_uri`
    /// pointing here; the wallet fetches the full request as a signed JWT.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_object_uri: Option<String>,

    /// Lifetime of a presentation session, in seconds.
    #[serde(default = "default_session_ttl")]
    pub session_ttl_secs: i64,

    /// Prefix of the authorization request URI handed to wallets.
    #[serde(default = "default_authorize_base_url")]
    pub authorize_base_url: String,

    /// Timeout for status callback delivery, in seconds.
    #[serde(default = "default_callback_timeout")]
    pub callback_timeout_secs: u64,
}

const fn default_session_ttl() -> i64 {
    300
}

fn default_authorize_base_url() -> String {
    "openid4vp://authorize".to_string()
}

const fn default_callback_timeout() -> u64 {
    10
}

impl VerifierConfig {
    /// Default settings for the verifier `client_id`, receiving responses at
    /// `response_uri`.
    #[must_use]
    pub fn new(client_id: impl Into<String>, response_uri: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            response_uri: response_uri.into(),
            definition_uri: None,
            request_object_uri: None,
            session_ttl_secs: default_session_ttl(),
            authorize_base_url: default_authorize_base_url(),
            callback_timeout_secs: default_callback_timeout(),
        }
    }

    /// Presentation session lifetime.
    ///
    /// # Errors
    ///
    /// Returns an error when `session_ttl_secs` is out of range.
    pub fn session_ttl(&self) -> Result<TimeDelta> {
        TimeDelta::try_seconds(self.session_ttl_secs).ok_or_else(|| {
            anyhow!("invalid configuration: `session_ttl_secs` = {} is out of range", self.session_ttl_secs)
        })
    }

    /// Status callback timeout.
    #[must_use]
    pub const fn callback_timeout(&self) -> Duration {
        Duration::from_secs(self.callback_timeout_secs)
    }

    /// Where the wallet posts its response for `session_id`.
    #[must_use]
    pub fn response_uri_for(&self, session_id: &str) -> String {
        format!("{}/{session_id}", self.response_uri.trim_end_matches('/'))
    }

    /// Where the presentation definition for `session_id` is served, when
    /// definitions are sent by reference.
    #[must_use]
    pub fn definition_uri_for(&self, session_id: &str) -> Option<String> {
        self.definition_uri.as_ref().map(|base| format!("{}/{session_id}", base.trim_end_matches('/')))
    }

    /// Where the signed request object for `session_id` is served, when
    /// requests are passed by reference.
    #[must_use]
    pub fn request_object_uri_for(&self, session_id: &str) -> Option<String> {
        self.request_object_uri
            .as_ref()
            .map(|base| format!("{}/{session_id}", base.trim_end_matches('/')))
    }
}
