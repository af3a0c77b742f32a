//! # Authorization Response
//!
//! The wallet's response to an Authorization Request, posted to the
//! session's `response_uri`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use vcflow_core::OneMany;

/// The wallet's Authorization Response.
///
/// With `direct_post` the response parameters arrive as form fields. With
/// `direct_post.jwt` they arrive encrypted in `response`.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct ResponseRequest {
    /// The session id taken from the response URI path. Falls back to
    /// `state` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,

    /// One presentation or several.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vp_token: Option<OneMany<String>>,

    /// Maps presented credentials to input descriptors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub presentation_submission: Option<Value>,

    /// The request `state`: the session id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,

    /// The encrypted response parameters (`direct_post.jwt`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
}

/// Response parameters carried inside an encrypted `response`.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct ResponseParameters {
    /// One presentation or several.
    pub vp_token: OneMany<String>,

    /// Maps presented credentials to input descriptors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub presentation_submission: Option<Value>,

    /// The request `state`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

/// Where to send the wallet next.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct ResponseResponse {
    /// The configured success or error redirect, `$id` replaced by the
    /// session id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_uri: Option<String>,
}
