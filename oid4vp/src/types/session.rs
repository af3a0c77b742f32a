//! # Presentation Session
//!
//! A presentation session as reported to the verifying application.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use vcflow_policy::{PolicyRequest, PresentationResults};
use vcflow_vdc::Format;

use super::presentation_definition::PresentationDefinition;
use super::request::{AuthorizationRequest, ResponseMode, StatusCallback};

/// A presentation session.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct PresentationSession {
    /// Session id.
    pub id: String,

    /// The shared format of the requested credentials.
    pub format: Format,

    /// How the wallet returns its response.
    pub response_mode: ResponseMode,

    /// The Authorization Request sent to the wallet.
    pub authorization_request: AuthorizationRequest,

    /// What the wallet was asked for.
    pub presentation_definition: PresentationDefinition,

    /// Policies run against the response.
    pub policies: SessionPolicies,

    /// Redirect after a successful verification.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success_redirect_uri: Option<String>,

    /// Redirect after a failed verification.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_redirect_uri: Option<String>,

    /// Notified when the verification completes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_callback: Option<StatusCallback>,

    /// The outcome, once the wallet has responded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification: Option<Verification>,
}

impl PresentationSession {
    /// The redirect for the verification outcome, `$id` replaced by the
    /// session id.
    #[must_use]
    pub fn redirect_uri(&self, success: bool) -> Option<String> {
        let template = if success { &self.success_redirect_uri } else { &self.error_redirect_uri };
        template.as_ref().map(|uri| uri.replace("$id", &self.id))
    }
}

/// Policies for a session.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct SessionPolicies {
    /// Run against each presentation.
    pub vp_policies: Vec<PolicyRequest>,

    /// Run against each presented credential without an override.
    pub vc_policies: Vec<PolicyRequest>,

    /// Per credential type, replacing `vc_policies`.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub specific_policies: BTreeMap<String, Vec<PolicyRequest>>,
}

impl SessionPolicies {
    /// The policies to run against a credential of `credential_type`.
    #[must_use]
    pub fn for_credential(&self, credential_type: Option<&str>) -> &[PolicyRequest] {
        credential_type
            .and_then(|t| self.specific_policies.get(t))
            .unwrap_or(&self.vc_policies)
    }
}

/// The outcome of verifying a wallet's response.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct Verification {
    /// Whether every policy passed.
    pub success: bool,

    /// Per-policy results for the presentation and each credential.
    pub results: PresentationResults,

    /// When the response was verified.
    pub verified_at: DateTime<Utc>,
}

/// Look up a presentation session.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct SessionInfoRequest {
    /// Session id.
    pub session_id: String,
}

/// A presentation session.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct SessionInfoResponse(pub PresentationSession);
