//! # Verification Policies
//!
//! A verification policy is a named check run against a presentation or one
//! of the credentials it carries. Policies are held in a [`PolicyRegistry`]
//! and requested by name, optionally with arguments:
//!
//! ```json
//! ["signature", "expired", {"policy": "minimum-credentials", "args": 2}]
//! ```
//!
//! [`evaluate`] runs every requested policy concurrently and reports a
//! [`PolicyResult`] for each: a failing policy never prevents the others from
//! running.

pub mod builtin;
mod error;
mod registry;

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use vcflow_did::Resolver;
use vcflow_jose::jws;
use vcflow_vdc::{Format, VpFormat};

pub use crate::error::Error;
pub use crate::registry::PolicyRegistry;

/// A named verification check.
#[async_trait]
pub trait Policy: Send + Sync {
    /// Unique name the policy is requested by.
    fn name(&self) -> &str;

    /// Human-readable description.
    fn description(&self) -> &str;

    /// Check `data`, returning a result value on success.
    ///
    /// # Errors
    ///
    /// Returns an error describing why the check failed.
    async fn verify(
        &self, data: &Verifiable, args: Option<&Value>, ctx: &PolicyContext<'_>,
    ) -> anyhow::Result<Value>;
}

/// What a policy is evaluated against.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Target {
    /// The presentation as a whole.
    Presentation(VpFormat),

    /// A single presented credential.
    Credential(Format),
}

/// A presentation or credential submitted for verification.
#[derive(Clone, Debug)]
pub struct Verifiable {
    /// The token as received.
    pub raw: String,

    /// Presentation or credential, and its format.
    pub target: Target,

    /// The decoded (but not yet verified) payload.
    pub payload: Map<String, Value>,

    /// Number of credentials presented. One for a credential.
    pub credentials: usize,
}

impl Verifiable {
    /// Decode a JWT (or the issuer-signed part of an SD-JWT) without
    /// verifying it.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is not a well-formed JWS.
    pub fn decode(raw: impl Into<String>, target: Target) -> anyhow::Result<Self> {
        let raw = raw.into();
        let jws = raw.split_once('~').map_or(raw.as_str(), |(jws, _)| jws);
        let payload: Map<String, Value> = jws::decode_unverified(jws)?.claims;

        let credentials = match (target, payload.get("vp")) {
            (Target::Presentation(VpFormat::SdJwtVc) | Target::Credential(_), _) => 1,
            (Target::Presentation(_), Some(vp)) => match vp.get("verifiableCredential") {
                Some(Value::Array(vcs)) => vcs.len(),
                None | Some(Value::Null) => 0,
                Some(_) => 1,
            },
            (Target::Presentation(_), None) => 0,
        };

        Ok(Self {
            raw,
            target,
            payload,
            credentials,
        })
    }

    /// Whether this is a presentation.
    #[must_use]
    pub const fn is_presentation(&self) -> bool {
        matches!(self.target, Target::Presentation(_))
    }

    /// The credential document: the `vc` claim when present, otherwise the
    /// payload itself.
    #[must_use]
    pub fn document(&self) -> &Map<String, Value> {
        match self.payload.get("vc") {
            Some(Value::Object(vc)) => vc,
            _ => &self.payload,
        }
    }
}

/// Evaluation environment shared by the policies of one verification.
pub struct PolicyContext<'a> {
    /// DID resolution for signature checks.
    pub resolver: &'a dyn Resolver,

    /// Evaluation time.
    pub now: DateTime<Utc>,

    /// Nonce of the authorization request, checked by presentation
    /// signature policies.
    pub nonce: Option<&'a str>,

    /// The verifier's client identifier, checked as the presentation
    /// audience.
    pub audience: Option<&'a str>,
}

impl fmt::Debug for PolicyContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PolicyContext")
            .field("now", &self.now)
            .field("nonce", &self.nonce)
            .field("audience", &self.audience)
            .finish_non_exhaustive()
    }
}

/// A policy requested by name, optionally with arguments.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum PolicyRequest {
    /// Name only.
    Name(String),

    /// Name plus arguments.
    WithArgs {
        /// Policy name.
        policy: String,

        /// Policy-specific arguments.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        args: Option<Value>,
    },
}

impl PolicyRequest {
    /// The requested policy's name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Name(name) | Self::WithArgs { policy: name, .. } => name,
        }
    }

    /// The request's arguments.
    #[must_use]
    pub const fn args(&self) -> Option<&Value> {
        match self {
            Self::Name(_) => None,
            Self::WithArgs { args, .. } => args.as_ref(),
        }
    }
}

impl From<&str> for PolicyRequest {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

/// Outcome of a single policy.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct PolicyResult {
    /// Policy name.
    pub policy: String,

    /// Policy description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Whether the check passed.
    pub is_success: bool,

    /// Value produced by a passing check.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,

    /// Why the check failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Policy results for one presentation or credential.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct CredentialResults {
    /// What was checked: `presentation` or the credential type.
    pub credential: String,

    /// One result per requested policy.
    pub policy_results: Vec<PolicyResult>,
}

/// Policy results for a whole presentation.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct PresentationResults {
    /// Results for the presentation, then for each credential.
    pub results: Vec<CredentialResults>,
}

impl PresentationResults {
    /// Whether every policy for the presentation and every credential
    /// passed. Nothing checked is not a success.
    #[must_use]
    pub fn is_success(&self) -> bool {
        !self.results.is_empty()
            && self.results.iter().all(|r| r.policy_results.iter().all(|p| p.is_success))
    }

    /// Failed policies as `(policy, error)`.
    #[must_use]
    pub fn failures(&self) -> Vec<(&str, &str)> {
        self.results
            .iter()
            .flat_map(|r| &r.policy_results)
            .filter(|p| !p.is_success)
            .map(|p| (p.policy.as_str(), p.error.as_deref().unwrap_or_default()))
            .collect()
    }
}

/// Run each requested policy against `data`. Policies run concurrently and
/// all run to completion. Requests naming an unregistered policy yield a
/// failed result.
pub async fn evaluate(
    registry: &PolicyRegistry, requests: &[PolicyRequest], data: &Verifiable, ctx: &PolicyContext<'_>,
) -> Vec<PolicyResult> {
    let checks = requests.iter().map(|request| async move {
        let name = request.name();
        let Some(policy) = registry.get(name) else {
            return PolicyResult {
                policy: name.to_string(),
                error: Some(Error::UnknownPolicy(name.to_string()).to_string()),
                ..PolicyResult::default()
            };
        };

        let outcome = policy.verify(data, request.args(), ctx).await;
        tracing::debug!(policy = name, success = outcome.is_ok(), "policy::evaluate");

        let description = Some(policy.description().to_string());
        match outcome {
            Ok(result) => PolicyResult {
                policy: name.to_string(),
                description,
                is_success: true,
                result: Some(result),
                error: None,
            },
            Err(e) => PolicyResult {
                policy: name.to_string(),
                description,
                is_success: false,
                result: None,
                error: Some(format!("{e:#}")),
            },
        }
    });
    join_all(checks).await
}
