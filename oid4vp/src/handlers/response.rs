//! # Response Endpoint
//!
//! The wallet posts its Authorization Response here, to the `response_uri`
//! named in the request. With `direct_post` the `vp_token` arrives as a form
//! field; with `direct_post.jwt` the response parameters arrive as a JWE
//! encrypted to the session's ephemeral key.
//!
//! Each presentation is checked with the session's VP policies and each
//! credential it carries with the VC policies, or the override policies for
//! its type. Every requested type must be matched by a presented
//! credential; that check is recorded last, as its own entry. The outcome
//! is stored on the session, which accepts one response only.

use anyhow::Context as _;
use chrono::Utc;
use futures::future::join_all;
use serde_json::Value;
use tracing::instrument;
use vcflow_core::State;
use vcflow_jose::jwe;
use vcflow_policy::{
    CredentialResults, PolicyContext, PolicyResult, PresentationResults, Target, Verifiable,
    evaluate,
};
use vcflow_vdc::{Format, W3cVc};

use crate::config::VerifierConfig;
use crate::error::{invalid, server};
use crate::handlers::notify;
use crate::handlers::{Body, Error, Handler, Request, Response, Result};
use crate::provider::{Metadata, Policies, Provider, StateStore};
use crate::state::{self, Stored};
use crate::types::{
    PresentationDefinition, PresentationSession, ResponseMode, ResponseParameters,
    ResponseRequest, ResponseResponse, Verification,
};

const DEFINITION_CHECK: &str = "presentation-definition";

/// Response request handler.
#[instrument(level = "debug", skip(provider))]
async fn response(
    verifier: &str, provider: &impl Provider, request: ResponseRequest,
) -> Result<Response<ResponseResponse>> {
    let config = Metadata::verifier(provider, verifier).await.context("getting verifier metadata")?;

    let session_id = match (&request.session_id, &request.state) {
        (Some(id), Some(state)) if id != state => {
            return Err(invalid!("`state` does not match the response URI"));
        }
        (Some(id), _) | (None, Some(id)) => id.clone(),
        (None, None) => return Err(invalid!("response names no session")),
    };

    let locks = Policies::session_locks(provider);
    let guard = locks.lock(&session_id).await;
    let outcome = verify(&config, provider, &session_id, request).await;
    drop(guard);
    locks.release(&session_id);
    let session = outcome?;

    if let Some(callback) = &session.status_callback {
        notify::spawn(callback.clone(), &session, config.callback_timeout());
    }

    let Some(verification) = &session.verification else {
        return Err(server!("session `{session_id}` has no verification"));
    };
    let redirect_uri = session.redirect_uri(verification.success);

    if !verification.success && redirect_uri.is_none() {
        let failures = verification
            .results
            .failures()
            .iter()
            .map(|(policy, error)| format!("{policy}: {error}"))
            .collect::<Vec<_>>()
            .join("; ");
        return Err(Error::PolicyEvaluationFailure(failures));
    }

    let body = ResponseResponse {
        redirect_uri: redirect_uri.clone(),
    };
    Ok(Response::from(body).redirect(redirect_uri))
}

impl<P: Provider> Handler<ResponseResponse, P> for Request<ResponseRequest> {
    type Error = Error;

    async fn handle(
        self, verifier: &str, provider: &P,
    ) -> Result<impl Into<Response<ResponseResponse>>, Self::Error> {
        response(verifier, provider, self.body).await
    }
}

impl Body for ResponseRequest {}

// Verify the response and record the outcome on the session. Callers hold
// the session's lock.
async fn verify(
    config: &VerifierConfig, provider: &impl Provider, session_id: &str, request: ResponseRequest,
) -> Result<PresentationSession> {
    let key = state::key(session_id);
    let Some(state) = StateStore::get::<Stored>(provider, &key).await.context("retrieving state")? else {
        return Err(Error::SessionNotFound(format!("no session `{session_id}`")));
    };
    let expires_at = state.expires_at;
    let mut stored = state.body;

    if stored.session.verification.is_some() {
        return Err(invalid!("session `{session_id}` already has a response"));
    }
    if matches!(stored.session.format, Format::LdpVc | Format::MsoMdoc) {
        return Err(Error::UnsupportedFormat(format!(
            "{} presentations cannot be verified",
            stored.session.format
        )));
    }

    let parameters = parameters(&stored, request)?;
    if parameters.state.as_deref().is_some_and(|s| s != session_id) {
        return Err(invalid!("`state` does not match the session"));
    }

    let results = evaluate_presentations(config, provider, &stored.session, parameters).await?;
    let success = results.is_success();
    tracing::debug!(session_id, success, "response::verified");

    stored.session.verification = Some(Verification {
        success,
        results,
        verified_at: Utc::now(),
    });
    let state = State {
        body: stored,
        expires_at,
    };
    StateStore::put(provider, &key, &state).await.context("saving state")?;

    Ok(state.body.session)
}

// The response parameters, decrypted when the session expects an
// encrypted response.
fn parameters(stored: &Stored, request: ResponseRequest) -> Result<ResponseParameters> {
    match stored.session.response_mode {
        ResponseMode::DirectPost => {
            let Some(vp_token) = request.vp_token else {
                return Err(invalid!("response has no `vp_token`"));
            };
            Ok(ResponseParameters {
                vp_token,
                presentation_submission: request.presentation_submission,
                state: request.state,
            })
        }
        ResponseMode::DirectPostJwt => {
            let Some(encrypted) = request.response else {
                return Err(invalid!("response has no encrypted `response`"));
            };
            let Some(response_key) = &stored.response_key else {
                return Err(server!("session has no response encryption key"));
            };
            let plaintext = jwe::decrypt(&encrypted, response_key)
                .map_err(|e| invalid!("cannot decrypt response: {e}"))?;
            serde_json::from_slice(&plaintext)
                .map_err(|e| invalid!("malformed response parameters: {e}"))
        }
    }
}

async fn evaluate_presentations(
    config: &VerifierConfig, provider: &impl Provider, session: &PresentationSession,
    parameters: ResponseParameters,
) -> Result<PresentationResults> {
    let registry = Policies::registry(provider);
    let ctx = &PolicyContext {
        resolver: provider,
        now: Utc::now(),
        nonce: Some(session.authorization_request.nonce.as_str()),
        audience: Some(config.client_id.as_str()),
    };
    let vp_format = session.format.presentation_format();

    if parameters.vp_token.is_empty() {
        return Err(invalid!("`vp_token` holds no presentation"));
    }

    let mut results = vec![];
    let mut presented = vec![];

    for token in parameters.vp_token.to_vec() {
        let vp = Verifiable::decode(token, Target::Presentation(vp_format))
            .map_err(|e| invalid!("malformed presentation: {e}"))?;
        results.push(CredentialResults {
            credential: "presentation".to_string(),
            policy_results: evaluate(registry, &session.policies.vp_policies, &vp, ctx).await,
        });

        let credentials = credentials(&vp, session.format)?;
        let checks = credentials.iter().map(|vc| async move {
            let credential_type = credential_type(vc);
            let policies = session.policies.for_credential(credential_type.as_deref());
            let policy_results = evaluate(registry, policies, vc, ctx).await;
            CredentialResults {
                credential: credential_type.unwrap_or_else(|| "credential".to_string()),
                policy_results,
            }
        });
        results.extend(join_all(checks).await);
        presented.extend(credentials);
    }

    results.push(CredentialResults {
        credential: DEFINITION_CHECK.to_string(),
        policy_results: vec![match_definition(&session.presentation_definition, &presented)],
    });

    Ok(PresentationResults { results })
}

// The credentials carried by a presentation. An SD-JWT presentation is
// itself the credential.
fn credentials(vp: &Verifiable, format: Format) -> Result<Vec<Verifiable>> {
    if format.is_sd_jwt() {
        let credential = Verifiable::decode(vp.raw.clone(), Target::Credential(format))
            .map_err(|e| invalid!("malformed credential: {e}"))?;
        return Ok(vec![credential]);
    }

    let embedded = match vp.payload.get("vp").and_then(|vp| vp.get("verifiableCredential")) {
        None | Some(Value::Null) => vec![],
        Some(Value::Array(credentials)) => credentials.clone(),
        Some(single) => vec![single.clone()],
    };
    embedded
        .into_iter()
        .map(|credential| {
            let Value::String(raw) = credential else {
                return Err(invalid!("embedded credentials must be compact JWTs"));
            };
            Verifiable::decode(raw, Target::Credential(format))
                .map_err(|e| invalid!("malformed credential: {e}"))
        })
        .collect()
}

fn credential_type(vc: &Verifiable) -> Option<String> {
    let document = W3cVc::from_value(Value::Object(vc.document().clone())).ok()?;
    document
        .credential_type()
        .map(ToString::to_string)
        .or_else(|| vc.payload.get("vct").and_then(Value::as_str).map(ToString::to_string))
}

// Every input descriptor must be matched by at least one presented
// credential.
fn match_definition(definition: &PresentationDefinition, presented: &[Verifiable]) -> PolicyResult {
    let unmatched: Vec<&str> = definition
        .input_descriptors
        .iter()
        .filter(|d| !presented.iter().any(|vc| d.matches(&vc.payload).unwrap_or_default()))
        .map(|d| d.id.as_str())
        .collect();

    let description =
        Some("Checks the presented credentials satisfy the presentation definition".to_string());
    if unmatched.is_empty() {
        PolicyResult {
            policy: DEFINITION_CHECK.to_string(),
            description,
            is_success: true,
            result: Some(Value::from(definition.requested_types().collect::<Vec<_>>())),
            error: None,
        }
    } else {
        PolicyResult {
            policy: DEFINITION_CHECK.to_string(),
            description,
            is_success: false,
            result: None,
            error: Some(format!("no presented credential of type {}", unmatched.join(", "))),
        }
    }
}
