//! # Create Request Handler
//!
//! Creates a presentation session and the Authorization Request to send to
//! a wallet.
//!
//! The request goes to the wallet inline, as query parameters, or by
//! reference to a signed request object when the verifier serves one.
//!
//! All requested credentials must share one format. Unless the request
//! says otherwise, SD-JWT presentations are checked with
//! `sd-jwt-vc-signature` (and their credentials with nothing further),
//! while every other format checks `signature` on both the presentation
//! and each credential.

use std::collections::BTreeMap;

use anyhow::Context as _;
use tracing::instrument;
use vcflow_core::{State, generate};
use vcflow_jose::{Curve, Jwks, LocalKey, PublicKeyJwk};
use vcflow_policy::PolicyRequest;
use vcflow_vdc::Format;

use crate::error::invalid;
use crate::handlers::{Body, Error, Handler, Request, Response, Result};
use crate::provider::{Metadata, Policies, Provider, StateStore};
use crate::state::{self, Stored};
use crate::types::{
    AuthorizationRequest, ClientMetadata, CreateRequestRequest, CreateRequestResponse,
    PresentationDefinition, PresentationSession, RequestReference, ResponseMode, SessionPolicies,
};

/// Create a presentation session.
#[instrument(level = "debug", skip(provider))]
async fn create_request(
    verifier: &str, provider: &impl Provider, request: CreateRequestRequest,
) -> Result<CreateRequestResponse> {
    let config = Metadata::verifier(provider, verifier).await.context("getting verifier metadata")?;

    let format = shared_format(&request)?;
    let policies = session_policies(&request, format);
    let registry = Policies::registry(provider);
    let all = [&policies.vp_policies, &policies.vc_policies]
        .into_iter()
        .chain(policies.specific_policies.values());
    for requests in all {
        registry.check(requests).map_err(|e| invalid!("{e}"))?;
    }

    let session_id = request.session_id.clone().unwrap_or_else(generate::session_id);
    let definition = PresentationDefinition::for_types(
        generate::uri_token(),
        request.request_credentials.iter().map(|c| c.credential_type().to_string()),
        format,
    );

    let response_key = match request.response_mode {
        ResponseMode::DirectPost => None,
        ResponseMode::DirectPostJwt => {
            Some(LocalKey::generate(Curve::P256).context("generating response encryption key")?.jwk)
        }
    };

    let authorization_request = AuthorizationRequest {
        response_type: "vp_token".to_string(),
        client_id: config.client_id.clone(),
        response_mode: request.response_mode,
        response_uri: config.response_uri_for(&session_id),
        nonce: generate::nonce(),
        state: session_id.clone(),
        presentation_definition: config.definition_uri.is_none().then(|| definition.clone()),
        presentation_definition_uri: config.definition_uri_for(&session_id),
        client_metadata: Some(client_metadata(format, response_key.as_ref().map(|k| &k.public))),
    };

    let query = match config.request_object_uri_for(&session_id) {
        Some(request_uri) => RequestReference {
            client_id: config.client_id.clone(),
            request_uri,
        }
        .to_querystring(),
        None => authorization_request.to_querystring(),
    };
    let query = query.context("encoding authorization request")?;
    let request_uri = format!("{}?{query}", config.authorize_base_url);

    let session = PresentationSession {
        id: session_id.clone(),
        format,
        response_mode: request.response_mode,
        authorization_request: authorization_request.clone(),
        presentation_definition: definition,
        policies,
        success_redirect_uri: request.success_redirect_uri,
        error_redirect_uri: request.error_redirect_uri,
        status_callback: request.status_callback,
        verification: None,
    };
    let stored = Stored { session, response_key };
    let state = State::new(stored, config.session_ttl()?)?;
    StateStore::put(provider, &state::key(&session_id), &state).await.context("saving state")?;

    tracing::debug!(session_id, %format, "create_request::created");
    Ok(CreateRequestResponse {
        session_id,
        request_uri,
        request: authorization_request,
    })
}

impl<P: Provider> Handler<CreateRequestResponse, P> for Request<CreateRequestRequest> {
    type Error = Error;

    async fn handle(
        self, verifier: &str, provider: &P,
    ) -> Result<impl Into<Response<CreateRequestResponse>>, Self::Error> {
        create_request(verifier, provider, self.body).await
    }
}

impl Body for CreateRequestRequest {}

// The single format shared by every requested credential.
fn shared_format(request: &CreateRequestRequest) -> Result<Format> {
    let Some(first) = request.request_credentials.first() else {
        return Err(invalid!("no credentials requested"));
    };
    let format = first.format();
    if request.request_credentials.iter().any(|c| c.format() != format) {
        return Err(Error::InconsistentFormat("Credentials formats must be distinct".to_string()));
    }
    Ok(format)
}

fn session_policies(request: &CreateRequestRequest, format: Format) -> SessionPolicies {
    let (vp_default, vc_default): (&[&str], &[&str]) = if format.is_sd_jwt() {
        (&["sd-jwt-vc-signature"], &[])
    } else {
        (&["signature"], &["signature"])
    };
    let defaults = |names: &[&str]| names.iter().copied().map(PolicyRequest::from).collect::<Vec<_>>();

    let specific_policies: BTreeMap<String, Vec<PolicyRequest>> = request
        .request_credentials
        .iter()
        .filter_map(|c| Some((c.credential_type().to_string(), c.policies()?.to_vec())))
        .collect();

    SessionPolicies {
        vp_policies: request.vp_policies.clone().unwrap_or_else(|| defaults(vp_default)),
        vc_policies: request.vc_policies.clone().unwrap_or_else(|| defaults(vc_default)),
        specific_policies,
    }
}

fn client_metadata(format: Format, response_key: Option<&PublicKeyJwk>) -> ClientMetadata {
    let vp_formats = serde_json::Map::from_iter([(
        format.presentation_format().to_string(),
        serde_json::json!({"alg": ["EdDSA", "ES256"]}),
    )]);

    match response_key {
        Some(jwk) => ClientMetadata {
            jwks: Some(Jwks { keys: vec![jwk.clone()] }),
            authorization_encrypted_response_alg: Some("ECDH-ES".to_string()),
            authorization_encrypted_response_enc: Some("A256GCM".to_string()),
            vp_formats,
        },
        None => ClientMetadata {
            vp_formats,
            ..ClientMetadata::default()
        },
    }
}
