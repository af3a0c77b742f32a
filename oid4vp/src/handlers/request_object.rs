//! # Request Object Endpoint
//!
//! Serves a session's Authorization Request as a signed request object
//! (RFC 9101). The wallet arrives here from the `request_uri` in the
//! authorization URI when the verifier passes requests by reference, and
//! checks the signature against the verifier's `kid` before acting on the
//! request.
//!
//! A request object is only served while the session awaits its response.

use anyhow::Context as _;
use vcflow_jose::jws::{self, Header};

use crate::error::invalid;
use crate::handlers::{Body, Error, Handler, Request, Response, Result};
use crate::provider::{Provider, Signature, StateStore};
use crate::state::{self, Stored};
use crate::types::{
    REQUEST_OBJECT_TYP, RequestObject, RequestObjectRequest, RequestObjectResponse,
    SELF_ISSUED_AUDIENCE,
};

/// Request object handler.
async fn request_object(
    verifier: &str, provider: &impl Provider, request: RequestObjectRequest,
) -> Result<RequestObjectResponse> {
    let Some(state) = StateStore::get::<Stored>(provider, &state::key(&request.session_id))
        .await
        .context("retrieving state")?
    else {
        return Err(Error::SessionNotFound(format!(
            "no session `{}`: it may have expired",
            request.session_id
        )));
    };

    let session = state.body.session;
    if session.verification.is_some() {
        return Err(invalid!("session `{}` already has a response", session.id));
    }

    let authorization_request = session.authorization_request;
    let claims = RequestObject {
        iss: authorization_request.client_id.clone(),
        aud: SELF_ISSUED_AUDIENCE.to_string(),
        request: authorization_request,
    };

    let key = Signature::signing_key(provider, verifier).await.context("getting signing key")?;
    let kid = Signature::verification_method(provider, verifier)
        .await
        .context("getting verification method")?;
    let header = Header {
        typ: Some(REQUEST_OBJECT_TYP.to_string()),
        kid: Some(kid),
        ..Header::default()
    };
    let jwt = jws::encode(header, &claims, &key).await.context("signing request object")?;

    tracing::debug!(session_id = session.id, "request_object::signed");
    Ok(RequestObjectResponse(jwt))
}

impl<P: Provider> Handler<RequestObjectResponse, P> for Request<RequestObjectRequest> {
    type Error = Error;

    async fn handle(
        self, verifier: &str, provider: &P,
    ) -> Result<impl Into<Response<RequestObjectResponse>>, Self::Error> {
        request_object(verifier, provider, self.body).await
    }
}

impl Body for RequestObjectRequest {}
