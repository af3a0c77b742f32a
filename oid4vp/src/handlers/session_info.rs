//! # Session Info Endpoint
//!
//! Reports a presentation session, including the verification outcome once
//! the wallet has responded.

use anyhow::Context as _;

use crate::handlers::{Body, Error, Handler, Request, Response, Result};
use crate::provider::{Provider, StateStore};
use crate::state::{self, Stored};
use crate::types::{SessionInfoRequest, SessionInfoResponse};

/// Session info request handler.
async fn session_info(
    _verifier: &str, provider: &impl Provider, request: SessionInfoRequest,
) -> Result<SessionInfoResponse> {
    let Some(state) = StateStore::get::<Stored>(provider, &state::key(&request.session_id))
        .await
        .context("retrieving state")?
    else {
        return Err(Error::SessionNotFound(format!(
            "no session `{}`: it may have expired",
            request.session_id
        )));
    };
    Ok(SessionInfoResponse(state.body.session))
}

impl<P: Provider> Handler<SessionInfoResponse, P> for Request<SessionInfoRequest> {
    type Error = Error;

    async fn handle(
        self, verifier: &str, provider: &P,
    ) -> Result<impl Into<Response<SessionInfoResponse>>, Self::Error> {
        session_info(verifier, provider, self.body).await
    }
}

impl Body for SessionInfoRequest {}
