//! # Presentation Definition Endpoint
//!
//! Serves a session's presentation definition to wallets sent it by
//! reference.

use anyhow::Context as _;

use crate::handlers::{Body, Error, Handler, Request, Response, Result};
use crate::provider::{Provider, StateStore};
use crate::state::{self, Stored};
use crate::types::{PresentationDefinitionRequest, PresentationDefinitionResponse};

async fn presentation_definition(
    _verifier: &str, provider: &impl Provider, request: PresentationDefinitionRequest,
) -> Result<PresentationDefinitionResponse> {
    let Some(state) = StateStore::get::<Stored>(provider, &state::key(&request.session_id))
        .await
        .context("retrieving state")?
    else {
        return Err(Error::SessionNotFound(format!("no session `{}`", request.session_id)));
    };
    Ok(PresentationDefinitionResponse(state.body.session.presentation_definition))
}

impl<P: Provider> Handler<PresentationDefinitionResponse, P>
    for Request<PresentationDefinitionRequest>
{
    type Error = Error;

    async fn handle(
        self, verifier: &str, provider: &P,
    ) -> Result<impl Into<Response<PresentationDefinitionResponse>>, Self::Error> {
        presentation_definition(verifier, provider, self.body).await
    }
}

impl Body for PresentationDefinitionRequest {}
