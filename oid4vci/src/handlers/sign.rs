//! # Sign Endpoint
//!
//! Signs a credential document as a JWT without running an issuance flow.
//! The document is signed as given: no mapping is applied.

use tracing::instrument;

use crate::error::invalid;
use crate::handlers::{Body, Error, Handler, Request, Response, Result};
use crate::provider::Provider;
use crate::types::{SignRequest, SignResponse};

/// Sign request handler.
#[instrument(level = "debug", skip_all)]
async fn sign(_issuer: &str, request: SignRequest) -> Result<SignResponse> {
    if !request.credential.is_object() {
        return Err(invalid!("`credential` must be a JSON object"));
    }

    let credential = vcflow_vdc::sign_raw(
        &request.credential,
        &request.issuer_key,
        request.issuer_did.as_deref(),
        &request.subject_did,
    )
    .await?;
    Ok(SignResponse { credential })
}

impl<P: Provider> Handler<SignResponse, P> for Request<SignRequest> {
    type Error = Error;

    async fn handle(self, issuer: &str, _: &P) -> Result<impl Into<Response<SignResponse>>, Self::Error> {
        sign(issuer, self.body).await
    }
}

impl Body for SignRequest {}
