//! # Deferred Credential Endpoint
//!
//! This endpoint is used to issue a Credential previously requested at the
//! Credential Endpoint in cases where the Credential Issuer was not able to
//! immediately issue this Credential.
//!
//! A deferred request is issued once. Redemption takes the request from
//! state in a single atomic step, so of several concurrent claims only one
//! is served. Unclaimed requests expire; [`sweep_deferred`] evicts them
//! eagerly.

use anyhow::Context as _;
use serde_json::Value;
use vcflow_core::state::sweep;

use super::credential::issue;
use crate::handlers::{Body, Error, Handler, Request, Response, Result};
use crate::provider::{Provider, StateStore};
use crate::state::{self, DEFERRED, Deferred};
use crate::types::{CredentialResponse, DeferredCredentialRequest, DeferredCredentialResponse};

/// Deferred credential request handler.
async fn deferred(
    _issuer: &str, provider: &impl Provider, request: DeferredCredentialRequest,
) -> Result<DeferredCredentialResponse> {
    get_or_generate_deferred(provider, &request.transaction_id).await
}

/// Issue the credential for a deferred request.
async fn get_or_generate_deferred(
    provider: &impl Provider, transaction_id: &str,
) -> Result<CredentialResponse> {
    let key = state::key(DEFERRED, transaction_id);
    let Some(state) =
        StateStore::take::<Deferred>(provider, &key).await.context("taking deferred request")?
    else {
        return Err(Error::InvalidTransactionId(format!("unknown transaction id `{transaction_id}`")));
    };

    let deferred = &state.body;
    let credential = match issue(deferred.format, &deferred.pending, &deferred.holder_did).await {
        Ok(credential) => credential,
        Err(e) => {
            // failed issuance can be retried
            StateStore::put(provider, &key, &state).await.context("restoring deferred request")?;
            return Err(e);
        }
    };

    Ok(CredentialResponse::Credential {
        format: deferred.format,
        credential: Value::String(credential),
    })
}

impl<P: Provider> Handler<DeferredCredentialResponse, P> for Request<DeferredCredentialRequest> {
    type Error = Error;

    async fn handle(
        self, issuer: &str, provider: &P,
    ) -> Result<impl Into<Response<DeferredCredentialResponse>>, Self::Error> {
        deferred(issuer, provider, self.body).await
    }
}

impl Body for DeferredCredentialRequest {}

/// Remove expired deferred requests, returning the number removed.
///
/// # Errors
///
/// Returns an error if the store cannot be read or written.
pub async fn sweep_deferred(provider: &impl Provider) -> Result<usize> {
    let removed = sweep(provider, DEFERRED).await.context("sweeping deferred requests")?;
    tracing::debug!(removed, "deferred::sweep");
    Ok(removed)
}
