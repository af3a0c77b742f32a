//! # Batch Credential Endpoint
//!
//! The Batch Credential Endpoint issues every credential in the issuance
//! session in one response.
//!
//! All requests in a batch must share one credential format and carry
//! proofs from one holder key. Every proof is checked as it would be at the
//! Credential Endpoint, against the access token's `c_nonce`.

use anyhow::Context as _;
use serde_json::Value;

use super::credential::{HolderProof, authorize, bound_session, check_format, defer, issue};
use crate::error::invalid;
use crate::handlers::{BatchCredentialHeaders, Body, Error, Handler, Request, Response, Result};
use crate::provider::{Metadata, Provider};
use crate::types::{BatchCredentialRequest, BatchCredentialResponse, CredentialResponse};

/// Batch credential request handler.
async fn batch_credential(
    issuer: &str, provider: &impl Provider,
    request: Request<BatchCredentialRequest, BatchCredentialHeaders>,
) -> Result<BatchCredentialResponse> {
    let config = Metadata::issuer(provider, issuer).await.context("getting issuer metadata")?;
    let token = authorize(provider, request.headers.token()).await?;

    let requests = request.body.credential_requests;
    let Some(first) = requests.first() else {
        return Err(invalid!("no credential requests"));
    };

    let format = first.format;
    if requests.iter().any(|r| r.format != format) {
        return Err(invalid!("credential requests do not share a format"));
    }
    check_format(format)?;

    let proofs =
        requests.iter().map(|r| HolderProof::decode(r.proof.as_ref())).collect::<Result<Vec<_>>>()?;
    let kid = proofs.first().and_then(HolderProof::kid);
    if proofs.iter().any(|p| p.kid() != kid) {
        return Err(invalid!("more than one holder key in batch"));
    }

    let mut holder_did = None;
    for proof in &proofs {
        let (Some(did), Some(nonce)) = (proof.holder_did(), proof.nonce()) else {
            return Err(Error::InvalidProof("proof must carry a holder `kid` and a `nonce`".to_string()));
        };
        if nonce != token.c_nonce {
            return Err(Error::InvalidProof(
                "proof `nonce` was not issued with this access token".to_string(),
            ));
        }
        proof.verify(provider, &config).await?;
        holder_did = Some(did);
    }
    let Some(holder_did) = holder_did else {
        return Err(invalid!("no credential requests"));
    };
    let bound = bound_session(provider, &token.c_nonce).await?;

    let mut credential_responses = Vec::with_capacity(bound.pending.len());
    for pending in &bound.pending {
        let response = if config.defer_issuance {
            defer(provider, &config, format, holder_did, pending.clone()).await?
        } else {
            CredentialResponse::Credential {
                format,
                credential: Value::String(issue(format, pending, holder_did).await?),
            }
        };
        credential_responses.push(response);
    }

    tracing::debug!(issued = credential_responses.len(), "batch_credential::issued");
    Ok(BatchCredentialResponse { credential_responses })
}

impl<P: Provider> Handler<BatchCredentialResponse, P>
    for Request<BatchCredentialRequest, BatchCredentialHeaders>
{
    type Error = Error;

    async fn handle(
        self, issuer: &str, provider: &P,
    ) -> Result<impl Into<Response<BatchCredentialResponse>>, Self::Error> {
        batch_credential(issuer, provider, self).await
    }
}

impl Body for BatchCredentialRequest {}
