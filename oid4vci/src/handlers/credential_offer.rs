//! # Credential Offer Endpoint
//!
//! This endpoint is used by the Wallet to retrieve a previously created
//! Credential Offer.
//!
//! When an offer is sent by reference, the wallet receives a
//! `credential_offer_uri` of the form `<credential_issuer>/credential_offer/<id>`
//! and fetches the offer from here. Each offer can be fetched once.

use anyhow::Context as _;

use crate::error::invalid;
use crate::handlers::{Body, Error, Handler, Request, Response, Result};
use crate::provider::{Provider, StateStore};
use crate::state;
use crate::types::{CredentialOffer, CredentialOfferRequest, CredentialOfferResponse};

/// Endpoint for the Wallet to request the Issuer's Credential Offer when
/// engaged in a cross-device flow.
async fn credential_offer(
    _issuer: &str, provider: &impl Provider, request: CredentialOfferRequest,
) -> Result<CredentialOfferResponse> {
    let key = state::key(state::OFFER, &request.id);
    let Some(state) =
        StateStore::take::<CredentialOffer>(provider, &key).await.context("retrieving offer")?
    else {
        return Err(invalid!("no credential offer found for `{}`", request.id));
    };

    Ok(CredentialOfferResponse(state.body))
}

impl<P: Provider> Handler<CredentialOfferResponse, P> for Request<CredentialOfferRequest> {
    type Error = Error;

    async fn handle(
        self, issuer: &str, provider: &P,
    ) -> Result<impl Into<Response<CredentialOfferResponse>>, Self::Error> {
        credential_offer(issuer, provider, self.body).await
    }
}

impl Body for CredentialOfferRequest {}
