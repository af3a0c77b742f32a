//! # Create Offer Handler
//!
//! The `create_offer` handler registers the credentials to issue as a new
//! issuance session and returns a Credential Offer for the wallet.
//!
//! The session id doubles as the pre-authorized code: the wallet exchanges
//! it at the token endpoint, which consumes the session.
//!
//! See <https://openid.net/specs/openid-4-verifiable-credential-issuance-1_0.html#name-credential-offer-endpoint>

use anyhow::Context as _;
use vcflow_core::{State, generate, urlencode};
use vcflow_jose::Signer;

use crate::config::IssuerConfig;
use crate::error::invalid;
use crate::handlers::{Body, Error, Handler, Request, Response, Result};
use crate::provider::{Metadata, Provider, StateStore};
use crate::state::{self, Offered, Pending};
use crate::types::{
    CREDENTIAL_OFFER_SCHEME, CreateOfferRequest, CreateOfferResponse, CredentialOffer, Grants,
    IssuanceRequest, OfferType, PreAuthorizedCodeGrant, SendType, TxCode,
};

/// Credential Offer request handler generates and returns a Credential Offer.
async fn create_offer(
    issuer: &str, provider: &impl Provider, request: CreateOfferRequest,
) -> Result<Response<CreateOfferResponse>> {
    let config = Metadata::issuer(provider, issuer).await.context("getting issuer metadata")?;
    request.verify(&config)?;

    let session_id = request.session_id.clone().unwrap_or_else(generate::session_id);
    let tx_code = request.tx_code_required.then(generate::tx_code);

    let mut pending = Vec::with_capacity(request.credentials.len());
    for credential in request.credentials {
        pending.push(settle(credential).await?);
    }
    let credential_offer = CredentialOffer {
        credential_issuer: config.credential_issuer.clone(),
        credential_configuration_ids: pending
            .iter()
            .map(|p| p.request.credential_configuration_id.clone())
            .collect(),
        grants: Some(Grants {
            pre_authorized_code: Some(PreAuthorizedCodeGrant {
                pre_authorized_code: session_id.clone(),
                tx_code: tx_code.as_ref().map(|code| TxCode {
                    input_mode: Some("numeric".to_string()),
                    length: Some(code.len()),
                    description: None,
                }),
            }),
        }),
    };

    // save session to state, keyed by the pre-authorized code
    let offered = Offered {
        pending,
        tx_code: tx_code.clone(),
    };
    let state = State::new(offered, config.offer_ttl()?)?;
    StateStore::put(provider, &state::key(state::SESSION, &session_id), &state)
        .await
        .context("saving state")?;

    let base = config.cross_device_base.as_deref().unwrap_or(CREDENTIAL_OFFER_SCHEME);

    // respond with Offer object or uri?
    let send_type = request.send_type.unwrap_or(config.offer_delivery);
    let (offer_type, offer_uri) = match send_type {
        SendType::ByVal => {
            let offer_uri = format!("{base}?{}", credential_offer.to_querystring()?);
            (OfferType::Object(credential_offer), offer_uri)
        }
        SendType::ByRef => {
            let uri_token = generate::uri_token();
            let state = State::new(credential_offer, config.offer_ttl()?)?;
            StateStore::put(provider, &state::key(state::OFFER, &uri_token), &state)
                .await
                .context("saving state")?;

            let uri = format!("{}/credential_offer/{uri_token}", config.credential_issuer);
            let offer_uri =
                format!("{base}?credential_offer_uri={}", urlencode::encode_component(&uri));
            (OfferType::Uri(uri), offer_uri)
        }
    };

    tracing::debug!(session_id, "create_offer::created");

    Ok(Response::created(CreateOfferResponse {
        session_id,
        offer_uri,
        offer_type,
        tx_code,
    }))
}

impl<P: Provider> Handler<CreateOfferResponse, P> for Request<CreateOfferRequest> {
    type Error = Error;

    async fn handle(
        self, issuer: &str, provider: &P,
    ) -> Result<impl Into<Response<CreateOfferResponse>>, Self::Error> {
        create_offer(issuer, provider, self.body).await
    }
}

impl Body for CreateOfferRequest {}

impl CreateOfferRequest {
    fn verify(&self, config: &IssuerConfig) -> Result<()> {
        tracing::debug!("create_offer::verify");

        if self.credentials.is_empty() {
            return Err(invalid!("no credentials requested"));
        }
        for credential in &self.credentials {
            if !config.supports(&credential.credential_configuration_id) {
                return Err(invalid!(
                    "unsupported credential configuration `{}`",
                    credential.credential_configuration_id
                ));
            }
            if !credential.credential_data.is_object() {
                return Err(invalid!("`credential_data` must be a JSON object"));
            }
        }
        Ok(())
    }
}

// Fix the issuer DID now so every credential in the session is issued under
// the same identity.
async fn settle(request: IssuanceRequest) -> Result<Pending> {
    let issuer_did = match &request.issuer_did {
        Some(did) => did.clone(),
        None => {
            let jwk = request.issuer_key.public_jwk().await.context("getting issuer key")?;
            vcflow_did::key::did_from_jwk(&jwk)
                .map_err(|e| invalid!("issue deriving issuer DID: {e}"))?
        }
    };
    Ok(Pending {
        issuer_did,
        request,
    })
}
