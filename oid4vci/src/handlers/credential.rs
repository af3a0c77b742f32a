//! # Credential Endpoint
//!
//! The Credential Endpoint issues a Credential as approved by the End-User
//! upon presentation of a valid Access Token representing this approval.
//!
//! The wallet proves possession of its key with a proof JWT whose `kid` is
//! the holder's DID URL and whose `nonce` is the `c_nonce` from the token
//! response. The nonce locates the issuance session; the holder DID becomes
//! the credential subject.

use anyhow::Context as _;
use serde_json::Value;
use vcflow_core::{State, generate};
use vcflow_did::Resolver;
use vcflow_jose::jws::{self, Jwt};
use vcflow_vdc::{Format, IssueRequest, JwtOptions, SystemEnvironment};

use super::demo;
use crate::config::IssuerConfig;
use crate::error::{invalid, server};
use crate::handlers::{Body, CredentialHeaders, Error, Handler, Request, Response, Result};
use crate::provider::{Metadata, Provider, StateStore};
use crate::state::{self, Bound, Deferred, Pending, Token};
use crate::types::{CredentialRequest, CredentialResponse, PROOF_JWT_TYP, Proof, ProofClaims};

/// Credential request handler.
async fn credential(
    issuer: &str, provider: &impl Provider, request: Request<CredentialRequest, CredentialHeaders>,
) -> Result<CredentialResponse> {
    let config = Metadata::issuer(provider, issuer).await.context("getting issuer metadata")?;
    let token = authorize(provider, request.headers.token()).await?;

    let request = request.body;
    check_format(request.format)?;

    let proof = HolderProof::decode(request.proof.as_ref())?;
    let (Some(holder_did), Some(nonce)) = (proof.holder_did(), proof.nonce()) else {
        if config.demo_fallback {
            return demo::credential(request.format, proof.holder_did()).await;
        }
        return Err(Error::InvalidProof("proof must carry a holder `kid` and a `nonce`".to_string()));
    };

    let bound = bound_session(provider, nonce).await?;
    if nonce != token.c_nonce {
        return Err(Error::InvalidProof("proof `nonce` was not issued with this access token".to_string()));
    }
    proof.verify(provider, &config).await?;

    let pending = select(&bound.pending, request.credential_configuration_id.as_deref())?;
    if config.defer_issuance {
        return defer(provider, &config, request.format, holder_did, pending.clone()).await;
    }

    let credential = issue(request.format, pending, holder_did).await?;
    Ok(CredentialResponse::Credential {
        format: request.format,
        credential: Value::String(credential),
    })
}

impl<P: Provider> Handler<CredentialResponse, P> for Request<CredentialRequest, CredentialHeaders> {
    type Error = Error;

    async fn handle(
        self, issuer: &str, provider: &P,
    ) -> Result<impl Into<Response<CredentialResponse>>, Self::Error> {
        credential(issuer, provider, self).await
    }
}

impl Body for CredentialRequest {}

/// Look up the access token.
pub(super) async fn authorize(provider: &impl Provider, access_token: &str) -> Result<Token> {
    let key = state::key(state::TOKEN, access_token);
    let Some(state) = StateStore::get::<Token>(provider, &key).await.context("retrieving token")? else {
        return Err(Error::InvalidToken("access token is unknown or expired".to_string()));
    };
    Ok(state.body)
}

/// The issuance session bound to `nonce` at the token endpoint. The session
/// stays in place for further requests.
pub(super) async fn bound_session(provider: &impl Provider, nonce: &str) -> Result<Bound> {
    let key = state::key(state::NONCE, nonce);
    let Some(state) = StateStore::get::<Bound>(provider, &key).await.context("retrieving session")? else {
        return Err(Error::UnmappedNonce(format!("no issuance session is bound to nonce `{nonce}`")));
    };
    Ok(state.body)
}

/// Formats the issuer cannot sign are rejected outright.
pub(super) fn check_format(format: Format) -> Result<()> {
    match format {
        Format::MsoMdoc | Format::LdpVc => {
            Err(Error::UnsupportedCredentialFormat(format!("`{format}` credentials cannot be issued")))
        }
        Format::JwtVcJson | Format::JwtVc | Format::JwtVcJsonLd | Format::SdJwtVc => Ok(()),
    }
}

fn select<'a>(pending: &'a [Pending], configuration_id: Option<&str>) -> Result<&'a Pending> {
    let Some(configuration_id) = configuration_id else {
        return pending.first().ok_or_else(|| server!("issuance session holds no credentials"));
    };
    pending
        .iter()
        .find(|p| p.request.credential_configuration_id == configuration_id)
        .ok_or_else(|| invalid!("credential configuration `{configuration_id}` was not offered"))
}

pub(super) async fn defer(
    provider: &impl Provider, config: &IssuerConfig, format: Format, holder_did: &str, pending: Pending,
) -> Result<CredentialResponse> {
    let transaction_id = generate::session_id();
    let deferred = Deferred {
        format,
        holder_did: holder_did.to_string(),
        pending,
    };
    let state = State::new(deferred, config.deferred_ttl()?)?;
    StateStore::put(provider, &state::key(state::DEFERRED, &transaction_id), &state)
        .await
        .context("saving state")?;

    tracing::debug!(transaction_id, "credential::deferred");
    Ok(CredentialResponse::TransactionId { transaction_id })
}

/// Issue `pending` in `format` to the holder.
pub(super) async fn issue(format: Format, pending: &Pending, holder_did: &str) -> Result<String> {
    let request = &pending.request;
    let issue = IssueRequest {
        template: request.credential_data.clone(),
        mapping: request.mapping.clone(),
        issuer_did: pending.issuer_did.clone(),
        issuer_kid: request.issuer_kid.clone(),
        subject_did: holder_did.to_string(),
        options: JwtOptions::default(),
        env: &SystemEnvironment,
    };

    let credential = match format {
        Format::SdJwtVc => {
            vcflow_vdc::issue_sd_jwt_vc(&issue, &request.issuer_key, request.selective_disclosure.as_ref())
                .await
        }
        Format::JwtVcJson | Format::JwtVc | Format::JwtVcJsonLd => {
            vcflow_vdc::issue_jwt_vc(&issue, &request.issuer_key).await
        }
        Format::MsoMdoc | Format::LdpVc => {
            return Err(Error::UnsupportedCredentialFormat(format!("`{format}` credentials cannot be issued")));
        }
    };
    credential.map_err(|e| server!("issue signing credential: {e:#}"))
}

/// A decoded (not yet verified) proof of possession JWT.
pub(super) struct HolderProof {
    jwt: String,
    decoded: Jwt<ProofClaims>,
}

impl HolderProof {
    pub(super) fn decode(proof: Option<&Proof>) -> Result<Self> {
        let Some(Proof::Jwt { jwt }) = proof else {
            return Err(Error::InvalidProof("proof not set".to_string()));
        };
        let decoded = jws::decode_unverified(jwt)
            .map_err(|e| Error::InvalidProof(format!("issue decoding proof JWT: {e}")))?;
        Ok(Self {
            jwt: jwt.clone(),
            decoded,
        })
    }

    /// The holder key's DID URL.
    pub(super) fn kid(&self) -> Option<&str> {
        self.decoded.header.kid.as_deref()
    }

    /// The holder DID: the `kid` without its fragment.
    pub(super) fn holder_did(&self) -> Option<&str> {
        self.kid().map(|kid| kid.split_once('#').map_or(kid, |(did, _)| did))
    }

    pub(super) fn nonce(&self) -> Option<&str> {
        self.decoded.claims.nonce.as_deref()
    }

    /// Check the proof's type and audience, and its signature against the
    /// key its `kid` resolves to.
    pub(super) async fn verify(&self, resolver: &dyn Resolver, config: &IssuerConfig) -> Result<()> {
        tracing::debug!("credential::verify_proof");

        if self.decoded.header.typ.as_deref() != Some(PROOF_JWT_TYP) {
            return Err(Error::InvalidProof(format!("proof `typ` must be `{PROOF_JWT_TYP}`")));
        }
        if self.decoded.claims.aud != config.credential_issuer {
            return Err(Error::InvalidProof("proof `aud` is not this issuer".to_string()));
        }

        let Some(kid) = self.kid() else {
            return Err(Error::InvalidProof("proof `kid` is missing".to_string()));
        };
        let jwk = vcflow_did::resolve_jwk(kid, resolver)
            .await
            .map_err(|e| Error::InvalidProof(format!("issue resolving holder key: {e}")))?;
        jws::verify(&self.jwt, &jwk)
            .map_err(|e| Error::InvalidProof(format!("proof signature is invalid: {e}")))
    }
}
