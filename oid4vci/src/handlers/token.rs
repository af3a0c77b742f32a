//! # Token Endpoint
//!
//! The Token Endpoint issues an Access Token in exchange for the
//! pre-authorized code carried by a credential offer.
//!
//! The exchange binds the issuance session to a fresh `c_nonce`: the
//! session is removed from under its id in a single atomic step and stored
//! again under the nonce. Once exchanged, the pre-authorized code is no
//! longer recognised.
//!
//! The authorization server MUST include the HTTP "Cache-Control" response
//! header field with a value of "no-store" in any response containing tokens.

use anyhow::Context as _;
use vcflow_core::state::expiry;
use vcflow_core::{State, generate};

use crate::handlers::{Body, Error, Handler, Request, Response, Result};
use crate::provider::{Metadata, Provider, StateStore};
use crate::state::{self, Bound, Offered, Token};
use crate::types::{TokenGrantType, TokenRequest, TokenResponse, TokenType};

/// Token request handler.
async fn token(issuer: &str, provider: &impl Provider, request: TokenRequest) -> Result<TokenResponse> {
    let config = Metadata::issuer(provider, issuer).await.context("getting issuer metadata")?;

    let TokenGrantType::PreAuthorizedCode {
        pre_authorized_code,
        tx_code,
    } = request.grant_type;

    // only one caller can take the session
    let session_key = state::key(state::SESSION, &pre_authorized_code);
    let Some(offered) =
        StateStore::take::<Offered>(provider, &session_key).await.context("taking session")?
    else {
        return Err(Error::UnmappedSessionId(format!(
            "no pending issuance for session `{pre_authorized_code}`"
        )));
    };

    if let Some(expected) = &offered.body.tx_code
        && tx_code.as_ref() != Some(expected)
    {
        // a mistyped code leaves the session in place
        StateStore::put(provider, &session_key, &offered).await.context("restoring session")?;
        return Err(Error::InvalidGrant("invalid transaction code".to_string()));
    }

    let c_nonce = generate::nonce();
    let access_token = generate::uri_token();
    let ttl = config.access_token_ttl()?;
    let expires_at = expiry(ttl)?;

    let bound = State {
        body: Bound {
            session_id: pre_authorized_code,
            pending: offered.body.pending,
        },
        expires_at,
    };
    StateStore::put(provider, &state::key(state::NONCE, &c_nonce), &bound)
        .await
        .context("saving state")?;

    let token = State {
        body: Token {
            c_nonce: c_nonce.clone(),
        },
        expires_at,
    };
    StateStore::put(provider, &state::key(state::TOKEN, &access_token), &token)
        .await
        .context("saving state")?;

    tracing::debug!(session_id = bound.body.session_id, "token::bound");

    let expires_in = ttl.num_seconds();
    Ok(TokenResponse {
        access_token,
        token_type: TokenType::Bearer,
        expires_in,
        c_nonce,
        c_nonce_expires_in: expires_in,
    })
}

impl<P: Provider> Handler<TokenResponse, P> for Request<TokenRequest> {
    type Error = Error;

    async fn handle(
        self, issuer: &str, provider: &P,
    ) -> Result<impl Into<Response<TokenResponse>>, Self::Error> {
        token(issuer, provider, self.body).await
    }
}

impl Body for TokenRequest {}
