//! # Endpoint
//!
//! `Endpoint` provides the entry point for the `OpenID4VCI` API. Requests
//! are routed to the appropriate handler for processing, returning a
//! response that can be serialized to JSON or mapped onto HTTP.

mod batch_credential;
mod create_offer;
mod credential;
mod credential_offer;
mod deferred;
mod demo;
mod metadata;
mod sign;
mod token;

use std::fmt::Debug;

use tracing::instrument;
pub use vcflow_core::api::{Body, Handler, Headers, NoHeaders, Request, Response};

pub use self::deferred::sweep_deferred;
pub use crate::error::Error;
use crate::provider::Provider;

/// Result type for `OpenID` for Verifiable Credential Issuance.
pub type Result<T, E = Error> = anyhow::Result<T, E>;

/// Handle incoming messages.
///
/// # Errors
///
/// This method can fail for a number of reasons related to the incoming
/// message's viability. Expected failures include unknown or consumed
/// sessions, invalid proofs, and unsupported credential formats.
///
/// Implementers should look to the Error type and description for more
/// information on the reason for failure.
#[instrument(level = "debug", skip(provider))]
pub async fn handle<B, H, P, U>(
    issuer: &str, request: impl Into<Request<B, H>> + Debug, provider: &P,
) -> Result<Response<U>>
where
    B: Body,
    H: Headers,
    P: Provider,
    Request<B, H>: Handler<U, P, Error = Error>,
{
    let request: Request<B, H> = request.into();
    Ok(request.handle(issuer, provider).await?.into())
}

/// Credential request headers.
pub type CredentialHeaders = AuthorizationHeader;

/// Batch credential request headers.
pub type BatchCredentialHeaders = AuthorizationHeader;

/// An authorization-only header for use by handlers that need to verify
/// an access token.
#[derive(Clone, Debug)]
pub struct AuthorizationHeader {
    /// The `authorization` header: the access token, with or without the
    /// `Bearer ` prefix.
    pub authorization: String,
}

impl Headers for AuthorizationHeader {}

impl AuthorizationHeader {
    /// The bare access token.
    #[must_use]
    pub fn token(&self) -> &str {
        self.authorization.strip_prefix("Bearer ").unwrap_or(&self.authorization).trim()
    }
}
