//! # Endpoint
//!
//! `Endpoint` provides the entry point for the `OpenID4VP` API. Requests are
//! routed to the appropriate handler for processing, returning a response
//! that can be serialized to JSON or mapped onto HTTP.

mod create_request;
pub mod notify;
mod presentation_definition;
mod request_object;
mod response;
mod session_info;

use std::fmt::Debug;

use tracing::instrument;
pub use vcflow_core::api::{Body, Handler, Headers, NoHeaders, Request, Response};

pub use crate::error::Error;
use crate::provider::Provider;

/// Result type for `OpenID` for Verifiable Presentations.
pub type Result<T, E = Error> = anyhow::Result<T, E>;

/// Handle incoming `OpenID` for Verifiable Presentations requests.
///
/// # Errors
///
/// This method can fail for a number of reasons related to the incoming
/// message's viability. Expected failures include unknown or expired
/// sessions, mixed credential formats, and failed verification policies.
///
/// Implementers should look to the Error type and description for more
/// information on the reason for failure.
#[instrument(level = "debug", skip(provider))]
pub async fn handle<B, H, P, U>(
    verifier: &str, request: impl Into<Request<B, H>> + Debug, provider: &P,
) -> Result<Response<U>>
where
    B: Body,
    H: Headers,
    P: Provider,
    Request<B, H>: Handler<U, P, Error = Error>,
{
    let request: Request<B, H> = request.into();
    Ok(request.handle(verifier, provider).await?.into())
}
