//! # Request Resolution
//!
//! Wallet-side helpers: check a signed request object, and obtain the
//! presentation definition an Authorization Request asks for, whether
//! carried by value or by reference.

use anyhow::{Context as _, Result, bail};
use vcflow_did::Resolver;
use vcflow_jose::jws::{self, Jwt};

use crate::types::{
    AuthorizationRequest, PresentationDefinition, REQUEST_OBJECT_TYP, RequestObject,
    SELF_ISSUED_AUDIENCE,
};

/// Verify a signed request object and return the Authorization Request it
/// carries. The signing key is resolved from the header `kid`.
///
/// # Errors
///
/// Returns an error if the object is not a request object, its signature
/// does not verify, or its issuer is not the requesting client.
pub async fn verify_request_object(jwt: &str, resolver: &dyn Resolver) -> Result<AuthorizationRequest> {
    let decoded: Jwt<RequestObject> = jws::decode(jwt, |header| async move {
        if header.typ.as_deref() != Some(REQUEST_OBJECT_TYP) {
            bail!("request object `typ` must be `{REQUEST_OBJECT_TYP}`");
        }
        let Some(kid) = header.kid else {
            bail!("request object has no `kid`");
        };
        Ok(vcflow_did::resolve_jwk(&kid, resolver).await?)
    })
    .await
    .context("verifying request object")?;

    let claims = decoded.claims;
    if claims.iss != claims.request.client_id {
        bail!("request object issuer `{}` is not its client", claims.iss);
    }
    if claims.aud != SELF_ISSUED_AUDIENCE {
        bail!("request object audience `{}` is not a wallet", claims.aud);
    }
    Ok(claims.request)
}

/// Resolve the presentation definition of `request`, fetching it with
/// `client` when sent by reference.
///
/// # Errors
///
/// Returns an error if the request carries neither a definition nor a
/// definition URI, or the definition cannot be fetched.
pub async fn resolve_presentation_definition(
    request: &AuthorizationRequest, client: &reqwest::Client,
) -> Result<PresentationDefinition> {
    if let Some(definition) = &request.presentation_definition {
        return Ok(definition.clone());
    }
    let Some(uri) = &request.presentation_definition_uri else {
        bail!("authorization request has no presentation definition");
    };

    tracing::debug!(uri, "resolve::presentation_definition");
    let response = client.get(uri).send().await.context("fetching presentation definition")?;
    let definition =
        response.error_for_status()?.json().await.context("parsing presentation definition")?;
    Ok(definition)
}
