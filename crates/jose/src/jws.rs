//! # JSON Web Signature (JWS)
//!
//! Compact serialization ([RFC7515]): `base64url(header).base64url(payload).
//! base64url(signature)`.
//!
//! [RFC7515]: https://www.rfc-editor.org/rfc/rfc7515

use anyhow::{Context, Result, anyhow, bail};
use base64ct::{Base64UrlUnpadded, Encoding};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::jwk::PublicKeyJwk;
use crate::key::{Algorithm, Signer};

/// Protected header of a JWS.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct Header {
    /// Signature algorithm.
    pub alg: Algorithm,

    /// Media type of the complete JWS.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub typ: Option<String>,

    /// Key identifier hint, usually a DID URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,

    /// Embedded public key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jwk: Option<PublicKeyJwk>,

    /// Any further header members.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A decoded JWT: header plus claims.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Jwt<T> {
    /// Protected header.
    pub header: Header,

    /// Claims (the JWS payload).
    pub claims: T,
}

/// Sign `claims` with `signer`, returning a compact JWS. The header `alg` is
/// always set from the signer.
///
/// # Errors
///
/// Returns an error if the claims cannot be serialized or signing fails.
pub async fn encode<T, S>(mut header: Header, claims: &T, signer: &S) -> Result<String>
where
    T: Serialize + Sync,
    S: Signer,
{
    header.alg = signer.algorithm();

    let header = Base64UrlUnpadded::encode_string(&serde_json::to_vec(&header)?);
    let payload = Base64UrlUnpadded::encode_string(&serde_json::to_vec(claims)?);
    let signing_input = format!("{header}.{payload}");

    let signature = signer.try_sign(signing_input.as_bytes()).await.context("signing JWS")?;
    let signature = Base64UrlUnpadded::encode_string(&signature);

    Ok(format!("{signing_input}.{signature}"))
}

/// Decode a compact JWS without verifying its signature. Use only to learn
/// which key should verify the token.
///
/// # Errors
///
/// Returns an error if the token is not a well-formed compact JWS.
pub fn decode_unverified<T: DeserializeOwned>(token: &str) -> Result<Jwt<T>> {
    let parts = split(token)?;
    let header: Header = serde_json::from_slice(&Base64UrlUnpadded::decode_vec(parts[0])?)
        .context("decoding JWS header")?;
    let claims: T = serde_json::from_slice(&Base64UrlUnpadded::decode_vec(parts[1])?)
        .context("decoding JWS payload")?;
    Ok(Jwt { header, claims })
}

/// Verify the signature of a compact JWS with `jwk`.
///
/// # Errors
///
/// Returns an error if the token is malformed, the header algorithm does not
/// match the key, or the signature does not verify.
pub fn verify(token: &str, jwk: &PublicKeyJwk) -> Result<()> {
    let parts = split(token)?;
    let header: Header = serde_json::from_slice(&Base64UrlUnpadded::decode_vec(parts[0])?)?;
    if header.alg != Algorithm::for_curve(jwk.crv) {
        bail!("JWS algorithm {} does not match key", header.alg);
    }
    let signature = Base64UrlUnpadded::decode_vec(parts[2]).context("decoding signature")?;
    let signing_input = &token[..parts[0].len() + 1 + parts[1].len()];
    jwk.verify(signing_input.as_bytes(), &signature)
}

/// Decode a compact JWS, verifying its signature with the key returned by
/// `resolve`. The resolver receives the unverified header.
///
/// # Errors
///
/// Returns an error if the key cannot be resolved or the signature does not
/// verify.
pub async fn decode<T, F, Fut>(token: &str, resolve: F) -> Result<Jwt<T>>
where
    T: DeserializeOwned,
    F: FnOnce(Header) -> Fut,
    Fut: Future<Output = Result<PublicKeyJwk>>,
{
    let jwt: Jwt<Value> = decode_unverified(token)?;
    let jwk = resolve(jwt.header.clone()).await?;
    verify(token, &jwk)?;
    Ok(Jwt {
        header: jwt.header,
        claims: serde_json::from_value(jwt.claims)?,
    })
}

fn split(token: &str) -> Result<[&str; 3]> {
    let parts: Vec<&str> = token.split('.').collect();
    let [header, payload, signature] = parts.as_slice() else {
        return Err(anyhow!("compact JWS must have 3 segments, found {}", parts.len()));
    };
    Ok([header, payload, signature])
}
