//! # DID Key
//!
//! The `did:key` method expands a public key into a DID document without any
//! network lookup. The method-specific identifier is the multibase
//! (base58btc, `z` prefix) encoding of the multicodec-prefixed public key.
//!
//! See <https://w3c-ccg.github.io/did-method-key>.

use std::sync::LazyLock;

use regex::Regex;
use vcflow_jose::{Curve, PublicKeyJwk};

use crate::document::{Document, VerificationMethod};
use crate::error::Error;

const ED25519_CODEC: [u8; 2] = [0xed, 0x01];
const P256_CODEC: [u8; 2] = [0x80, 0x24];

static DID_REGEX: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new("^did:key:(?<identifier>z[a-km-zA-HJ-NP-Z1-9]+)(#.*)?$").ok()
});

/// Build the `did:key` DID for a public key.
///
/// # Errors
///
/// Returns an error if the key material cannot be decoded.
pub fn did_from_jwk(jwk: &PublicKeyJwk) -> Result<String, Error> {
    Ok(format!("did:key:{}", multikey(jwk)?))
}

/// The multibase multikey encoding of a public key.
///
/// # Errors
///
/// Returns an error if the key material cannot be decoded.
pub fn multikey(jwk: &PublicKeyJwk) -> Result<String, Error> {
    let codec = match jwk.crv {
        Curve::Ed25519 => ED25519_CODEC,
        Curve::P256 => P256_CODEC,
    };
    let raw = jwk.to_bytes().map_err(|e| Error::InvalidPublicKey(e.to_string()))?;
    let mut bytes = codec.to_vec();
    bytes.extend(raw);
    Ok(format!("z{}", bs58::encode(bytes).into_string()))
}

/// Resolve a `did:key` DID (or DID URL) into its DID document.
///
/// # Errors
///
/// Returns [`Error::InvalidDid`] if the DID is malformed or carries an
/// unsupported key type.
pub fn resolve(did: &str) -> Result<Document, Error> {
    let regex = DID_REGEX.as_ref().ok_or_else(|| Error::InvalidDid("regex unavailable".into()))?;
    let Some(caps) = regex.captures(did) else {
        return Err(Error::InvalidDid(format!("{did} is not a valid did:key")));
    };
    let identifier = &caps["identifier"];

    let bytes = bs58::decode(&identifier[1..])
        .into_vec()
        .map_err(|e| Error::InvalidDid(format!("issue decoding key: {e}")))?;
    if bytes.len() < 2 {
        return Err(Error::InvalidDid("key too short".into()));
    }
    let (codec, raw) = bytes.split_at(2);
    let crv = match codec {
        c if c == ED25519_CODEC => Curve::Ed25519,
        c if c == P256_CODEC => Curve::P256,
        _ => return Err(Error::InvalidDid("unsupported key type".into())),
    };
    let jwk = PublicKeyJwk::from_bytes(crv, raw).map_err(|e| Error::InvalidPublicKey(e.to_string()))?;

    let did = format!("did:key:{identifier}");
    let kid = format!("{did}#{identifier}");
    Ok(Document {
        context: vec!["https://www.w3.org/ns/did/v1".into()],
        id: did.clone(),
        verification_method: vec![VerificationMethod {
            id: kid.clone(),
            type_: "JsonWebKey2020".into(),
            controller: did,
            public_key_jwk: Some(jwk),
            public_key_multibase: Some(identifier.to_string()),
        }],
        authentication: vec![kid.clone().into()],
        assertion_method: vec![kid.into()],
    })
}
