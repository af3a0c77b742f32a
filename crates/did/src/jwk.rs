//! # DID JWK
//!
//! The `did:jwk` method encodes a public JWK directly into the DID as
//! base64url JSON. The single verification method has fragment `#0`.
//!
//! See <https://github.com/quartzjer/did-jwk/blob/main/spec.md>.

use base64ct::{Base64UrlUnpadded, Encoding};
use vcflow_jose::PublicKeyJwk;

use crate::document::{Document, VerificationMethod};
use crate::error::Error;

/// Build the `did:jwk` DID for a public key.
///
/// # Errors
///
/// Returns an error if the JWK cannot be serialized.
pub fn did_from_jwk(jwk: &PublicKeyJwk) -> Result<String, Error> {
    let json = serde_json::to_vec(jwk).map_err(|e| Error::InvalidPublicKey(e.to_string()))?;
    Ok(format!("did:jwk:{}", Base64UrlUnpadded::encode_string(&json)))
}

/// Resolve a `did:jwk` DID (or DID URL) into its DID document.
///
/// # Errors
///
/// Returns [`Error::InvalidDid`] if the identifier is not a base64url JWK.
pub fn resolve(did: &str) -> Result<Document, Error> {
    let Some(rest) = did.strip_prefix("did:jwk:") else {
        return Err(Error::InvalidDid(format!("{did} is not a valid did:jwk")));
    };
    let identifier = rest.split('#').next().unwrap_or_default();
    let decoded = Base64UrlUnpadded::decode_vec(identifier)
        .map_err(|e| Error::InvalidDid(format!("issue decoding did:jwk: {e}")))?;
    let jwk: PublicKeyJwk = serde_json::from_slice(&decoded)
        .map_err(|e| Error::InvalidDid(format!("did:jwk is not a JWK: {e}")))?;

    let did = format!("did:jwk:{identifier}");
    let kid = format!("{did}#0");
    Ok(Document {
        context: vec!["https://www.w3.org/ns/did/v1".into()],
        id: did.clone(),
        verification_method: vec![VerificationMethod {
            id: kid.clone(),
            type_: "JsonWebKey2020".into(),
            controller: did,
            public_key_jwk: Some(jwk),
            public_key_multibase: None,
        }],
        authentication: vec![kid.clone().into()],
        assertion_method: vec![kid.into()],
    })
}

#[cfg(test)]
mod tests {
    use vcflow_jose::{Curve, KeyType};

    use super::*;

    #[test]
    fn round_trip() {
        let jwk = PublicKeyJwk {
            kty: KeyType::Okp,
            crv: Curve::Ed25519,
            x: "11qYAYKxCrfVS_7TyWQHOg7hcvPapiMlrwIaaPcHURo".into(),
            ..PublicKeyJwk::default()
        };
        let did = did_from_jwk(&jwk).unwrap();
        let doc = resolve(&format!("{did}#0")).unwrap();
        assert_eq!(doc.id, did);
        assert_eq!(doc.verification_method[0].public_key_jwk.as_ref(), Some(&jwk));
    }
}
