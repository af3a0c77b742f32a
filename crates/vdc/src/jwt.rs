//! # Signature Scheme
//!
//! Binds a credential payload to an issuer key and DID as a compact JWS.
//!
//! Signing embeds `iss`, `sub` and `vc` plus any caller-supplied claims.
//! Verification never trusts key material embedded in the token: the signer
//! is identified by the header `kid` (a DID URL) or the `iss` claim and
//! resolved to a key through a [`Resolver`].

use anyhow::Result;
use serde_json::{Map, Value};
use vcflow_did::Resolver;
use vcflow_jose::Signer;
use vcflow_jose::jws::{self, Header, Jwt};

use crate::error::Error;

/// Caller-supplied JWT header and payload additions.
#[derive(Clone, Debug, Default)]
pub struct JwtOptions {
    /// Header `kid`. Defaults to the signer's key id.
    pub kid: Option<String>,

    /// Additional header members.
    pub headers: Map<String, Value>,

    /// Additional payload claims. These are applied last and so may replace
    /// derived claims.
    pub claims: Map<String, Value>,
}

/// Sign `vc` as a JWT credential with `iss` set to `issuer_did` and `sub` to
/// `subject_did`.
///
/// # Errors
///
/// Returns an error if the signer fails or the payload cannot be serialized.
pub async fn sign<S: Signer>(
    vc: &Value, signer: &S, issuer_did: &str, subject_did: &str, options: &JwtOptions,
) -> Result<String> {
    let mut claims = Map::new();
    claims.insert("iss".into(), issuer_did.into());
    claims.insert("sub".into(), subject_did.into());
    claims.insert("vc".into(), vc.clone());
    sign_claims(claims, signer, "JWT", options).await
}

/// Sign an arbitrary claim set. `typ` is used unless the caller's headers
/// carry their own.
///
/// # Errors
///
/// Returns an error if the signer fails or the payload cannot be serialized.
pub async fn sign_claims<S: Signer>(
    mut claims: Map<String, Value>, signer: &S, typ: &str, options: &JwtOptions,
) -> Result<String> {
    for (name, value) in &options.claims {
        claims.insert(name.clone(), value.clone());
    }

    // typed header fields are lifted out of the extra members so each is
    // serialized once
    let mut extra = options.headers.clone();
    extra.remove("alg");
    let typ = match extra.remove("typ") {
        Some(Value::String(typ)) => typ,
        _ => typ.to_string(),
    };
    let kid = match (&options.kid, extra.remove("kid")) {
        (Some(kid), _) => kid.clone(),
        (None, Some(Value::String(kid))) => kid,
        _ => signer.key_id().await?,
    };

    let header = Header {
        typ: Some(typ),
        kid: Some(kid),
        extra,
        ..Header::default()
    };
    jws::encode(header, &claims, signer).await
}

/// Verify a JWT (or the issuer-signed part of an SD-JWT), returning its
/// payload.
///
/// # Errors
///
/// Returns [`Error::SignatureVerification`] if the token is malformed, the
/// signer cannot be resolved, or the signature does not verify.
pub async fn verify(token: &str, resolver: &dyn Resolver) -> Result<Map<String, Value>, Error> {
    let jws = token.split_once('~').map_or(token, |(jws, _)| jws);

    let jwt: Jwt<Map<String, Value>> =
        jws::decode_unverified(jws).map_err(|e| Error::signature(format!("malformed token: {e}")))?;
    let did_url = signer_identity(&jwt.header, &jwt.claims)?;
    tracing::debug!(did_url, "jwt::verify");

    let jwk = vcflow_did::resolve_jwk(&did_url, resolver).await?;
    jws::verify(jws, &jwk).map_err(|e| Error::signature(e.to_string()))?;

    Ok(jwt.claims)
}

/// The DID URL identifying the key a token was signed with.
///
/// A `kid` naming a DID URL wins, provided it belongs to the `iss` DID when
/// both are present. A fragment-only `kid` is resolved against `iss`.
pub(crate) fn signer_identity(header: &Header, claims: &Map<String, Value>) -> Result<String, Error> {
    let iss = claims.get("iss").and_then(Value::as_str).filter(|iss| iss.starts_with("did:"));
    let kid = header.kid.as_deref();

    match (kid, iss) {
        (Some(kid), iss) if kid.starts_with("did:") => {
            let kid_did = kid.split_once('#').map_or(kid, |(did, _)| did);
            if let Some(iss) = iss
                && iss != kid_did
            {
                return Err(Error::signature(format!("kid {kid} does not belong to issuer {iss}")));
            }
            Ok(kid.to_string())
        }
        (Some(fragment), Some(iss)) if fragment.starts_with('#') => Ok(format!("{iss}{fragment}")),
        (_, Some(iss)) => Ok(iss.to_string()),
        _ => Err(Error::signature("token identifies no signer")),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use vcflow_jose::{Curve, LocalKey};

    use super::*;
    use crate::test_support::{NoNetwork, did_key};

    #[tokio::test]
    async fn sign_then_verify() {
        let key = LocalKey::generate(Curve::Ed25519).unwrap();
        let issuer = did_key(&key);
        let vc = json!({"type": ["VerifiableCredential"], "credentialSubject": {"id": "did:key:z6MkHolder"}});

        let options = JwtOptions {
            kid: Some(format!("{issuer}#{}", issuer.trim_start_matches("did:key:"))),
            headers: json!({"typ": "JWT", "x-trace": "1"}).as_object().cloned().unwrap(),
            claims: json!({"jti": "urn:uuid:1"}).as_object().cloned().unwrap(),
        };
        let token = sign(&vc, &key, &issuer, "did:key:z6MkHolder", &options).await.unwrap();

        let jwt: Jwt<Value> = jws::decode_unverified(&token).unwrap();
        assert_eq!(jwt.header.typ.as_deref(), Some("JWT"));
        assert_eq!(jwt.header.extra["x-trace"], "1");

        let payload = verify(&token, &NoNetwork).await.unwrap();
        assert_eq!(payload["iss"], issuer.as_str());
        assert_eq!(payload["sub"], "did:key:z6MkHolder");
        assert_eq!(payload["vc"], vc);
        assert_eq!(payload["jti"], "urn:uuid:1");
    }

    #[tokio::test]
    async fn wrong_issuer() {
        let key = LocalKey::generate(Curve::P256).unwrap();
        let other = did_key(&LocalKey::generate(Curve::P256).unwrap());

        // signed by `key` but claims another did:key as issuer
        let token = sign(&json!({}), &key, &other, "did:key:z6MkHolder", &JwtOptions {
            kid: Some("#0".into()),
            ..JwtOptions::default()
        })
        .await
        .unwrap();

        let Err(Error::SignatureVerification { .. }) = verify(&token, &NoNetwork).await else {
            panic!("expected signature verification failure");
        };
    }

    #[test]
    fn identity() {
        let header = Header {
            kid: Some("did:web:other.example#key-1".into()),
            ..Header::default()
        };
        let claims = json!({"iss": "did:web:issuer.example"}).as_object().cloned().unwrap();
        assert!(signer_identity(&header, &claims).is_err());

        let header = Header {
            kid: Some("#key-1".into()),
            ..Header::default()
        };
        assert_eq!(signer_identity(&header, &claims).unwrap(), "did:web:issuer.example#key-1");

        let claims = json!({"iss": "https://issuer.example"}).as_object().cloned().unwrap();
        assert!(signer_identity(&Header::default(), &claims).is_err());
    }
}
