//! # SD-JWT Verification

use std::collections::HashMap;

use serde_json::{Map, Value};
use vcflow_did::Resolver;
use vcflow_jose::PublicKeyJwk;
use vcflow_jose::jws::{self, Jwt};

use crate::error::Error;
use crate::sd_jwt::{Disclosure, KB_JWT_TYP, KbJwtClaims, SD_ALG, sd_hash};

/// Values a Key Binding JWT must carry.
#[derive(Clone, Copy, Debug)]
pub struct KbExpectations<'a> {
    /// Nonce of the authorization request.
    pub nonce: &'a str,

    /// Client identifier of the verifier.
    pub aud: &'a str,
}

/// A verified SD-JWT with its disclosures applied.
#[derive(Clone, Debug)]
pub struct Disclosed {
    /// Issuer-signed payload with every presented disclosure substituted
    /// back in. `_sd` and `_sd_alg` members are removed.
    pub payload: Map<String, Value>,

    /// The disclosures presented.
    pub disclosures: Vec<Disclosure>,

    /// Key Binding JWT claims, when the token carried one.
    pub key_binding: Option<KbJwtClaims>,
}

/// Verify an SD-JWT, and its Key Binding JWT when present.
///
/// The issuer signature is checked against the key resolved from the
/// issuer-signed JWT. Every presented disclosure must be referenced by a
/// digest. With `expect` set, a Key Binding JWT signed by the holder key
/// (`cnf.jwk`, `cnf.kid` or the `sub` DID) and carrying the expected
/// `nonce` and `aud` is required.
///
/// # Errors
///
/// Returns [`Error::SignatureVerification`] for signature failures and
/// [`Error::InvalidCredential`] for structural or binding failures.
pub async fn verify(
    token: &str, resolver: &dyn Resolver, expect: Option<KbExpectations<'_>>,
) -> Result<Disclosed, Error> {
    let Some(last) = token.rfind('~') else {
        return Err(invalid("SD-JWT has no disclosure separator"));
    };
    let (presented, kb_jwt) = token.split_at(last + 1);

    let mut segments = presented.split('~');
    let issuer_jwt = segments.next().unwrap_or_default();
    let mut pending = HashMap::new();
    for encoded in segments.filter(|s| !s.is_empty()) {
        let disclosure = Disclosure::decode(encoded).map_err(|e| invalid(e.to_string()))?;
        if pending.insert(sd_hash(encoded), disclosure).is_some() {
            return Err(invalid("duplicate disclosure"));
        }
    }

    let mut payload = crate::jwt::verify(issuer_jwt, resolver).await?;
    tracing::debug!(disclosures = pending.len(), "sd_jwt::verify");

    match payload.remove("_sd_alg") {
        None => {}
        Some(Value::String(alg)) if alg == SD_ALG => {}
        Some(other) => return Err(invalid(format!("unsupported `_sd_alg` {other}"))),
    }

    let mut payload = Value::Object(payload);
    let mut disclosures = vec![];
    reconstruct(&mut payload, &mut pending, &mut disclosures)?;
    if !pending.is_empty() {
        return Err(invalid("disclosure is not referenced by the credential"));
    }
    let Value::Object(payload) = payload else {
        return Err(invalid("SD-JWT payload is not an object"));
    };

    let key_binding = if kb_jwt.is_empty() {
        if expect.is_some() {
            return Err(invalid("key binding JWT is required"));
        }
        None
    } else {
        let holder = holder_key(&payload, resolver).await?;
        Some(verify_kb_jwt(kb_jwt, presented, &holder, expect)?)
    };

    Ok(Disclosed {
        payload,
        disclosures,
        key_binding,
    })
}

fn reconstruct(
    value: &mut Value, pending: &mut HashMap<String, Disclosure>, revealed: &mut Vec<Disclosure>,
) -> Result<(), Error> {
    match value {
        Value::Object(map) => {
            if let Some(sd) = map.remove("_sd") {
                let Value::Array(digests) = sd else {
                    return Err(invalid("`_sd` must be an array"));
                };
                for digest in digests {
                    let Some(digest) = digest.as_str() else {
                        return Err(invalid("`_sd` digests must be strings"));
                    };
                    // digests without a presented disclosure stay concealed
                    let Some(disclosure) = pending.remove(digest) else {
                        continue;
                    };
                    if map.contains_key(&disclosure.name) {
                        return Err(invalid(format!("claim `{}` is disclosed twice", disclosure.name)));
                    }
                    map.insert(disclosure.name.clone(), disclosure.value.clone());
                    revealed.push(disclosure);
                }
            }
            for nested in map.values_mut() {
                reconstruct(nested, pending, revealed)?;
            }
        }
        Value::Array(items) => {
            for item in items {
                reconstruct(item, pending, revealed)?;
            }
        }
        _ => {}
    }
    Ok(())
}

async fn holder_key(payload: &Map<String, Value>, resolver: &dyn Resolver) -> Result<PublicKeyJwk, Error> {
    if let Some(cnf) = payload.get("cnf") {
        if let Some(jwk) = cnf.get("jwk") {
            return serde_json::from_value(jwk.clone())
                .map_err(|e| invalid(format!("`cnf.jwk` is not a public key: {e}")));
        }
        if let Some(kid) = cnf.get("kid").and_then(Value::as_str) {
            return Ok(vcflow_did::resolve_jwk(kid, resolver).await?);
        }
    }
    match payload.get("sub").and_then(Value::as_str) {
        Some(sub) if sub.starts_with("did:") => Ok(vcflow_did::resolve_jwk(sub, resolver).await?),
        _ => Err(invalid("credential does not identify a holder key")),
    }
}

fn verify_kb_jwt(
    kb_jwt: &str, presented: &str, holder: &PublicKeyJwk, expect: Option<KbExpectations<'_>>,
) -> Result<KbJwtClaims, Error> {
    let jwt: Jwt<KbJwtClaims> =
        jws::decode_unverified(kb_jwt).map_err(|e| invalid(format!("malformed key binding JWT: {e}")))?;
    if jwt.header.typ.as_deref() != Some(KB_JWT_TYP) {
        return Err(invalid(format!("key binding JWT `typ` must be {KB_JWT_TYP}")));
    }
    jws::verify(kb_jwt, holder).map_err(|e| Error::signature(format!("key binding JWT: {e}")))?;

    let claims = jwt.claims;
    if claims.sd_hash != sd_hash(presented) {
        return Err(invalid("key binding JWT `sd_hash` does not match the presentation"));
    }
    if let Some(expect) = expect {
        if claims.nonce != expect.nonce {
            return Err(invalid("key binding JWT `nonce` does not match the request"));
        }
        if claims.aud != expect.aud {
            return Err(invalid("key binding JWT `aud` does not match the verifier"));
        }
    }
    Ok(claims)
}

fn invalid(reason: impl Into<String>) -> Error {
    Error::InvalidCredential(reason.into())
}
