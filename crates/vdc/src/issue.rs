//! # Credential Issuance
//!
//! Turns a credential template, a mapping overlay and an issuer key into a
//! signed JWT-VC or SD-JWT-VC.
//!
//! Registered JWT claims are derived from the merged document: `jti` from
//! `id`, `nbf` from `validFrom`/`issuanceDate`, `exp` from
//! `validUntil`/`expirationDate`, and `iat` from the issuance time.
//! Caller-supplied claims take precedence.

use anyhow::{Result, anyhow};
use serde_json::{Map, Value};
use tracing::instrument;
use vcflow_jose::Signer;

use crate::jwt::{self, JwtOptions};
use crate::mapping::{self, Environment, MergeContext};
use crate::sd_jwt::{self, SD_ALG, SD_JWT_TYP, SdMap};
use crate::w3c_vc::W3cVc;

/// Everything needed to issue a single credential.
pub struct IssueRequest<'a> {
    /// Credential template. Placeholders in the template are resolved too.
    pub template: Value,

    /// Mapping overlay applied on top of the template.
    pub mapping: Option<Value>,

    /// Issuer DID, the JWT `iss`.
    pub issuer_did: String,

    /// Explicit header `kid`. Derived from the issuer DID when not set.
    pub issuer_kid: Option<String>,

    /// Subject (holder) DID, the JWT `sub`.
    pub subject_did: String,

    /// Extra header members and claims.
    pub options: JwtOptions,

    /// Clock and UUID source.
    pub env: &'a dyn Environment,
}

impl std::fmt::Debug for IssueRequest<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IssueRequest")
            .field("issuer_did", &self.issuer_did)
            .field("subject_did", &self.subject_did)
            .finish_non_exhaustive()
    }
}

/// Issue a JWT-secured W3C credential.
///
/// # Errors
///
/// Returns an error if the merged template is not a JSON object or signing
/// fails.
#[instrument(level = "debug", skip(signer))]
pub async fn issue_jwt_vc<S: Signer>(request: &IssueRequest<'_>, signer: &S) -> Result<String> {
    tracing::debug!("issue::issue_jwt_vc");

    let (vc, options) = prepare(request, signer).await?;
    jwt::sign(&vc.into_value(), signer, &request.issuer_did, &request.subject_did, &options).await
}

/// Issue an SD-JWT credential. Fields marked in `sd_map` become disclosures;
/// with no map every field stays inline.
///
/// Returns `<JWT>~<Disclosure 1>~...~<Disclosure N>~`.
///
/// # Errors
///
/// Returns an error if the merged template is not a JSON object or signing
/// fails.
#[instrument(level = "debug", skip(signer, sd_map))]
pub async fn issue_sd_jwt_vc<S: Signer>(
    request: &IssueRequest<'_>, signer: &S, sd_map: Option<&SdMap>,
) -> Result<String> {
    tracing::debug!("issue::issue_sd_jwt_vc");

    let (vc, options) = prepare(request, signer).await?;
    let Value::Object(mut doc) = vc.into_value() else {
        return Err(anyhow!("credential must be a JSON object"));
    };

    let empty = SdMap::default();
    let disclosures = sd_jwt::conceal(&mut doc, sd_map.unwrap_or(&empty))?;

    let mut claims = Map::new();
    claims.insert("iss".into(), request.issuer_did.clone().into());
    claims.insert("sub".into(), request.subject_did.clone().into());
    claims.insert("vc".into(), Value::Object(doc));
    claims.insert("_sd_alg".into(), SD_ALG.into());

    let mut sd_jwt = jwt::sign_claims(claims, signer, SD_JWT_TYP, &options).await?;
    sd_jwt.push('~');
    for disclosure in &disclosures {
        sd_jwt.push_str(&disclosure.encode()?);
        sd_jwt.push('~');
    }
    Ok(sd_jwt)
}

/// Sign a credential document as-is. The issuer defaults to the `did:key`
/// of the signing key.
///
/// # Errors
///
/// Returns an error if the key's DID cannot be derived or signing fails.
#[instrument(level = "debug", skip(vc, signer))]
pub async fn sign_raw<S: Signer>(
    vc: &Value, signer: &S, issuer_did: Option<&str>, subject_did: &str,
) -> Result<String> {
    tracing::debug!("issue::sign_raw");

    let issuer_did = match issuer_did {
        Some(did) => did.to_string(),
        None => vcflow_did::key::did_from_jwk(&signer.public_jwk().await?)?,
    };
    let options = JwtOptions {
        kid: issuer_kid(&issuer_did, &signer.key_id().await?),
        ..JwtOptions::default()
    };
    jwt::sign(vc, signer, &issuer_did, subject_did, &options).await
}

/// The header `kid` to use for an issuer DID, where the DID method
/// determines it.
///
/// - `did:key`: `<did>#<multibase key>`
/// - `did:jwk`: `<did>#0`
/// - `did:ebsi`: `<did>#<key id>`
#[must_use]
pub fn issuer_kid(issuer_did: &str, key_id: &str) -> Option<String> {
    if let Some(multibase) = issuer_did.strip_prefix("did:key:") {
        Some(format!("{issuer_did}#{multibase}"))
    } else if issuer_did.starts_with("did:jwk:") {
        Some(format!("{issuer_did}#0"))
    } else if issuer_did.starts_with("did:ebsi:") {
        Some(format!("{issuer_did}#{key_id}"))
    } else {
        None
    }
}

async fn prepare<S: Signer>(request: &IssueRequest<'_>, signer: &S) -> Result<(W3cVc, JwtOptions)> {
    let ctx = MergeContext {
        issuer_did: &request.issuer_did,
        subject_did: &request.subject_did,
        env: request.env,
    };
    let rendered = mapping::render(&request.template, &ctx);
    let merged = match &request.mapping {
        Some(overlay) => mapping::merge(&rendered, overlay, &ctx),
        None => rendered,
    };

    let mut vc = W3cVc::from_value(merged)?;
    if vc.issuer().is_none() {
        vc.set_issuer(&request.issuer_did);
    }

    let mut claims = Map::new();
    if let Some(id) = vc.id() {
        claims.insert("jti".into(), id.into());
    }
    if let Some(nbf) = vc.valid_from() {
        claims.insert("nbf".into(), nbf.timestamp().into());
    }
    if let Some(exp) = vc.valid_until() {
        claims.insert("exp".into(), exp.timestamp().into());
    }
    claims.insert("iat".into(), request.env.now().timestamp().into());
    claims.extend(request.options.claims.clone());

    let kid = match (&request.options.kid, &request.issuer_kid) {
        (Some(kid), _) | (None, Some(kid)) => Some(kid.clone()),
        (None, None) => issuer_kid(&request.issuer_did, &signer.key_id().await?),
    };

    let options = JwtOptions {
        kid,
        headers: request.options.headers.clone(),
        claims,
    };
    Ok((vc, options))
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, TimeZone, Utc};
    use serde_json::json;
    use uuid::Uuid;
    use vcflow_jose::jws;
    use vcflow_jose::{Curve, LocalKey};

    use super::*;
    use crate::mapping::SystemEnvironment;
    use crate::test_support::{NoNetwork, did_key};

    struct FixedEnvironment;

    impl Environment for FixedEnvironment {
        fn now(&self) -> DateTime<Utc> {
            Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap()
        }

        fn uuid(&self) -> Uuid {
            Uuid::from_u128(7)
        }
    }

    fn request<'a>(issuer: &LocalKey, template: Value, mapping: Option<Value>, env: &'a dyn Environment) -> IssueRequest<'a> {
        IssueRequest {
            template,
            mapping,
            issuer_did: did_key(issuer),
            issuer_kid: None,
            subject_did: "did:key:z6MkpTHR8VNsBxYAAWHut2Geadd9jSwuBV8xRoAnwWsdvktH".into(),
            options: JwtOptions::default(),
            env,
        }
    }

    #[tokio::test]
    async fn jwt_vc_subject() {
        let issuer = LocalKey::generate(Curve::Ed25519).unwrap();
        let template = json!({"type": ["VerifiableCredential"], "credentialSubject": {"id": "<subjectDid>"}});
        let request = request(&issuer, template.clone(), Some(template), &SystemEnvironment);

        let token = issue_jwt_vc(&request, &issuer).await.unwrap();
        let payload = jwt::verify(&token, &NoNetwork).await.unwrap();
        assert_eq!(payload["vc"]["credentialSubject"]["id"], request.subject_did.as_str());
        assert_eq!(payload["vc"]["issuer"], request.issuer_did.as_str());
        assert_eq!(payload["sub"], request.subject_did.as_str());

        let header = jws::decode_unverified::<Value>(&token).unwrap().header;
        assert_eq!(header.kid, issuer_kid(&request.issuer_did, ""));
    }

    #[tokio::test]
    async fn derived_claims() {
        let issuer = LocalKey::generate(Curve::P256).unwrap();
        let template = json!({
            "@context": ["https://www.w3.org/2018/credentials/v1"],
            "type": ["VerifiableCredential", "UniversityDegree"],
            "issuer": {"id": "<issuerDid>", "name": "Example University"},
            "credentialSubject": {"id": "<subjectDid>"}
        });
        let mapping = json!({"id": "<uuid>", "issuanceDate": "<timestamp>", "expirationDate": "<timestamp-in:30d>"});
        let mut request = request(&issuer, template, Some(mapping), &FixedEnvironment);
        request.options.claims.insert("aud".into(), "https://wallet.example".into());

        let token = issue_jwt_vc(&request, &issuer).await.unwrap();
        let payload = jwt::verify(&token, &NoNetwork).await.unwrap();
        let issued_at = FixedEnvironment.now().timestamp();

        assert_eq!(payload["jti"], "urn:uuid:00000000-0000-0000-0000-000000000007");
        assert_eq!(payload["nbf"], issued_at);
        assert_eq!(payload["iat"], issued_at);
        assert_eq!(payload["exp"], issued_at + 30 * 86_400);
        assert_eq!(payload["aud"], "https://wallet.example");
        assert_eq!(payload["vc"]["issuer"]["name"], "Example University");
    }

    #[tokio::test]
    async fn sd_jwt_discloses_marked_field() {
        let issuer = LocalKey::generate(Curve::Ed25519).unwrap();
        let template = json!({
            "type": ["VerifiableCredential"],
            "credentialSubject": {"id": "<subjectDid>", "name": "Alice", "degree": "BSc"}
        });
        let request = request(&issuer, template, None, &SystemEnvironment);

        let plain = issue_sd_jwt_vc(&request, &issuer, None).await.unwrap();
        let map = SdMap::from_paths(["credentialSubject.name"]);
        let selective = issue_sd_jwt_vc(&request, &issuer, Some(&map)).await.unwrap();

        assert_eq!(selective.split('~').count(), plain.split('~').count() + 1);

        let inline = |token: &str| {
            let jwt = token.split('~').next().unwrap();
            let claims: Value = jws::decode_unverified(jwt).unwrap().claims;
            let subject = claims["vc"]["credentialSubject"].as_object().unwrap().clone();
            subject.keys().filter(|k| *k != "_sd").count()
        };
        assert_eq!(inline(&selective), inline(&plain) - 1);

        let header = jws::decode_unverified::<Value>(selective.split('~').next().unwrap()).unwrap().header;
        assert_eq!(header.typ.as_deref(), Some(SD_JWT_TYP));

        let disclosed = sd_jwt::verify(&selective, &NoNetwork, None).await.unwrap();
        assert_eq!(disclosed.payload["vc"]["credentialSubject"]["name"], "Alice");
        assert_eq!(disclosed.disclosures.len(), 1);
    }

    #[tokio::test]
    async fn raw_signing() {
        let key = LocalKey::generate(Curve::Ed25519).unwrap();
        let vc = json!({"type": ["VerifiableCredential"], "credentialSubject": {"name": "Bob"}});

        let token = sign_raw(&vc, &key, None, "did:key:z6MkHolder").await.unwrap();
        let payload = jwt::verify(&token, &NoNetwork).await.unwrap();
        assert_eq!(payload["iss"], did_key(&key));
        assert_eq!(payload["vc"], vc);
    }

    #[test]
    fn kids() {
        assert_eq!(issuer_kid("did:key:z6Mkabc", "x").as_deref(), Some("did:key:z6Mkabc#z6Mkabc"));
        assert_eq!(issuer_kid("did:jwk:eyJ", "x").as_deref(), Some("did:jwk:eyJ#0"));
        assert_eq!(issuer_kid("did:ebsi:zf39", "k1").as_deref(), Some("did:ebsi:zf39#k1"));
        assert_eq!(issuer_kid("did:web:issuer.example", "k1"), None);
    }
}
