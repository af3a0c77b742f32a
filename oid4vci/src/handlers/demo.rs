//! # Demo Credential
//!
//! Sample credential issued when demo fallback is enabled and a proof lacks
//! the holder `kid` or the `nonce` needed to find the real issuance
//! session. Signed by a throwaway `did:jwk` key.

use anyhow::Context as _;
use serde_json::{Value, json};
use vcflow_jose::{Curve, Key, LocalKey, Signer};
use vcflow_vdc::Format;

use super::credential::issue;
use crate::handlers::Result;
use crate::state::Pending;
use crate::types::{CredentialResponse, IssuanceRequest};

pub async fn credential(format: Format, holder_did: Option<&str>) -> Result<CredentialResponse> {
    tracing::warn!(%format, "issuing DEMO credential: proof carries no holder `kid` or no `nonce`");

    let key = LocalKey::generate(Curve::Ed25519).context("generating demo key")?;
    let jwk = key.public_jwk().await?;
    let issuer_did = vcflow_did::jwk::did_from_jwk(&jwk).context("deriving demo issuer DID")?;

    let pending = Pending {
        issuer_did: issuer_did.clone(),
        request: IssuanceRequest {
            issuer_key: Key::Jwk(key),
            issuer_did: Some(issuer_did.clone()),
            issuer_kid: None,
            credential_configuration_id: format!("OpenBadgeCredential_{format}"),
            credential_data: open_badge(),
            mapping: Some(json!({
                "id": "<uuid>",
                "issuer": {"id": "<issuerDid>"},
                "credentialSubject": {"id": "<subjectDid>"},
                "issuanceDate": "<timestamp>",
                "expirationDate": "<timestamp-in:365d>"
            })),
            selective_disclosure: None,
        },
    };

    let credential = issue(format, &pending, holder_did.unwrap_or(&issuer_did)).await?;
    Ok(CredentialResponse::Credential {
        format,
        credential: Value::String(credential),
    })
}

fn open_badge() -> Value {
    json!({
        "@context": [
            "https://www.w3.org/2018/credentials/v1",
            "https://purl.imsglobal.org/spec/ob/v3p0/context.json"
        ],
        "type": ["VerifiableCredential", "OpenBadgeCredential"],
        "name": "Demo Badge",
        "issuer": {
            "type": ["Profile"],
            "name": "Demo Issuer"
        },
        "credentialSubject": {
            "type": ["AchievementSubject"],
            "achievement": {
                "type": ["Achievement"],
                "name": "Demo Achievement",
                "description": "Issued without a bound issuance session.",
                "criteria": {
                    "type": "Criteria",
                    "narrative": "None: this credential is a sample."
                }
            }
        }
    })
}
