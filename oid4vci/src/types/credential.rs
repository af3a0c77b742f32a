use serde::{Deserialize, Serialize};
use serde_json::Value;
use vcflow_vdc::Format;

/// The `typ` header of a proof of possession JWT.
pub const PROOF_JWT_TYP: &str = "openid4vci-proof+jwt";

/// Credential Request, sent with the access token as a bearer token.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct CredentialRequest {
    /// Requested credential format.
    pub format: Format,

    /// The offered configuration to issue. The first offered credential is
    /// issued when not set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential_configuration_id: Option<String>,

    /// Proof of possession of the holder key the credential is bound to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proof: Option<Proof>,
}

/// Proof of possession of key material.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(tag = "proof_type")]
pub enum Proof {
    /// A JWT signed by the holder key, with the key's DID URL as `kid`.
    #[serde(rename = "jwt")]
    Jwt {
        /// The compact proof JWT.
        jwt: String,
    },
}

/// Claims of a proof of possession JWT.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct ProofClaims {
    /// The wallet's `client_id`, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,

    /// The credential issuer.
    #[serde(default)]
    pub aud: String,

    /// Issuance time.
    #[serde(default)]
    pub iat: i64,

    /// The `c_nonce` from the token response.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,
}

/// Credential Response: an issued credential, or a transaction id to
/// redeem later.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum CredentialResponse {
    /// The credential was issued.
    Credential {
        /// Format of the credential.
        format: Format,

        /// The credential: a compact JWT or SD-JWT.
        credential: Value,
    },

    /// Issuance was deferred.
    TransactionId {
        /// Identifies the deferred request at the deferred credential
        /// endpoint.
        transaction_id: String,
    },
}

impl CredentialResponse {
    /// The issued credential as a string, if one was issued.
    #[must_use]
    pub fn credential(&self) -> Option<&str> {
        match self {
            Self::Credential { credential, .. } => credential.as_str(),
            Self::TransactionId { .. } => None,
        }
    }

    /// The transaction id, if issuance was deferred.
    #[must_use]
    pub fn transaction_id(&self) -> Option<&str> {
        match self {
            Self::TransactionId { transaction_id } => Some(transaction_id),
            Self::Credential { .. } => None,
        }
    }
}

/// Batch Credential Request: several credentials of one format, all bound
/// to the same holder key.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct BatchCredentialRequest {
    /// The individual requests.
    pub credential_requests: Vec<CredentialRequest>,
}

/// Batch Credential Response.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct BatchCredentialResponse {
    /// One response per credential issued.
    pub credential_responses: Vec<CredentialResponse>,
}

/// Deferred Credential Request.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct DeferredCredentialRequest {
    /// From the Credential Response that deferred issuance.
    pub transaction_id: String,
}

/// Deferred Credential Response.
pub type DeferredCredentialResponse = CredentialResponse;

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn request() {
        let request: CredentialRequest = serde_json::from_value(json!({
            "format": "vc+sd-jwt",
            "proof": {"proof_type": "jwt", "jwt": "a.b.c"}
        }))
        .unwrap();
        assert_eq!(request.format, Format::SdJwtVc);
        assert_eq!(request.proof, Some(Proof::Jwt { jwt: "a.b.c".into() }));
    }

    #[test]
    fn response_shapes() {
        let deferred: CredentialResponse =
            serde_json::from_value(json!({"transaction_id": "tx-1"})).unwrap();
        assert_eq!(deferred.transaction_id(), Some("tx-1"));

        let issued: CredentialResponse =
            serde_json::from_value(json!({"format": "jwt_vc_json", "credential": "a.b.c"})).unwrap();
        assert_eq!(issued.credential(), Some("a.b.c"));
    }
}
