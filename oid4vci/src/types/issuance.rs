use serde::{Deserialize, Serialize};
use serde_json::Value;
use vcflow_jose::Key;
use vcflow_vdc::SdMap;

/// A credential to issue: the issuer's key and identity plus the credential
/// template and the mapping overlay applied to it at issuance time.
///
/// ```json
/// {
///   "issuer_key": {"type": "jwk", "jwk": {"kty": "OKP", "crv": "Ed25519", "x": "...", "d": "..."}},
///   "issuer_did": "did:key:z6Mk...",
///   "credential_configuration_id": "OpenBadgeCredential_jwt_vc_json",
///   "credential_data": {"type": ["VerifiableCredential", "OpenBadgeCredential"], "credentialSubject": {}},
///   "mapping": {"id": "<uuid>", "issuanceDate": "<timestamp>"}
/// }
/// ```
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct IssuanceRequest {
    /// The key signing the credential.
    pub issuer_key: Key,

    /// The issuer DID. Defaults to the `did:key` of `issuer_key`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issuer_did: Option<String>,

    /// Header `kid` to use instead of the one derived from the issuer DID.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issuer_kid: Option<String>,

    /// The offered credential configuration.
    pub credential_configuration_id: String,

    /// Credential template.
    pub credential_data: Value,

    /// Mapping overlay of dynamic values.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mapping: Option<Value>,

    /// Fields issued as selective disclosures when the wallet requests an
    /// SD-JWT credential.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selective_disclosure: Option<SdMap>,
}

/// Sign a credential document as-is, outside any issuance flow.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct SignRequest {
    /// The signing key.
    pub issuer_key: Key,

    /// The issuer DID. Defaults to the `did:key` of `issuer_key`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issuer_did: Option<String>,

    /// The subject DID, the JWT `sub`.
    pub subject_did: String,

    /// The credential to sign.
    pub credential: Value,
}

/// The signed credential.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct SignResponse {
    /// Compact JWT.
    pub credential: String,
}
