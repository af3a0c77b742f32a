use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use vcflow_vdc::Format;

/// Request for the issuer's metadata
/// (`/.well-known/openid-credential-issuer`).
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct MetadataRequest;

/// Credential Issuer metadata.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct MetadataResponse {
    /// The Credential Issuer's identifier.
    pub credential_issuer: String,

    /// Token endpoint of the co-located authorization server.
    pub token_endpoint: String,

    /// URL of the Credential Endpoint.
    pub credential_endpoint: String,

    /// URL of the Batch Credential Endpoint.
    pub batch_credential_endpoint: String,

    /// URL of the Deferred Credential Endpoint.
    pub deferred_credential_endpoint: String,

    /// Supported credentials by configuration id.
    pub credential_configurations_supported: BTreeMap<String, CredentialConfiguration>,
}

/// A supported credential configuration.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct CredentialConfiguration {
    /// Format of the issued credential.
    pub format: Format,

    /// How the credential is bound to its holder.
    pub cryptographic_binding_methods_supported: Vec<String>,

    /// Algorithms the credential may be signed with.
    pub credential_signing_alg_values_supported: Vec<String>,

    /// Algorithms accepted for proofs of possession, by proof type.
    pub proof_types_supported: BTreeMap<String, ProofTypesSupported>,

    /// The credential's type.
    pub credential_definition: CredentialDefinition,
}

/// Proof algorithms for one proof type.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct ProofTypesSupported {
    /// Accepted JWS algorithms.
    pub proof_signing_alg_values_supported: Vec<String>,
}

/// The type of credential described by a configuration.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct CredentialDefinition {
    /// The credential's `type` array.
    #[serde(rename = "type")]
    pub type_: Vec<String>,
}
