//! # DID Document
//!
//! The subset of a DID document needed to find verification keys.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use vcflow_jose::PublicKeyJwk;

/// A DID document.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// JSON-LD context.
    #[serde(rename = "@context", default, skip_serializing_if = "Vec::is_empty")]
    pub context: Vec<Value>,

    /// The DID the document describes.
    pub id: String,

    /// Keys that may verify proofs made by the DID subject.
    #[serde(default)]
    pub verification_method: Vec<VerificationMethod>,

    /// Verification methods usable for authentication, by reference or
    /// embedded.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub authentication: Vec<Value>,

    /// Verification methods usable for issuing credentials.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub assertion_method: Vec<Value>,
}

/// A verification method entry.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VerificationMethod {
    /// DID URL of the method, e.g. `did:example:123#key-1`.
    pub id: String,

    /// Method type, e.g. `JsonWebKey2020` or `Multikey`.
    #[serde(rename = "type")]
    pub type_: String,

    /// DID of the controller.
    pub controller: String,

    /// Key as a JWK.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_key_jwk: Option<PublicKeyJwk>,

    /// Key as a multibase-encoded multikey.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_key_multibase: Option<String>,
}

impl Document {
    /// Find a verification method by DID URL or by fragment. With no
    /// fragment the first method is returned.
    #[must_use]
    pub fn find_method(&self, did_url: &str) -> Option<&VerificationMethod> {
        let Some((_, fragment)) = did_url.split_once('#') else {
            return self.verification_method.first();
        };
        self.verification_method.iter().find(|vm| {
            vm.id == did_url || vm.id.rsplit_once('#').is_some_and(|(_, f)| f == fragment)
        })
    }
}
