//! # W3C Verifiable Credentials
//!
//! A credential document as defined by the [VC Data Model]. The document is
//! kept as a JSON object so templates may carry any additional members;
//! typed accessors cover the members the issuance and verification flows
//! depend on.
//!
//! [VC Data Model]: https://www.w3.org/TR/vc-data-model

mod present;
mod verify;

use anyhow::{Result, anyhow};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub use self::present::W3cVpBuilder;
pub use self::verify::{VerifiedVp, verify_vp};

/// Base context of every W3C credential.
pub const BASE_CONTEXT: &str = "https://www.w3.org/2018/credentials/v1";

/// A W3C Verifiable Credential document.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct W3cVc(Map<String, Value>);

impl W3cVc {
    /// Wrap a JSON value, which must be an object.
    ///
    /// # Errors
    ///
    /// Returns an error if `value` is not a JSON object.
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(anyhow!("credential must be a JSON object, found {other}")),
        }
    }

    /// Check the members required of a W3C credential are present.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first missing or malformed member.
    pub fn validate(&self) -> Result<()> {
        for member in ["@context", "type", "issuer", "credentialSubject"] {
            if !self.0.contains_key(member) {
                return Err(anyhow!("credential is missing `{member}`"));
            }
        }
        if !self.types().iter().any(|t| *t == "VerifiableCredential") {
            return Err(anyhow!("credential `type` must include VerifiableCredential"));
        }
        Ok(())
    }

    /// The credential `type` values. A single string is treated as a
    /// one-element list.
    #[must_use]
    pub fn types(&self) -> Vec<&str> {
        match self.0.get("type") {
            Some(Value::String(t)) => vec![t.as_str()],
            Some(Value::Array(types)) => types.iter().filter_map(Value::as_str).collect(),
            _ => vec![],
        }
    }

    /// The most specific credential type: the last `type` entry.
    #[must_use]
    pub fn credential_type(&self) -> Option<&str> {
        self.types().last().copied()
    }

    /// Credential identifier.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.0.get("id").and_then(Value::as_str)
    }

    /// Issuer identifier, whether `issuer` is a string or an object with
    /// an `id`.
    #[must_use]
    pub fn issuer(&self) -> Option<&str> {
        match self.0.get("issuer")? {
            Value::String(id) => Some(id),
            Value::Object(issuer) => issuer.get("id").and_then(Value::as_str),
            _ => None,
        }
    }

    /// Set the issuer identifier, preserving any other issuer members.
    pub fn set_issuer(&mut self, did: &str) {
        match self.0.get_mut("issuer") {
            Some(Value::Object(issuer)) => {
                issuer.insert("id".into(), did.into());
            }
            _ => {
                self.0.insert("issuer".into(), did.into());
            }
        }
    }

    /// Identifier of the (first) credential subject.
    #[must_use]
    pub fn subject_id(&self) -> Option<&str> {
        match self.0.get("credentialSubject")? {
            Value::Object(subject) => subject.get("id").and_then(Value::as_str),
            Value::Array(subjects) => subjects.first()?.get("id").and_then(Value::as_str),
            _ => None,
        }
    }

    /// Start of validity: `validFrom` (v2) or `issuanceDate` (v1).
    #[must_use]
    pub fn valid_from(&self) -> Option<DateTime<Utc>> {
        self.date("validFrom").or_else(|| self.date("issuanceDate"))
    }

    /// End of validity: `validUntil` (v2) or `expirationDate` (v1).
    #[must_use]
    pub fn valid_until(&self) -> Option<DateTime<Utc>> {
        self.date("validUntil").or_else(|| self.date("expirationDate"))
    }

    fn date(&self, member: &str) -> Option<DateTime<Utc>> {
        let value = self.0.get(member)?.as_str()?;
        DateTime::parse_from_rfc3339(value).ok().map(|dt| dt.with_timezone(&Utc))
    }

    /// The underlying JSON object.
    #[must_use]
    pub const fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Mutable access to the underlying JSON object. Only meaningful before
    /// the credential is signed.
    pub const fn as_map_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.0
    }

    /// Consume the credential, returning it as a JSON value.
    #[must_use]
    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

impl TryFrom<Value> for W3cVc {
    type Error = anyhow::Error;

    fn try_from(value: Value) -> Result<Self> {
        Self::from_value(value)
    }
}
