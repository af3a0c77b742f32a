//! # SD-JWT Credentials
//!
//! Selective disclosure for JWT credentials as described by
//! [I-D.ietf-oauth-selective-disclosure-jwt].
//!
//! Fields marked in an [`SdMap`] are removed from the credential and replaced
//! by the digest of a salted [`Disclosure`]. The disclosures travel alongside
//! the issuer-signed JWT as `<JWT>~<Disclosure 1>~...~<Disclosure N>~`,
//! optionally followed by a holder Key Binding JWT.
//!
//! [I-D.ietf-oauth-selective-disclosure-jwt]: https://www.ietf.org/archive/id/draft-ietf-oauth-selective-disclosure-jwt-17.html

mod issue;
mod present;
mod verify;

use std::collections::BTreeMap;

use anyhow::{Result, anyhow};
use base64ct::{Base64UrlUnpadded, Encoding};
use rand::{Rng, rng};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use sha2::{Digest, Sha256};

pub use self::issue::conceal;
pub use self::present::SdJwtVpBuilder;
pub use self::verify::{Disclosed, KbExpectations, verify};

/// JWT `typ` of issuer-signed SD-JWT credentials.
pub const SD_JWT_TYP: &str = "vc+sd-jwt";

/// JWT `typ` of Key Binding JWTs.
pub const KB_JWT_TYP: &str = "kb+jwt";

/// Digest algorithm advertised in `_sd_alg`.
pub const SD_ALG: &str = "sha-256";

/// Marks which credential fields are selectively disclosable.
///
/// ```json
/// {"fields": {"credentialSubject": {"sd": false, "children": {"fields": {"name": {"sd": true}}}}}}
/// ```
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct SdMap {
    /// Fields by name.
    #[serde(default)]
    pub fields: BTreeMap<String, SdField>,
}

/// Disclosure settings for a single field.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct SdField {
    /// Whether the field itself is disclosable.
    #[serde(default)]
    pub sd: bool,

    /// Settings for the members of an object-valued field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<SdMap>,
}

impl SdMap {
    /// Build a map marking each dotted path (e.g. `credentialSubject.name`)
    /// as disclosable. Intermediate objects stay inline.
    #[must_use]
    pub fn from_paths<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<str>,
    {
        let mut map = Self::default();
        for path in paths {
            let mut current = &mut map;
            let mut segments = path.as_ref().split('.').peekable();
            while let Some(segment) = segments.next() {
                let field = current.fields.entry(segment.to_string()).or_default();
                if segments.peek().is_none() {
                    field.sd = true;
                    break;
                }
                current = field.children.get_or_insert_with(Self::default);
            }
        }
        map
    }

    /// Whether no field is marked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.values().all(|f| !f.sd && f.children.as_ref().is_none_or(Self::is_empty))
    }
}

/// A salted claim disclosure.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Disclosure {
    /// The claim name.
    pub name: String,

    /// The claim value.
    pub value: Value,

    salt: String,
}

impl Disclosure {
    /// Create a disclosure with a fresh 128-bit salt.
    pub fn new(name: impl Into<String>, value: Value) -> Self {
        Self {
            name: name.into(),
            value,
            salt: Base64UrlUnpadded::encode_string(&rng().random::<[u8; 16]>()),
        }
    }

    /// Unpack a base64url-encoded disclosure.
    ///
    /// # Errors
    ///
    /// Returns an error if the disclosure is not a base64url-encoded JSON
    /// array of salt, name and value.
    pub fn decode(encoded: &str) -> Result<Self> {
        let decoded = Base64UrlUnpadded::decode_vec(encoded)
            .map_err(|e| anyhow!("disclosure is not base64url: {e}"))?;
        let parts: Vec<Value> = serde_json::from_slice(&decoded)?;
        let [salt, name, value] = parts.as_slice() else {
            return Err(anyhow!("disclosure must be a JSON array of length 3"));
        };
        let (Some(salt), Some(name)) = (salt.as_str(), name.as_str()) else {
            return Err(anyhow!("disclosure salt and name must be strings"));
        };

        Ok(Self {
            salt: salt.to_string(),
            name: name.to_string(),
            value: value.clone(),
        })
    }

    /// Base64url-encode the disclosure as `["<salt>","<name>",<value>]`.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be serialized.
    pub fn encode(&self) -> Result<String> {
        let json = serde_json::to_vec(&json!([self.salt, self.name, self.value]))?;
        Ok(Base64UrlUnpadded::encode_string(&json))
    }

    /// The digest referencing this disclosure from an `_sd` array.
    ///
    /// # Errors
    ///
    /// Returns an error if the disclosure cannot be encoded.
    pub fn digest(&self) -> Result<String> {
        Ok(sd_hash(&self.encode()?))
    }
}

/// Key Binding JWT claims.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct KbJwtClaims {
    /// Nonce of the authorization request.
    pub nonce: String,

    /// Client identifier of the verifier.
    pub aud: String,

    /// Issued-at, seconds since the epoch.
    pub iat: i64,

    /// Digest of the presented SD-JWT, up to and including the last `~`.
    pub sd_hash: String,
}

/// Base64url-encoded SHA-256 digest of `input`.
#[must_use]
pub fn sd_hash(input: &str) -> String {
    Base64UrlUnpadded::encode_string(Sha256::digest(input.as_bytes()).as_slice())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths() {
        let map = SdMap::from_paths(["credentialSubject.name", "credentialSubject.email", "id"]);
        assert!(map.fields["id"].sd);
        let subject = &map.fields["credentialSubject"];
        assert!(!subject.sd);
        let children = subject.children.as_ref().unwrap();
        assert!(children.fields["name"].sd && children.fields["email"].sd);

        assert!(SdMap::default().is_empty());
        assert!(!map.is_empty());
    }

    #[test]
    fn sd_map_json() {
        let map: SdMap = serde_json::from_value(json!({
            "fields": {"credentialSubject": {"children": {"fields": {"name": {"sd": true}}}}},
            "decoyMode": "NONE"
        }))
        .unwrap();
        assert_eq!(map, SdMap::from_paths(["credentialSubject.name"]));
    }

    #[test]
    fn disclosure_digest() {
        // example from the SD-JWT draft
        let encoded = "WyI2cU1RdlJMNWhhaiIsICJmYW1pbHlfbmFtZSIsICJNw7ZiaXVzIl0";
        let disclosure = Disclosure::decode(encoded).unwrap();
        assert_eq!(disclosure.name, "family_name");
        assert_eq!(disclosure.value, "Möbius");
        assert_eq!(sd_hash(encoded), "uutlBuYeMDyjLLTpf6Jxi7yNkEF35jdyWMn9U7b_RYY");

        let fresh = Disclosure::new("given_name", json!("Erika"));
        let decoded = Disclosure::decode(&fresh.encode().unwrap()).unwrap();
        assert_eq!(decoded, fresh);
    }
}
