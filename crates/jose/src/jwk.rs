//! # JSON Web Key (JWK)
//!
//! A JWK ([RFC7517]) is a JSON representation of a cryptographic key. Keys
//! used here are either Ed25519 (`OKP`) or NIST P-256 (`EC`).
//!
//! Key identifiers default to the JWK Thumbprint ([RFC7638]): the base64url
//! SHA-256 hash of the canonical JSON of the required members.
//!
//! [RFC7638]: https://www.rfc-editor.org/rfc/rfc7638
//! [RFC7517]: https://www.rfc-editor.org/rfc/rfc7517

use anyhow::{Context, Result, anyhow, bail};
use base64ct::{Base64UrlUnpadded, Encoding};
use p256::elliptic_curve::sec1::ToEncodedPoint;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Public JSON Web Key.
#[derive(Clone, Debug, Default, Deserialize, Serialize, Eq, PartialEq)]
pub struct PublicKeyJwk {
    /// Key identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,

    /// Key type.
    pub kty: KeyType,

    /// Cryptographic curve type.
    pub crv: Curve,

    /// X coordinate, or the raw public key for `OKP` keys.
    pub x: String,

    /// Y coordinate. Not used by `OKP` keys.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<String>,

    /// Algorithm intended for use with the key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alg: Option<String>,

    /// Use of the key.
    #[serde(rename = "use")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_: Option<KeyUse>,
}

/// Private JSON Web Key: the public members plus the private scalar `d`.
#[derive(Clone, Deserialize, Serialize, Eq, PartialEq)]
pub struct PrivateKeyJwk {
    /// Public members.
    #[serde(flatten)]
    pub public: PublicKeyJwk,

    /// Private key material.
    pub d: String,
}

impl std::fmt::Debug for PrivateKeyJwk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrivateKeyJwk").field("public", &self.public).finish_non_exhaustive()
    }
}

/// Cryptographic key type.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, Eq, PartialEq)]
pub enum KeyType {
    /// Octet key pair (Edwards curve)
    #[default]
    #[serde(rename = "OKP")]
    Okp,

    /// Elliptic curve key pair
    #[serde(rename = "EC")]
    Ec,
}

/// Cryptographic curve type.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, Eq, PartialEq)]
pub enum Curve {
    /// Ed25519 curve
    #[default]
    Ed25519,

    /// NIST P-256 curve
    #[serde(rename = "P-256")]
    P256,
}

/// The intended usage of the public key.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub enum KeyUse {
    /// Public key is to be used for signature verification
    #[default]
    #[serde(rename = "sig")]
    Signature,

    /// Public key is to be used for encryption
    #[serde(rename = "enc")]
    Encryption,
}

/// A set of JWKs.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct Jwks {
    /// The set of public key JWKs
    pub keys: Vec<PublicKeyJwk>,
}

impl PublicKeyJwk {
    /// Build a JWK from raw public key bytes: 32 bytes for Ed25519, a
    /// compressed or uncompressed SEC1 point for P-256.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes are not a valid key for the curve.
    pub fn from_bytes(crv: Curve, bytes: &[u8]) -> Result<Self> {
        match crv {
            Curve::Ed25519 => {
                if bytes.len() != 32 {
                    bail!("Ed25519 public key must be 32 bytes");
                }
                Ok(Self {
                    kty: KeyType::Okp,
                    crv,
                    x: Base64UrlUnpadded::encode_string(bytes),
                    ..Self::default()
                })
            }
            Curve::P256 => {
                let key = p256::PublicKey::from_sec1_bytes(bytes)
                    .map_err(|e| anyhow!("invalid P-256 public key: {e}"))?;
                let point = key.to_encoded_point(false);
                let x = point.x().ok_or_else(|| anyhow!("missing x coordinate"))?;
                let y = point.y().ok_or_else(|| anyhow!("missing y coordinate"))?;
                Ok(Self {
                    kty: KeyType::Ec,
                    crv,
                    x: Base64UrlUnpadded::encode_string(x),
                    y: Some(Base64UrlUnpadded::encode_string(y)),
                    ..Self::default()
                })
            }
        }
    }

    /// Raw public key bytes: 32 bytes for Ed25519, a compressed SEC1 point
    /// for P-256.
    ///
    /// # Errors
    ///
    /// Returns an error if the JWK coordinates cannot be decoded.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        match self.crv {
            Curve::Ed25519 => Ok(Base64UrlUnpadded::decode_vec(&self.x)?),
            Curve::P256 => Ok(self.p256_key()?.to_encoded_point(true).as_bytes().to_vec()),
        }
    }

    pub(crate) fn p256_key(&self) -> Result<p256::PublicKey> {
        let x = Base64UrlUnpadded::decode_vec(&self.x)?;
        let y = Base64UrlUnpadded::decode_vec(self.y.as_deref().ok_or_else(|| anyhow!("missing y"))?)?;
        if x.len() != 32 || y.len() != 32 {
            bail!("P-256 coordinates must be 32 bytes");
        }
        let mut sec1 = Vec::with_capacity(65);
        sec1.push(0x04);
        sec1.extend(x);
        sec1.extend(y);
        p256::PublicKey::from_sec1_bytes(&sec1).map_err(|e| anyhow!("invalid P-256 point: {e}"))
    }

    /// RFC 7638 thumbprint of the key.
    ///
    /// # Errors
    ///
    /// Returns an error if an `EC` key has no `y` coordinate.
    pub fn thumbprint(&self) -> Result<String> {
        let canonical = match self.kty {
            KeyType::Okp => format!(r#"{{"crv":"Ed25519","kty":"OKP","x":"{}"}}"#, self.x),
            KeyType::Ec => {
                let y = self.y.as_deref().ok_or_else(|| anyhow!("missing y"))?;
                format!(r#"{{"crv":"P-256","kty":"EC","x":"{}","y":"{y}"}}"#, self.x)
            }
        };
        Ok(Base64UrlUnpadded::encode_string(&Sha256::digest(canonical.as_bytes())))
    }

    /// Verify `signature` over `msg` with this key.
    ///
    /// # Errors
    ///
    /// Returns an error if the key or signature are malformed or the
    /// signature does not verify.
    pub fn verify(&self, msg: &[u8], signature: &[u8]) -> Result<()> {
        match self.crv {
            Curve::Ed25519 => {
                use ed25519_dalek::Verifier as _;

                let bytes: [u8; 32] = Base64UrlUnpadded::decode_vec(&self.x)?
                    .try_into()
                    .map_err(|_| anyhow!("Ed25519 public key must be 32 bytes"))?;
                let key = ed25519_dalek::VerifyingKey::from_bytes(&bytes)?;
                let sig = ed25519_dalek::Signature::from_slice(signature)?;
                key.verify(msg, &sig).context("EdDSA signature verification failed")
            }
            Curve::P256 => {
                use p256::ecdsa::signature::Verifier as _;

                let key = p256::ecdsa::VerifyingKey::from(self.p256_key()?);
                let sig = p256::ecdsa::Signature::from_slice(signature)
                    .map_err(|e| anyhow!("invalid ES256 signature: {e}"))?;
                key.verify(msg, &sig).map_err(|e| anyhow!("ES256 signature verification failed: {e}"))
            }
        }
    }
}

impl PrivateKeyJwk {
    /// Private key bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if `d` is not valid base64url.
    pub fn secret_bytes(&self) -> Result<Vec<u8>> {
        Ok(Base64UrlUnpadded::decode_vec(&self.d)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // RFC 8037 appendix A.3
    #[test]
    fn ed25519_thumbprint() {
        let jwk = PublicKeyJwk {
            kty: KeyType::Okp,
            crv: Curve::Ed25519,
            x: "11qYAYKxCrfVS_7TyWQHOg7hcvPapiMlrwIaaPcHURo".to_string(),
            ..PublicKeyJwk::default()
        };
        assert_eq!(jwk.thumbprint().unwrap(), "kPrK_qmxVWaYVA9wwBF6Iuo3vVzz7TxHCTwXBygrS4k");
    }

    #[test]
    fn serde_names() {
        let jwk: PublicKeyJwk = serde_json::from_str(
            r#"{"kty":"EC","crv":"P-256","x":"abc","y":"def","use":"enc"}"#,
        )
        .unwrap();
        assert_eq!(jwk.kty, KeyType::Ec);
        assert_eq!(jwk.crv, Curve::P256);
        assert_eq!(jwk.use_, Some(KeyUse::Encryption));
    }
}
