//! # Signing Keys
//!
//! A [`Key`] is a handle on private key material that can sign, export its
//! public JWK and report a key identifier. Two backings exist: a software key
//! held as a private JWK, and a key held by a remote transit engine (Vault
//! transit API compatible) that signs over HTTP without ever releasing the
//! private material.

use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};
use base64ct::{Base64, Base64UrlUnpadded, Encoding};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::jwk::{Curve, PrivateKeyJwk, PublicKeyJwk};

/// Signing capability shared by all key backings.
pub trait Signer: Send + Sync {
    /// Sign `msg`, returning the raw signature (`R||S` for ES256).
    fn try_sign(&self, msg: &[u8]) -> impl Future<Output = Result<Vec<u8>>> + Send;

    /// The public half of the key as a JWK.
    fn public_jwk(&self) -> impl Future<Output = Result<PublicKeyJwk>> + Send;

    /// The JWS algorithm the key signs with.
    fn algorithm(&self) -> Algorithm;

    /// Key identifier: the RFC 7638 thumbprint of the public key.
    fn key_id(&self) -> impl Future<Output = Result<String>> + Send {
        async { self.public_jwk().await?.thumbprint() }
    }
}

/// JWS signature algorithms.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub enum Algorithm {
    /// Ed25519 signatures.
    #[default]
    EdDSA,

    /// ECDSA over P-256 with SHA-256.
    ES256,
}

impl Algorithm {
    /// The algorithm used for keys on `curve`.
    #[must_use]
    pub const fn for_curve(curve: Curve) -> Self {
        match curve {
            Curve::Ed25519 => Self::EdDSA,
            Curve::P256 => Self::ES256,
        }
    }
}

impl std::fmt::Display for Algorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EdDSA => write!(f, "EdDSA"),
            Self::ES256 => write!(f, "ES256"),
        }
    }
}

/// A serialized key reference, as carried in issuance requests.
///
/// ```json
/// {"type": "jwk", "jwk": {"kty": "OKP", "crv": "Ed25519", "x": "...", "d": "..."}}
/// {"type": "transit", "server": "http://127.0.0.1:8200/v1/transit", "accessKey": "...", "id": "issuer"}
/// ```
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Key {
    /// Software key.
    Jwk(LocalKey),

    /// Remote-custody key.
    #[serde(alias = "tse")]
    Transit(TransitKey),
}

impl Signer for Key {
    async fn try_sign(&self, msg: &[u8]) -> Result<Vec<u8>> {
        match self {
            Self::Jwk(key) => key.try_sign(msg).await,
            Self::Transit(key) => key.try_sign(msg).await,
        }
    }

    async fn public_jwk(&self) -> Result<PublicKeyJwk> {
        match self {
            Self::Jwk(key) => key.public_jwk().await,
            Self::Transit(key) => key.public_jwk().await,
        }
    }

    fn algorithm(&self) -> Algorithm {
        match self {
            Self::Jwk(key) => key.algorithm(),
            Self::Transit(key) => key.algorithm(),
        }
    }
}

impl Key {
    /// Verify `signature` over `msg` using the key's public half.
    ///
    /// # Errors
    ///
    /// Returns an error if the public key cannot be obtained or the
    /// signature does not verify.
    pub async fn verify(&self, msg: &[u8], signature: &[u8]) -> Result<()> {
        self.public_jwk().await?.verify(msg, signature)
    }
}

/// A key held locally as a private JWK.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct LocalKey {
    /// Private JWK.
    pub jwk: PrivateKeyJwk,
}

impl LocalKey {
    /// Generate a fresh key on `curve`.
    ///
    /// # Errors
    ///
    /// Returns an error if the generated scalar is not a valid key, which
    /// for P-256 happens with negligible probability.
    pub fn generate(curve: Curve) -> Result<Self> {
        let secret: [u8; 32] = rand::random();
        Self::from_secret(curve, &secret)
    }

    /// Build a key from raw private key bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes are not a valid private key.
    pub fn from_secret(curve: Curve, secret: &[u8]) -> Result<Self> {
        let public = match curve {
            Curve::Ed25519 => {
                let bytes: [u8; 32] =
                    secret.try_into().map_err(|_| anyhow!("Ed25519 secret must be 32 bytes"))?;
                let signing = ed25519_dalek::SigningKey::from_bytes(&bytes);
                PublicKeyJwk::from_bytes(curve, signing.verifying_key().as_bytes())?
            }
            Curve::P256 => {
                use p256::elliptic_curve::sec1::ToEncodedPoint;

                let signing = p256::SecretKey::from_slice(secret)
                    .map_err(|e| anyhow!("invalid P-256 secret: {e}"))?;
                let point = signing.public_key().to_encoded_point(false);
                PublicKeyJwk::from_bytes(curve, point.as_bytes())?
            }
        };
        Ok(Self {
            jwk: PrivateKeyJwk {
                public,
                d: Base64UrlUnpadded::encode_string(secret),
            },
        })
    }
}

impl Signer for LocalKey {
    async fn try_sign(&self, msg: &[u8]) -> Result<Vec<u8>> {
        let secret = self.jwk.secret_bytes()?;
        match self.jwk.public.crv {
            Curve::Ed25519 => {
                use ed25519_dalek::Signer as _;

                let bytes: [u8; 32] =
                    secret.try_into().map_err(|_| anyhow!("Ed25519 secret must be 32 bytes"))?;
                let signing = ed25519_dalek::SigningKey::from_bytes(&bytes);
                Ok(signing.sign(msg).to_bytes().to_vec())
            }
            Curve::P256 => {
                use p256::ecdsa::signature::Signer as _;

                let signing = p256::ecdsa::SigningKey::from_slice(&secret)
                    .map_err(|e| anyhow!("invalid P-256 secret: {e}"))?;
                let signature: p256::ecdsa::Signature = signing.sign(msg);
                Ok(signature.to_bytes().to_vec())
            }
        }
    }

    async fn public_jwk(&self) -> Result<PublicKeyJwk> {
        Ok(self.jwk.public.clone())
    }

    fn algorithm(&self) -> Algorithm {
        Algorithm::for_curve(self.jwk.public.crv)
    }
}

/// A key held by a remote transit engine.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitKey {
    /// Base URL of the transit engine, e.g. `http://127.0.0.1:8200/v1/transit`.
    pub server: String,

    /// Access token presented as `X-Vault-Token`.
    pub access_key: String,

    /// Name of the key within the engine.
    pub id: String,

    /// Curve of the remote key.
    #[serde(default)]
    pub curve: Curve,

    /// Request timeout in seconds.
    #[serde(default = "TransitKey::default_timeout")]
    pub timeout_secs: u64,
}

impl TransitKey {
    const fn default_timeout() -> u64 {
        10
    }

    fn client(&self) -> Result<reqwest::Client> {
        reqwest::Client::builder()
            .timeout(Duration::from_secs(self.timeout_secs))
            .build()
            .context("building transit client")
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}/{}", self.server.trim_end_matches('/'), self.id)
    }
}

impl Signer for TransitKey {
    async fn try_sign(&self, msg: &[u8]) -> Result<Vec<u8>> {
        tracing::debug!(key = %self.id, "transit::sign");

        let mut body = json!({"input": Base64::encode_string(msg)});
        if self.curve == Curve::P256 {
            body["marshaling_algorithm"] = json!("jws");
            body["hash_algorithm"] = json!("sha2-256");
        }
        let response: Value = self
            .client()?
            .post(self.url("sign"))
            .header("X-Vault-Token", &self.access_key)
            .json(&body)
            .send()
            .await
            .context("calling transit sign")?
            .error_for_status()?
            .json()
            .await?;

        let Some(signature) = response.pointer("/data/signature").and_then(Value::as_str) else {
            bail!("transit response has no signature");
        };
        // format is `vault:v<version>:<base64 signature>`
        let encoded = signature.rsplit(':').next().unwrap_or(signature);
        match self.curve {
            Curve::Ed25519 => Ok(Base64::decode_vec(encoded)?),
            Curve::P256 => Ok(Base64UrlUnpadded::decode_vec(encoded.trim_end_matches('='))?),
        }
    }

    async fn public_jwk(&self) -> Result<PublicKeyJwk> {
        let response: Value = self
            .client()?
            .get(self.url("keys"))
            .header("X-Vault-Token", &self.access_key)
            .send()
            .await
            .context("calling transit keys")?
            .error_for_status()?
            .json()
            .await?;

        let latest = response
            .pointer("/data/latest_version")
            .and_then(Value::as_u64)
            .ok_or_else(|| anyhow!("transit response has no latest_version"))?;
        let Some(public_key) = response
            .pointer(&format!("/data/keys/{latest}/public_key"))
            .and_then(Value::as_str)
        else {
            bail!("transit response has no public key");
        };

        match self.curve {
            Curve::Ed25519 => PublicKeyJwk::from_bytes(Curve::Ed25519, &Base64::decode_vec(public_key)?),
            Curve::P256 => {
                use p256::elliptic_curve::sec1::ToEncodedPoint;
                use p256::pkcs8::DecodePublicKey;

                let key = p256::PublicKey::from_public_key_pem(public_key)
                    .map_err(|e| anyhow!("invalid transit public key: {e}"))?;
                PublicKeyJwk::from_bytes(Curve::P256, key.to_encoded_point(false).as_bytes())
            }
        }
    }

    fn algorithm(&self) -> Algorithm {
        Algorithm::for_curve(self.curve)
    }
}

impl From<LocalKey> for Key {
    fn from(key: LocalKey) -> Self {
        Self::Jwk(key)
    }
}

impl From<TransitKey> for Key {
    fn from(key: TransitKey) -> Self {
        Self::Transit(key)
    }
}
