//! # JSON Web Encryption (JWE)
//!
//! Compact JWE ([RFC7516]) using direct key agreement (`ECDH-ES`) over P-256
//! with `A256GCM` content encryption. This is the encryption used by wallets
//! answering an OID4VP request in `direct_post.jwt` response mode.
//!
//! [RFC7516]: https://www.rfc-editor.org/rfc/rfc7516

use aes_gcm::aead::AeadInPlace;
use aes_gcm::{Aes256Gcm, KeyInit, Nonce, Tag};
use anyhow::{Context, Result, anyhow, bail};
use base64ct::{Base64UrlUnpadded, Encoding};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::jwk::{Curve, PrivateKeyJwk, PublicKeyJwk};

const ALG: &str = "ECDH-ES";
const ENC: &str = "A256GCM";

/// Protected header of a JWE.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct Header {
    /// Key management algorithm.
    pub alg: String,

    /// Content encryption algorithm.
    pub enc: String,

    /// Ephemeral public key of the sender.
    pub epk: PublicKeyJwk,

    /// Recipient key identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,

    /// Agreement `PartyUInfo`, base64url.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub apu: Option<String>,

    /// Agreement `PartyVInfo`, base64url.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub apv: Option<String>,
}

/// Encrypt `plaintext` to `recipient`, a P-256 public key.
///
/// # Errors
///
/// Returns an error if the recipient is not a P-256 key or encryption fails.
pub fn encrypt(plaintext: &[u8], recipient: &PublicKeyJwk, apv: Option<&[u8]>) -> Result<String> {
    if recipient.crv != Curve::P256 {
        bail!("ECDH-ES recipient must be a P-256 key");
    }

    let ephemeral = loop {
        let bytes: [u8; 32] = rand::random();
        if let Ok(secret) = p256::SecretKey::from_slice(&bytes) {
            break secret;
        }
    };
    let epk = {
        use p256::elliptic_curve::sec1::ToEncodedPoint;
        PublicKeyJwk::from_bytes(Curve::P256, ephemeral.public_key().to_encoded_point(false).as_bytes())?
    };

    let shared = p256::ecdh::diffie_hellman(ephemeral.to_nonzero_scalar(), recipient.p256_key()?.as_affine());
    let apv = apv.unwrap_or_default();
    let cek = derive_key(shared.raw_secret_bytes(), b"", apv)?;

    let header = Header {
        alg: ALG.to_string(),
        enc: ENC.to_string(),
        epk,
        kid: recipient.kid.clone(),
        apu: None,
        apv: (!apv.is_empty()).then(|| Base64UrlUnpadded::encode_string(apv)),
    };
    let protected = Base64UrlUnpadded::encode_string(&serde_json::to_vec(&header)?);

    let iv: [u8; 12] = rand::random();
    let mut buffer = plaintext.to_vec();
    let cipher = Aes256Gcm::new_from_slice(&cek).map_err(|e| anyhow!("invalid key: {e}"))?;
    let tag = cipher
        .encrypt_in_place_detached(Nonce::from_slice(&iv), protected.as_bytes(), &mut buffer)
        .map_err(|e| anyhow!("encryption failed: {e}"))?;

    Ok(format!(
        "{protected}..{}.{}.{}",
        Base64UrlUnpadded::encode_string(&iv),
        Base64UrlUnpadded::encode_string(&buffer),
        Base64UrlUnpadded::encode_string(&tag)
    ))
}

/// Decrypt a compact JWE with the recipient's private P-256 key.
///
/// # Errors
///
/// Returns an error if the JWE is malformed, uses unsupported algorithms,
/// or fails authentication.
pub fn decrypt(jwe: &str, recipient: &PrivateKeyJwk) -> Result<Vec<u8>> {
    let parts: Vec<&str> = jwe.split('.').collect();
    let [protected, encrypted_key, iv, ciphertext, tag] = parts.as_slice() else {
        bail!("compact JWE must have 5 segments, found {}", parts.len());
    };
    if !encrypted_key.is_empty() {
        bail!("ECDH-ES direct key agreement has no encrypted key");
    }

    let header: Header = serde_json::from_slice(&Base64UrlUnpadded::decode_vec(protected)?)
        .context("decoding JWE header")?;
    if header.alg != ALG || header.enc != ENC {
        bail!("unsupported JWE algorithms: {}/{}", header.alg, header.enc);
    }

    let secret = p256::SecretKey::from_slice(&recipient.secret_bytes()?)
        .map_err(|e| anyhow!("invalid recipient key: {e}"))?;
    let shared = p256::ecdh::diffie_hellman(secret.to_nonzero_scalar(), header.epk.p256_key()?.as_affine());
    let apu = header.apu.as_deref().map(Base64UrlUnpadded::decode_vec).transpose()?.unwrap_or_default();
    let apv = header.apv.as_deref().map(Base64UrlUnpadded::decode_vec).transpose()?.unwrap_or_default();
    let cek = derive_key(shared.raw_secret_bytes(), &apu, &apv)?;

    let iv = Base64UrlUnpadded::decode_vec(iv)?;
    let tag = Base64UrlUnpadded::decode_vec(tag)?;
    if iv.len() != 12 || tag.len() != 16 {
        bail!("invalid JWE iv or tag length");
    }
    let mut buffer = Base64UrlUnpadded::decode_vec(ciphertext)?;
    let cipher = Aes256Gcm::new_from_slice(&cek).map_err(|e| anyhow!("invalid key: {e}"))?;
    cipher
        .decrypt_in_place_detached(
            Nonce::from_slice(&iv),
            protected.as_bytes(),
            &mut buffer,
            Tag::from_slice(&tag),
        )
        .map_err(|e| anyhow!("decryption failed: {e}"))?;

    Ok(buffer)
}

/// Read the protected header of a compact JWE without decrypting it.
///
/// # Errors
///
/// Returns an error if the header segment cannot be decoded.
pub fn header(jwe: &str) -> Result<Header> {
    let protected = jwe.split('.').next().unwrap_or_default();
    Ok(serde_json::from_slice(&Base64UrlUnpadded::decode_vec(protected)?)?)
}

// Concat KDF (NIST SP 800-56A) as profiled by RFC 7518 section 4.6.
fn derive_key(shared_secret: &[u8], apu: &[u8], apv: &[u8]) -> Result<[u8; 32]> {
    const KEY_BITS: u32 = 256;

    let mut other_info = vec![];
    for field in [ENC.as_bytes(), apu, apv] {
        let len = u32::try_from(field.len()).context("KDF field too long")?;
        other_info.extend(len.to_be_bytes());
        other_info.extend(field);
    }
    other_info.extend(KEY_BITS.to_be_bytes());

    let mut key = [0u8; 32];
    concat_kdf::derive_key_into::<Sha256>(shared_secret, &other_info, &mut key)
        .map_err(|e| anyhow!("key derivation failed: {e}"))?;
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::{LocalKey, Signer};

    #[tokio::test]
    async fn round_trip() {
        let recipient = LocalKey::generate(Curve::P256).unwrap();
        let public = recipient.public_jwk().await.unwrap();

        let jwe = encrypt(br#"{"vp_token":"abc"}"#, &public, Some(b"nonce-123")).unwrap();
        assert_eq!(header(&jwe).unwrap().alg, "ECDH-ES");

        let plaintext = decrypt(&jwe, &recipient.jwk).unwrap();
        assert_eq!(plaintext, br#"{"vp_token":"abc"}"#);
    }

    #[tokio::test]
    async fn wrong_recipient_fails() {
        let recipient = LocalKey::generate(Curve::P256).unwrap();
        let other = LocalKey::generate(Curve::P256).unwrap();
        let jwe = encrypt(b"secret", &recipient.public_jwk().await.unwrap(), None).unwrap();
        assert!(decrypt(&jwe, &other.jwk).is_err());
    }
}
