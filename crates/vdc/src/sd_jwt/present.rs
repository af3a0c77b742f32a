//! # SD-JWT Presentation

use anyhow::{Result, anyhow};
use chrono::Utc;
use vcflow_jose::Signer;

use crate::jwt::{JwtOptions, sign_claims};
use crate::sd_jwt::{Disclosure, KB_JWT_TYP, KbJwtClaims, sd_hash};

/// Builds an SD-JWT presentation: the issued credential with the selected
/// disclosures, bound to the holder by a Key Binding JWT.
#[derive(Debug)]
pub struct SdJwtVpBuilder<C, A, S> {
    credential: C,
    client_id: A,
    nonce: Option<String>,
    disclose: Option<Vec<String>>,
    signer: S,
}

/// Builder has no credential.
#[doc(hidden)]
pub struct NoCredential;
/// Builder has a credential.
#[doc(hidden)]
pub struct HasCredential(String);

/// Builder has no client identifier.
#[doc(hidden)]
pub struct NoClientId;
/// Builder has a client identifier.
#[doc(hidden)]
pub struct HasClientId(String);

/// Builder has no signer.
#[doc(hidden)]
pub struct NoSigner;
/// Builder has a signer.
#[doc(hidden)]
pub struct HasSigner<'a, S: Signer>(&'a S);

impl Default for SdJwtVpBuilder<NoCredential, NoClientId, NoSigner> {
    fn default() -> Self {
        Self::new()
    }
}

impl SdJwtVpBuilder<NoCredential, NoClientId, NoSigner> {
    /// Create a new builder.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            credential: NoCredential,
            client_id: NoClientId,
            nonce: None,
            disclose: None,
            signer: NoSigner,
        }
    }
}

impl<A, S> SdJwtVpBuilder<NoCredential, A, S> {
    /// The issued SD-JWT, `<JWT>~<Disclosure 1>~...~`.
    #[must_use]
    pub fn credential(self, credential: impl Into<String>) -> SdJwtVpBuilder<HasCredential, A, S> {
        SdJwtVpBuilder {
            credential: HasCredential(credential.into()),
            client_id: self.client_id,
            nonce: self.nonce,
            disclose: self.disclose,
            signer: self.signer,
        }
    }
}

impl<C, S> SdJwtVpBuilder<C, NoClientId, S> {
    /// The verifier's client identifier, used as the KB-JWT `aud`.
    #[must_use]
    pub fn client_id(self, client_id: impl Into<String>) -> SdJwtVpBuilder<C, HasClientId, S> {
        SdJwtVpBuilder {
            credential: self.credential,
            client_id: HasClientId(client_id.into()),
            nonce: self.nonce,
            disclose: self.disclose,
            signer: self.signer,
        }
    }
}

// Optional fields
impl<C, A, S> SdJwtVpBuilder<C, A, S> {
    /// The authorization request nonce.
    #[must_use]
    pub fn nonce(mut self, nonce: impl Into<String>) -> Self {
        self.nonce = Some(nonce.into());
        self
    }

    /// Only present disclosures for the named claims. All disclosures are
    /// presented when not set.
    #[must_use]
    pub fn disclose<I, N>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<String>,
    {
        self.disclose = Some(names.into_iter().map(Into::into).collect());
        self
    }
}

impl<C, A> SdJwtVpBuilder<C, A, NoSigner> {
    /// The holder key signing the Key Binding JWT.
    #[must_use]
    pub fn signer<S: Signer>(self, signer: &S) -> SdJwtVpBuilder<C, A, HasSigner<'_, S>> {
        SdJwtVpBuilder {
            credential: self.credential,
            client_id: self.client_id,
            nonce: self.nonce,
            disclose: self.disclose,
            signer: HasSigner(signer),
        }
    }
}

impl<S: Signer> SdJwtVpBuilder<HasCredential, HasClientId, HasSigner<'_, S>> {
    /// Build the presentation:
    /// `<JWT>~<Disclosure 1>~...~<Disclosure N>~<KB-JWT>`.
    ///
    /// # Errors
    ///
    /// Returns an error if the credential is malformed, a requested claim
    /// has no disclosure, or signing fails.
    pub async fn build(self) -> Result<String> {
        let mut segments = self.credential.0.split('~');
        let issuer_jwt = segments.next().filter(|jwt| !jwt.is_empty());
        let Some(issuer_jwt) = issuer_jwt else {
            return Err(anyhow!("credential has no issuer-signed JWT"));
        };

        let mut presented = format!("{issuer_jwt}~");
        let available = segments.filter(|s| !s.is_empty());
        match &self.disclose {
            None => {
                for encoded in available {
                    presented.push_str(encoded);
                    presented.push('~');
                }
            }
            Some(names) => {
                let decoded = available
                    .map(|encoded| Ok((encoded, Disclosure::decode(encoded)?)))
                    .collect::<Result<Vec<_>>>()?;
                for name in names {
                    let Some((encoded, _)) = decoded.iter().find(|(_, d)| &d.name == name) else {
                        return Err(anyhow!("credential has no disclosure for `{name}`"));
                    };
                    presented.push_str(encoded);
                    presented.push('~');
                }
            }
        }

        let claims = KbJwtClaims {
            nonce: self.nonce.unwrap_or_default(),
            aud: self.client_id.0,
            iat: Utc::now().timestamp(),
            sd_hash: sd_hash(&presented),
        };
        let serde_json::Value::Object(claims) = serde_json::to_value(claims)? else {
            return Err(anyhow!("key binding claims must serialize to an object"));
        };
        let kb_jwt = sign_claims(claims, self.signer.0, KB_JWT_TYP, &JwtOptions::default()).await?;

        Ok(format!("{presented}{kb_jwt}"))
    }
}
