//! # W3C-VC Presentation

use anyhow::Result;
use chrono::Utc;
use serde_json::{Map, Value, json};
use vcflow_jose::Signer;

use crate::issue::issuer_kid;
use crate::jwt::{JwtOptions, sign_claims};
use crate::w3c_vc::BASE_CONTEXT;

/// Builds a holder-signed JWT presentation (`jwt_vp_json`) of one or more
/// JWT credentials.
#[derive(Debug)]
pub struct W3cVpBuilder<C, A, S> {
    credentials: C,
    client_id: A,
    nonce: Option<String>,
    holder: Option<String>,
    signer: S,
}

/// Builder has no credentials.
#[doc(hidden)]
pub struct NoCredentials;
/// Builder has credentials.
#[doc(hidden)]
pub struct HasCredentials(Vec<Value>);

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

impl Default for W3cVpBuilder<NoCredentials, NoClientId, NoSigner> {
    fn default() -> Self {
        Self::new()
    }
}

impl W3cVpBuilder<NoCredentials, NoClientId, NoSigner> {
    /// Create a new builder.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            credentials: NoCredentials,
            client_id: NoClientId,
            nonce: None,
            holder: None,
            signer: NoSigner,
        }
    }
}

impl<A, S> W3cVpBuilder<NoCredentials, A, S> {
    /// Credentials to present, usually compact JWTs.
    #[must_use]
    pub fn credentials<I, V>(self, credentials: I) -> W3cVpBuilder<HasCredentials, A, S>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        W3cVpBuilder {
            credentials: HasCredentials(credentials.into_iter().map(Into::into).collect()),
            client_id: self.client_id,
            nonce: self.nonce,
            holder: self.holder,
            signer: self.signer,
        }
    }
}

impl<C, S> W3cVpBuilder<C, NoClientId, S> {
    /// The verifier's client identifier, used as the `aud` claim.
    #[must_use]
    pub fn client_id(self, client_id: impl Into<String>) -> W3cVpBuilder<C, HasClientId, S> {
        W3cVpBuilder {
            credentials: self.credentials,
            client_id: HasClientId(client_id.into()),
            nonce: self.nonce,
            holder: self.holder,
            signer: self.signer,
        }
    }
}

// Optional fields
impl<C, A, S> W3cVpBuilder<C, A, S> {
    /// The authorization request nonce.
    #[must_use]
    pub fn nonce(mut self, nonce: impl Into<String>) -> Self {
        self.nonce = Some(nonce.into());
        self
    }

    /// The holder DID. Defaults to the `did:key` of the signing key.
    #[must_use]
    pub fn holder(mut self, holder: impl Into<String>) -> Self {
        self.holder = Some(holder.into());
        self
    }
}

impl<C, A> W3cVpBuilder<C, A, NoSigner> {
    /// The holder key signing the presentation.
    #[must_use]
    pub fn signer<S: Signer>(self, signer: &S) -> W3cVpBuilder<C, A, HasSigner<'_, S>> {
        W3cVpBuilder {
            credentials: self.credentials,
            client_id: self.client_id,
            nonce: self.nonce,
            holder: self.holder,
            signer: HasSigner(signer),
        }
    }
}

impl<S: Signer> W3cVpBuilder<HasCredentials, HasClientId, HasSigner<'_, S>> {
    /// Build the presentation as a compact JWT.
    ///
    /// # Errors
    ///
    /// Returns an error if the holder DID cannot be derived or signing fails.
    pub async fn build(self) -> Result<String> {
        let signer = self.signer.0;
        let holder = match self.holder {
            Some(holder) => holder,
            None => vcflow_did::key::did_from_jwk(&signer.public_jwk().await?)?,
        };

        let mut claims = Map::new();
        claims.insert("iss".into(), holder.clone().into());
        claims.insert("aud".into(), self.client_id.0.into());
        if let Some(nonce) = self.nonce {
            claims.insert("nonce".into(), nonce.into());
        }
        claims.insert("iat".into(), Utc::now().timestamp().into());
        claims.insert("jti".into(), format!("urn:uuid:{}", uuid::Uuid::new_v4()).into());
        claims.insert(
            "vp".into(),
            json!({
                "@context": [BASE_CONTEXT],
                "type": ["VerifiablePresentation"],
                "holder": holder,
                "verifiableCredential": self.credentials.0,
            }),
        );

        let options = JwtOptions {
            kid: issuer_kid(&holder, &signer.key_id().await?),
            ..JwtOptions::default()
        };
        sign_claims(claims, signer, "JWT", &options).await
    }
}
