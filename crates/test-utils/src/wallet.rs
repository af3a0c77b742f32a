use anyhow::Result;
use chrono::Utc;
use vcflow_jose::jws::{self, Header};
use vcflow_jose::{Curve, LocalKey, jwe};
use vcflow_oid4vci::PROOF_JWT_TYP;
use vcflow_oid4vci::types::{Proof, ProofClaims};
use vcflow_oid4vp::types::{AuthorizationRequest, ResponseParameters, ResponseRequest};
use vcflow_vdc::sd_jwt::SdJwtVpBuilder;
use vcflow_vdc::w3c_vc::W3cVpBuilder;

/// A holder: one key, identified by its `did:key`.
#[derive(Clone, Debug)]
pub struct Wallet {
    key: LocalKey,
    did: String,
}

impl Default for Wallet {
    fn default() -> Self {
        Self::new()
    }
}

impl Wallet {
    #[must_use]
    pub fn new() -> Self {
        let key = LocalKey::generate(Curve::Ed25519).expect("should generate");
        let did = vcflow_did::key::did_from_jwk(&key.jwk.public).expect("should derive DID");
        Self { key, did }
    }

    #[must_use]
    pub fn did(&self) -> &str {
        &self.did
    }

    /// The DID URL of the holder key.
    #[must_use]
    pub fn kid(&self) -> String {
        let multibase = self.did.strip_prefix("did:key:").unwrap_or_default();
        format!("{}#{multibase}", self.did)
    }

    /// A proof of possession for the credential endpoint.
    pub async fn proof(&self, aud: &str, nonce: &str) -> Proof {
        self.proof_with(Some(self.kid()), aud, Some(nonce)).await
    }

    /// A proof of possession with the given header `kid` and `nonce`.
    pub async fn proof_with(&self, kid: Option<String>, aud: &str, nonce: Option<&str>) -> Proof {
        let header = Header {
            typ: Some(PROOF_JWT_TYP.to_string()),
            kid,
            ..Header::default()
        };
        let claims = ProofClaims {
            iss: None,
            aud: aud.to_string(),
            iat: Utc::now().timestamp(),
            nonce: nonce.map(ToString::to_string),
        };
        let jwt = jws::encode(header, &claims, &self.key).await.expect("should sign proof");
        Proof::Jwt { jwt }
    }

    /// A JWT presentation of `credentials` answering `request`.
    pub async fn present(&self, credentials: &[String], request: &AuthorizationRequest) -> Result<String> {
        W3cVpBuilder::new()
            .credentials(credentials.iter().cloned())
            .client_id(&request.client_id)
            .nonce(&request.nonce)
            .holder(&self.did)
            .signer(&self.key)
            .build()
            .await
    }

    /// An SD-JWT presentation of `credential` disclosing `disclose`.
    pub async fn present_sd_jwt(
        &self, credential: &str, disclose: &[&str], request: &AuthorizationRequest,
    ) -> Result<String> {
        SdJwtVpBuilder::new()
            .credential(credential)
            .client_id(&request.client_id)
            .nonce(&request.nonce)
            .disclose(disclose.iter().copied())
            .signer(&self.key)
            .build()
            .await
    }

    /// The wallet's response to `request`, encrypted when the request asks
    /// for `direct_post.jwt`.
    pub fn respond(&self, vp_token: String, request: &AuthorizationRequest) -> Result<ResponseRequest> {
        let encryption_key = request
            .client_metadata
            .as_ref()
            .and_then(|metadata| metadata.jwks.as_ref())
            .and_then(|jwks| jwks.keys.first());
        let Some(jwk) = encryption_key else {
            return Ok(ResponseRequest {
                vp_token: Some(vp_token.into()),
                state: Some(request.state.clone()),
                ..ResponseRequest::default()
            });
        };

        let parameters = ResponseParameters {
            vp_token: vp_token.into(),
            presentation_submission: None,
            state: Some(request.state.clone()),
        };
        let plaintext = serde_json::to_vec(&parameters)?;
        let response = jwe::encrypt(&plaintext, jwk, Some(request.nonce.as_bytes()))?;
        Ok(ResponseRequest {
            session_id: Some(request.state.clone()),
            response: Some(response),
            ..ResponseRequest::default()
        })
    }
}
