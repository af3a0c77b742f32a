//! Steps of the pre-authorized code flow shared by the issuance tests.

#![allow(dead_code)]

use serde_json::{Value, json};
use test_utils::{Issuer, Wallet};
use vcflow_oid4vci::vdc::Format;
use vcflow_oid4vci::{
    CreateOfferRequest, CreateOfferResponse, CredentialHeaders, CredentialRequest,
    CredentialResponse, Error, IssuanceRequest, Request, TokenGrantType, TokenRequest,
    TokenResponse,
};

pub const ISSUER: &str = "https://issuer.example";

/// An offer for a single credential whose subject is bound to the holder.
pub fn issuance(issuer: &Issuer, format: Format) -> IssuanceRequest {
    IssuanceRequest {
        issuer_key: issuer.key(),
        issuer_did: None,
        issuer_kid: None,
        credential_configuration_id: format!("UniversityDegree_{format}"),
        credential_data: json!({
            "@context": ["https://www.w3.org/2018/credentials/v1"],
            "type": ["VerifiableCredential", "UniversityDegree"],
            "issuer": "<issuerDid>",
            "credentialSubject": {"id": "<subjectDid>", "name": "Alice", "degree": "BSc"}
        }),
        mapping: Some(json!({
            "id": "<uuid>",
            "issuanceDate": "<timestamp>",
            "expirationDate": "<timestamp-in:365d>"
        })),
        selective_disclosure: None,
    }
}

pub fn offer_request(credentials: Vec<IssuanceRequest>) -> CreateOfferRequest {
    CreateOfferRequest {
        credentials,
        session_id: None,
        tx_code_required: false,
        send_type: None,
    }
}

pub async fn create_offer(
    issuer: &Issuer, request: CreateOfferRequest,
) -> Result<CreateOfferResponse, Error> {
    vcflow_oid4vci::handle(ISSUER, request, issuer).await.map(|r| r.body)
}

pub async fn token(
    issuer: &Issuer, pre_authorized_code: &str, tx_code: Option<String>,
) -> Result<TokenResponse, Error> {
    let request = TokenRequest {
        grant_type: TokenGrantType::PreAuthorizedCode {
            pre_authorized_code: pre_authorized_code.to_string(),
            tx_code,
        },
        client_id: None,
    };
    vcflow_oid4vci::handle(ISSUER, request, issuer).await.map(|r| r.body)
}

/// Request a credential with a proof bound to the token's `c_nonce`.
pub async fn credential(
    issuer: &Issuer, wallet: &Wallet, token: &TokenResponse, format: Format,
) -> Result<CredentialResponse, Error> {
    let request = CredentialRequest {
        format,
        credential_configuration_id: None,
        proof: Some(wallet.proof(ISSUER, &token.c_nonce).await),
    };
    send(issuer, &token.access_token, request).await
}

pub async fn send(
    issuer: &Issuer, access_token: &str, body: CredentialRequest,
) -> Result<CredentialResponse, Error> {
    let request = Request {
        body,
        headers: CredentialHeaders {
            authorization: format!("Bearer {access_token}"),
        },
    };
    vcflow_oid4vci::handle(ISSUER, request, issuer).await.map(|r| r.body)
}

/// Offer, exchange and return the token for a single credential.
pub async fn offered(issuer: &Issuer, format: Format) -> TokenResponse {
    let offer = create_offer(issuer, offer_request(vec![issuance(issuer, format)]))
        .await
        .expect("should create offer");
    token(issuer, &offer.session_id, None).await.expect("should return token")
}

/// The `vc` claim of a JWT credential, signature checked.
pub async fn verified_vc(issuer: &Issuer, credential: &str) -> Value {
    let claims = vcflow_oid4vci::vdc::jwt::verify(credential, issuer).await.expect("should verify");
    claims["vc"].clone()
}
