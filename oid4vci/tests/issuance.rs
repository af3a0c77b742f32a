//! Pre-Authorized Code Flow Tests

mod common;

use common::{
    ISSUER, create_offer, credential, issuance, offer_request, offered, send, token, verified_vc,
};
use serde_json::json;
use test_utils::{Issuer, Wallet};
use vcflow_oid4vci::jose::jws;
use vcflow_oid4vci::vdc::{Format, SdMap};
use vcflow_oid4vci::{
    CredentialOfferRequest, CredentialRequest, Error, MetadataRequest, SendType, SignRequest,
};

// Should issue a JWT credential whose subject is the holder proving
// possession of its key, signed by the issuer's did:key.
#[tokio::test]
async fn jwt_vc() {
    let provider = Issuer::new(ISSUER);
    let wallet = Wallet::new();

    let offer = create_offer(&provider, offer_request(vec![issuance(&provider, Format::JwtVcJson)]))
        .await
        .expect("should create offer");
    let credential_offer = offer.offer_type.as_object().expect("should be sent by value");
    assert_eq!(credential_offer.credential_issuer, ISSUER);
    assert_eq!(credential_offer.credential_configuration_ids, ["UniversityDegree_jwt_vc_json"]);
    assert!(offer.offer_uri.starts_with("openid-credential-offer://?credential_offer="));

    let grant = credential_offer.pre_authorized_code().expect("should have grant");
    assert_eq!(grant.pre_authorized_code, offer.session_id);
    assert!(grant.tx_code.is_none());

    let token = token(&provider, &offer.session_id, None).await.expect("should return token");
    let response =
        credential(&provider, &wallet, &token, Format::JwtVcJson).await.expect("should issue");
    let jwt = response.credential().expect("should be issued now");

    let vc = verified_vc(&provider, jwt).await;
    assert_eq!(vc["credentialSubject"]["id"], wallet.did());
    assert_eq!(vc["credentialSubject"]["degree"], "BSc");
    assert_eq!(vc["issuer"], provider.did());
    assert!(vc["id"].as_str().is_some_and(|id| id.starts_with("urn:uuid:")));

    let decoded = jws::decode_unverified::<serde_json::Value>(jwt).expect("should decode");
    assert_eq!(decoded.claims["sub"], wallet.did());
    assert_eq!(decoded.claims["iss"], provider.did());
}

// Should issue an SD-JWT credential with the selected fields as disclosures.
#[tokio::test]
async fn sd_jwt_vc() {
    let provider = Issuer::new(ISSUER);
    let wallet = Wallet::new();

    let mut request = issuance(&provider, Format::SdJwtVc);
    request.selective_disclosure = Some(SdMap::from_paths(["credentialSubject.degree"]));
    let offer =
        create_offer(&provider, offer_request(vec![request])).await.expect("should create offer");
    let token = token(&provider, &offer.session_id, None).await.expect("should return token");

    let response =
        credential(&provider, &wallet, &token, Format::SdJwtVc).await.expect("should issue");
    let sd_jwt = response.credential().expect("should be issued now");
    assert_eq!(sd_jwt.matches('~').count(), 2, "one disclosure plus trailing separator");

    let disclosed = vcflow_oid4vci::vdc::sd_jwt::verify(sd_jwt, &provider, None)
        .await
        .expect("should verify");
    assert_eq!(disclosed.disclosures.len(), 1);
    let subject = &disclosed.payload["vc"]["credentialSubject"];
    assert_eq!(subject["id"], wallet.did());
    assert_eq!(subject["degree"], "BSc");
}

// Should consume the issuance session when the pre-authorized code is
// exchanged: a second exchange finds nothing.
#[tokio::test]
async fn code_single_use() {
    let provider = Issuer::new(ISSUER);

    let offer = create_offer(&provider, offer_request(vec![issuance(&provider, Format::JwtVcJson)]))
        .await
        .expect("should create offer");
    token(&provider, &offer.session_id, None).await.expect("should return token");

    let err = token(&provider, &offer.session_id, None).await.expect_err("should be consumed");
    assert!(matches!(err, Error::UnmappedSessionId(_)));
}

// Should not exchange a pre-authorized code once its offer has expired.
#[tokio::test]
async fn expired_offer() {
    let provider = Issuer::new(ISSUER).configure(|config| config.offer_ttl_secs = 0);

    let offer = create_offer(&provider, offer_request(vec![issuance(&provider, Format::JwtVcJson)]))
        .await
        .expect("should create offer");
    tokio::time::sleep(std::time::Duration::from_millis(20)).await;

    let err = token(&provider, &offer.session_id, None).await.expect_err("should have expired");
    assert!(matches!(err, Error::UnmappedSessionId(_)));
}

// Should fail offer creation, not panic, when the offer lifetime is out of
// range.
#[tokio::test]
async fn offer_ttl_out_of_range() {
    let provider = Issuer::new(ISSUER).configure(|config| config.offer_ttl_secs = i64::MAX);

    let err = create_offer(&provider, offer_request(vec![issuance(&provider, Format::JwtVcJson)]))
        .await
        .expect_err("should fail");
    assert!(matches!(err, Error::ServerError(_)));
}

// Should require the transaction code when the offer was created with one,
// and leave the session in place after a mistyped code.
#[tokio::test]
async fn tx_code() {
    let provider = Issuer::new(ISSUER);

    let mut request = offer_request(vec![issuance(&provider, Format::JwtVcJson)]);
    request.tx_code_required = true;
    let offer = create_offer(&provider, request).await.expect("should create offer");
    let tx_code = offer.tx_code.clone().expect("should have tx_code");

    let grant = offer.offer_type.as_object().and_then(|o| o.pre_authorized_code()).cloned();
    let described = grant.and_then(|g| g.tx_code).expect("should describe tx_code");
    assert_eq!(described.length, Some(tx_code.len()));

    let err = token(&provider, &offer.session_id, None).await.expect_err("should need code");
    assert!(matches!(err, Error::InvalidGrant(_)));
    let err = token(&provider, &offer.session_id, Some("000000x".to_string()))
        .await
        .expect_err("should reject code");
    assert!(matches!(err, Error::InvalidGrant(_)));

    token(&provider, &offer.session_id, Some(tx_code)).await.expect("should return token");
}

// Should serve an offer sent by reference exactly once.
#[tokio::test]
async fn offer_by_ref() {
    let provider = Issuer::new(ISSUER);

    let mut request = offer_request(vec![issuance(&provider, Format::JwtVcJson)]);
    request.send_type = Some(SendType::ByRef);
    let offer = create_offer(&provider, request).await.expect("should create offer");

    let uri = offer.offer_type.as_uri().expect("should be sent by reference");
    assert!(uri.starts_with(&format!("{ISSUER}/credential_offer/")));
    assert!(offer.offer_uri.contains("credential_offer_uri="));

    let id = uri.rsplit('/').next().expect("should have id").to_string();
    let response = vcflow_oid4vci::handle(ISSUER, CredentialOfferRequest { id: id.clone() }, &provider)
        .await
        .expect("should fetch offer");
    let grant = response.0.pre_authorized_code().expect("should have grant");
    assert_eq!(grant.pre_authorized_code, offer.session_id);

    let err = vcflow_oid4vci::handle(ISSUER, CredentialOfferRequest { id }, &provider)
        .await
        .expect_err("should be fetched once");
    assert!(matches!(err, Error::InvalidRequest(_)));
}

// Should reject offers for configurations the issuer does not support.
#[tokio::test]
async fn unsupported_configuration() {
    let provider = Issuer::new(ISSUER).configure(|config| {
        config.credential_types.insert(
            "EmployeeID".to_string(),
            vec!["VerifiableCredential".to_string(), "EmployeeID".to_string()],
        );
    });

    let err = create_offer(&provider, offer_request(vec![issuance(&provider, Format::JwtVcJson)]))
        .await
        .expect_err("should reject configuration");
    assert!(matches!(err, Error::InvalidRequest(_)));

    let mut request = issuance(&provider, Format::JwtVcJson);
    request.credential_configuration_id = "EmployeeID_jwt_vc_json".to_string();
    create_offer(&provider, offer_request(vec![request])).await.expect("should create offer");
}

// Should not find a session for a nonce the token endpoint never issued.
#[tokio::test]
async fn unknown_nonce() {
    let provider = Issuer::new(ISSUER);
    let wallet = Wallet::new();
    let token = offered(&provider, Format::JwtVcJson).await;

    let request = CredentialRequest {
        format: Format::JwtVcJson,
        credential_configuration_id: None,
        proof: Some(wallet.proof(ISSUER, "not-a-nonce").await),
    };
    let err = send(&provider, &token.access_token, request).await.expect_err("should fail");
    assert!(matches!(err, Error::UnmappedNonce(_)));
}

// Should refuse credential requests without a known access token.
#[tokio::test]
async fn unknown_token() {
    let provider = Issuer::new(ISSUER);
    let wallet = Wallet::new();
    let token = offered(&provider, Format::JwtVcJson).await;

    let request = CredentialRequest {
        format: Format::JwtVcJson,
        credential_configuration_id: None,
        proof: Some(wallet.proof(ISSUER, &token.c_nonce).await),
    };
    let err = send(&provider, "not-a-token", request).await.expect_err("should fail");
    assert!(matches!(err, Error::InvalidToken(_)));
}

// Should reject a proof addressed to another issuer.
#[tokio::test]
async fn wrong_audience() {
    let provider = Issuer::new(ISSUER);
    let wallet = Wallet::new();
    let token = offered(&provider, Format::JwtVcJson).await;

    let request = CredentialRequest {
        format: Format::JwtVcJson,
        credential_configuration_id: None,
        proof: Some(wallet.proof("https://other.example", &token.c_nonce).await),
    };
    let err = send(&provider, &token.access_token, request).await.expect_err("should fail");
    assert!(matches!(err, Error::InvalidProof(_)));
}

// Should refuse to issue mdoc and Data Integrity credentials.
#[tokio::test]
async fn unsupported_format() {
    let provider = Issuer::new(ISSUER);
    let wallet = Wallet::new();
    let token = offered(&provider, Format::JwtVcJson).await;

    for format in [Format::MsoMdoc, Format::LdpVc] {
        let err = credential(&provider, &wallet, &token, format).await.expect_err("should fail");
        assert!(matches!(err, Error::UnsupportedCredentialFormat(_)));
    }
}

// Should issue a sample credential to a proof without a nonce only when demo
// fallback is enabled.
#[tokio::test]
async fn demo_fallback() {
    let wallet = Wallet::new();

    let provider = Issuer::new(ISSUER);
    let token = offered(&provider, Format::JwtVcJson).await;
    let request = CredentialRequest {
        format: Format::JwtVcJson,
        credential_configuration_id: None,
        proof: Some(wallet.proof_with(Some(wallet.kid()), ISSUER, None).await),
    };
    let err = send(&provider, &token.access_token, request.clone()).await.expect_err("should fail");
    assert!(matches!(err, Error::InvalidProof(_)));

    let provider = Issuer::new(ISSUER).configure(|config| config.demo_fallback = true);
    let token = offered(&provider, Format::JwtVcJson).await;
    let response = send(&provider, &token.access_token, request).await.expect("should issue demo");

    let vc = verified_vc(&provider, response.credential().expect("should be issued now")).await;
    assert_eq!(vc["credentialSubject"]["id"], wallet.did());
    assert!(vc["issuer"]["id"].as_str().is_some_and(|did| did.starts_with("did:jwk:")));
}

// Should sign a document as given.
#[tokio::test]
async fn sign() {
    let provider = Issuer::new(ISSUER);
    let wallet = Wallet::new();

    let request = SignRequest {
        issuer_key: provider.key(),
        issuer_did: None,
        subject_did: wallet.did().to_string(),
        credential: json!({
            "type": ["VerifiableCredential"],
            "credentialSubject": {"id": wallet.did()}
        }),
    };
    let response =
        vcflow_oid4vci::handle(ISSUER, request, &provider).await.expect("should sign");

    let claims = vcflow_oid4vci::vdc::jwt::verify(&response.credential, &provider)
        .await
        .expect("should verify");
    assert_eq!(claims["iss"], provider.did());
    assert_eq!(claims["vc"]["credentialSubject"]["id"], wallet.did());
}

// Should describe each configured type in every issuable format.
#[tokio::test]
async fn metadata() {
    let provider = Issuer::new(ISSUER).configure(|config| {
        config.credential_types.insert(
            "EmployeeID".to_string(),
            vec!["VerifiableCredential".to_string(), "EmployeeID".to_string()],
        );
    });

    let response =
        vcflow_oid4vci::handle(ISSUER, MetadataRequest, &provider).await.expect("should describe");
    let metadata = serde_json::to_value(&response.body).expect("should serialize");

    assert_eq!(metadata["credential_issuer"], ISSUER);
    let configurations = metadata["credential_configurations_supported"]
        .as_object()
        .expect("should list configurations");
    assert!(configurations.contains_key("EmployeeID_jwt_vc_json"));
    assert!(configurations.contains_key("EmployeeID_vc+sd-jwt"));
}
