//! Tests for the Verifier API

use std::time::Duration;

use serde_json::{Value, json};
use test_utils::{Issuer, Verifier, Wallet};
use vcflow_oid4vp::jose::jws;
use vcflow_oid4vp::jose::{Curve, LocalKey};
use vcflow_oid4vp::policy::PolicyRequest;
use vcflow_oid4vp::vdc::{Format, IssueRequest, JwtOptions, SdMap, SystemEnvironment};
use vcflow_oid4vp::{
    AuthorizationRequest, CreateRequestRequest, CreateRequestResponse, Error,
    PresentationDefinitionRequest, RequestObject, RequestObjectRequest, RequestReference,
    RequestedCredential, ResponseMode, ResponseRequest, ResponseResponse, SessionInfoRequest,
    StatusCallback, resolve_presentation_definition, verify_request_object,
};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const VERIFIER: &str = "https://verifier.example";
const ISSUER: &str = "https://issuer.example";

fn degree_template() -> Value {
    json!({
        "@context": ["https://www.w3.org/2018/credentials/v1"],
        "type": ["VerifiableCredential", "UniversityDegree"],
        "issuer": "<issuerDid>",
        "credentialSubject": {"id": "<subjectDid>", "name": "Alice", "degree": "BSc"}
    })
}

fn issue_request(issuer: &Issuer, wallet: &Wallet) -> IssueRequest<'static> {
    IssueRequest {
        template: degree_template(),
        mapping: Some(json!({"id": "<uuid>", "issuanceDate": "<timestamp>"})),
        issuer_did: issuer.did(),
        issuer_kid: None,
        subject_did: wallet.did().to_string(),
        options: JwtOptions::default(),
        env: &SystemEnvironment,
    }
}

async fn degree(issuer: &Issuer, wallet: &Wallet) -> String {
    vcflow_oid4vp::vdc::issue_jwt_vc(&issue_request(issuer, wallet), &issuer.key())
        .await
        .expect("should issue")
}

async fn create(
    provider: &Verifier, request: CreateRequestRequest,
) -> Result<CreateRequestResponse, Error> {
    vcflow_oid4vp::handle(VERIFIER, request, provider).await.map(|r| r.body)
}

fn degree_request() -> CreateRequestRequest {
    CreateRequestRequest {
        request_credentials: vec!["UniversityDegree".into()],
        ..CreateRequestRequest::default()
    }
}

async fn respond(
    provider: &Verifier, request: ResponseRequest,
) -> Result<vcflow_oid4vp::api::Response<ResponseResponse>, Error> {
    vcflow_oid4vp::handle(VERIFIER, request, provider).await
}

async fn session(provider: &Verifier, session_id: &str) -> vcflow_oid4vp::PresentationSession {
    let request = SessionInfoRequest {
        session_id: session_id.to_string(),
    };
    vcflow_oid4vp::handle(VERIFIER, request, provider).await.expect("should find session").body.0
}

// Should verify a JWT presentation of a JWT credential with the default
// signature policies, and report the outcome on the session.
#[tokio::test]
async fn same_device() {
    let provider = Verifier::new(VERIFIER);
    let issuer = Issuer::new(ISSUER);
    let wallet = Wallet::new();

    let mut request = degree_request();
    request.success_redirect_uri = Some("https://verifier.example/success/$id".to_string());
    let created = create(&provider, request).await.expect("should create request");

    assert!(created.request_uri.starts_with("openid4vp://authorize?"));
    let parsed = AuthorizationRequest::from_uri(&created.request_uri).expect("should parse");
    assert_eq!(parsed, created.request);
    assert_eq!(parsed.state, created.session_id);
    assert_eq!(
        parsed.response_uri,
        format!("{VERIFIER}/openid4vc/verify/{}", created.session_id)
    );
    let definition = parsed.presentation_definition.as_ref().expect("should be sent by value");
    assert_eq!(definition.requested_types().collect::<Vec<_>>(), ["UniversityDegree"]);

    let credential = degree(&issuer, &wallet).await;
    let vp = wallet.present(&[credential], &parsed).await.expect("should present");
    let mut response = wallet.respond(vp, &parsed).expect("should respond");
    response.session_id = Some(created.session_id.clone());

    let response = respond(&provider, response).await.expect("should verify");
    let redirect = format!("https://verifier.example/success/{}", created.session_id);
    assert_eq!(response.location.as_deref(), Some(redirect.as_str()));
    assert_eq!(response.body.redirect_uri.as_deref(), Some(redirect.as_str()));

    let session = session(&provider, &created.session_id).await;
    let verification = session.verification.expect("should be verified");
    assert!(verification.success);

    let results = &verification.results.results;
    assert_eq!(results.len(), 3, "presentation, one credential, then the definition check");
    let checks: Vec<&str> = results[0].policy_results.iter().map(|r| r.policy.as_str()).collect();
    assert_eq!(checks, ["signature"]);
    assert_eq!(results[1].credential, "UniversityDegree");
    assert_eq!(results[2].credential, "presentation-definition");
    assert!(results[2].policy_results.iter().all(|r| r.is_success));
}

// Should verify an SD-JWT presentation with a key binding JWT.
#[tokio::test]
async fn sd_jwt() {
    let provider = Verifier::new(VERIFIER);
    let issuer = Issuer::new(ISSUER);
    let wallet = Wallet::new();

    let request = CreateRequestRequest {
        request_credentials: vec![RequestedCredential::Detailed {
            type_: "UniversityDegree".to_string(),
            format: Format::SdJwtVc,
            policies: None,
        }],
        ..CreateRequestRequest::default()
    };
    let created = create(&provider, request).await.expect("should create request");
    let definition = created.request.presentation_definition.as_ref().expect("should have definition");
    assert_eq!(
        definition.input_descriptors[0].constraints.limit_disclosure.as_deref(),
        Some("required")
    );

    let sd_map = SdMap::from_paths(["credentialSubject.degree"]);
    let credential = vcflow_oid4vp::vdc::issue_sd_jwt_vc(
        &issue_request(&issuer, &wallet),
        &issuer.key(),
        Some(&sd_map),
    )
    .await
    .expect("should issue");
    let vp = wallet
        .present_sd_jwt(&credential, &["degree"], &created.request)
        .await
        .expect("should present");
    let response = wallet.respond(vp, &created.request).expect("should respond");

    let response = respond(&provider, response).await.expect("should verify");
    assert!(response.location.is_none());

    let session = session(&provider, &created.session_id).await;
    let verification = session.verification.expect("should be verified");
    assert!(verification.success, "{:?}", verification.results.failures());
    let results = &verification.results.results;
    let checks: Vec<&str> = results[0].policy_results.iter().map(|r| r.policy.as_str()).collect();
    assert_eq!(checks, ["sd-jwt-vc-signature"]);
    assert_eq!(results.last().map(|r| r.credential.as_str()), Some("presentation-definition"));
}

// Should return the response parameters encrypted to the session key when
// asked for `direct_post.jwt`.
#[tokio::test]
async fn encrypted_response() {
    let provider = Verifier::new(VERIFIER);
    let issuer = Issuer::new(ISSUER);
    let wallet = Wallet::new();

    let mut request = degree_request();
    request.response_mode = ResponseMode::DirectPostJwt;
    let created = create(&provider, request).await.expect("should create request");

    let metadata = created.request.client_metadata.as_ref().expect("should have metadata");
    assert_eq!(metadata.authorization_encrypted_response_alg.as_deref(), Some("ECDH-ES"));
    assert_eq!(metadata.authorization_encrypted_response_enc.as_deref(), Some("A256GCM"));

    let credential = degree(&issuer, &wallet).await;
    let vp = wallet.present(&[credential], &created.request).await.expect("should present");
    let response = wallet.respond(vp, &created.request).expect("should respond");
    assert!(response.vp_token.is_none(), "token travels encrypted");

    respond(&provider, response).await.expect("should verify");
    let session = session(&provider, &created.session_id).await;
    assert!(session.verification.is_some_and(|v| v.success));
}

// Should accept a single response per session.
#[tokio::test]
async fn single_response() {
    let provider = Verifier::new(VERIFIER);
    let issuer = Issuer::new(ISSUER);
    let wallet = Wallet::new();

    let created = create(&provider, degree_request()).await.expect("should create request");
    let credential = degree(&issuer, &wallet).await;
    let vp = wallet.present(&[credential], &created.request).await.expect("should present");
    let response = wallet.respond(vp, &created.request).expect("should respond");

    respond(&provider, response.clone()).await.expect("should verify");
    let err = respond(&provider, response).await.expect_err("should reject second response");
    assert!(matches!(err, Error::InvalidRequest(_)));
}

// Should reject a response that presents nothing, leaving the session
// unverified.
#[tokio::test]
async fn empty_presentation() {
    let provider = Verifier::new(VERIFIER);
    let created = create(&provider, degree_request()).await.expect("should create request");

    let response = ResponseRequest {
        vp_token: Some(Vec::<String>::new().into()),
        state: Some(created.session_id.clone()),
        ..ResponseRequest::default()
    };
    let err = respond(&provider, response).await.expect_err("should reject");
    assert!(matches!(err, Error::InvalidRequest(_)));

    let session = session(&provider, &created.session_id).await;
    assert!(session.verification.is_none());
}

// Should reject requests mixing credential formats.
#[tokio::test]
async fn inconsistent_format() {
    let provider = Verifier::new(VERIFIER);

    let request = CreateRequestRequest {
        request_credentials: vec![
            "UniversityDegree".into(),
            RequestedCredential::Detailed {
                type_: "Identity".to_string(),
                format: Format::SdJwtVc,
                policies: None,
            },
        ],
        ..CreateRequestRequest::default()
    };
    let err = create(&provider, request).await.expect_err("should reject");
    assert_eq!(err, Error::InconsistentFormat("Credentials formats must be distinct".to_string()));
}

// Should reject unknown policies when the session is created.
#[tokio::test]
async fn unknown_policy() {
    let provider = Verifier::new(VERIFIER);

    let mut request = degree_request();
    request.vc_policies = Some(vec!["no-such-policy".into()]);
    let err = create(&provider, request).await.expect_err("should reject");
    assert!(matches!(err, Error::InvalidRequest(_)));
}

// Should not find sessions that were never created.
#[tokio::test]
async fn unknown_session() {
    let provider = Verifier::new(VERIFIER);

    let response = ResponseRequest {
        vp_token: Some("eyJ.eyJ.sig".to_string().into()),
        state: Some("not-a-session".to_string()),
        ..ResponseRequest::default()
    };
    let err = respond(&provider, response).await.expect_err("should fail");
    assert!(matches!(err, Error::SessionNotFound(_)));

    let request = SessionInfoRequest {
        session_id: "not-a-session".to_string(),
    };
    let err = vcflow_oid4vp::handle(VERIFIER, request, &provider).await.expect_err("should fail");
    assert!(matches!(err, Error::SessionNotFound(_)));
}

// Should forget a session once its lifetime has passed.
#[tokio::test]
async fn expired_session() {
    let provider = Verifier::new(VERIFIER).configure(|config| config.session_ttl_secs = 0);
    let created = create(&provider, degree_request()).await.expect("should create request");
    tokio::time::sleep(Duration::from_millis(20)).await;

    let request = SessionInfoRequest {
        session_id: created.session_id.clone(),
    };
    let err = vcflow_oid4vp::handle(VERIFIER, request, &provider).await.expect_err("should expire");
    assert!(matches!(err, Error::SessionNotFound(_)));

    let response = ResponseRequest {
        vp_token: Some("eyJ.eyJ.sig".to_string().into()),
        state: Some(created.session_id),
        ..ResponseRequest::default()
    };
    let err = respond(&provider, response).await.expect_err("should expire");
    assert!(matches!(err, Error::SessionNotFound(_)));
}

// Should check a credential with its type's policies in place of the VC
// policies.
#[tokio::test]
async fn type_policies() {
    let provider = Verifier::new(VERIFIER);
    let issuer = Issuer::new(ISSUER);
    let wallet = Wallet::new();

    let request = CreateRequestRequest {
        request_credentials: vec![RequestedCredential::Detailed {
            type_: "UniversityDegree".to_string(),
            format: Format::JwtVcJson,
            policies: Some(vec!["signature".into()]),
        }],
        vc_policies: Some(vec![PolicyRequest::WithArgs {
            policy: "allowed-issuer".to_string(),
            args: Some(json!("did:web:trusted.example")),
        }]),
        ..CreateRequestRequest::default()
    };
    let created = create(&provider, request).await.expect("should create request");

    let credential = degree(&issuer, &wallet).await;
    let vp = wallet.present(&[credential], &created.request).await.expect("should present");
    let response = wallet.respond(vp, &created.request).expect("should respond");
    respond(&provider, response).await.expect("should verify");

    let session = session(&provider, &created.session_id).await;
    let verification = session.verification.expect("should be verified");
    assert!(verification.success, "{:?}", verification.results.failures());

    let degree = &verification.results.results[1];
    assert_eq!(degree.credential, "UniversityDegree");
    let checks: Vec<&str> = degree.policy_results.iter().map(|r| r.policy.as_str()).collect();
    assert_eq!(checks, ["signature"]);
}

// Should report failed policies as an error when no error redirect is set,
// and redirect with the session id substituted when one is.
#[tokio::test]
async fn failed_policy() {
    let issuer = Issuer::new(ISSUER);
    let wallet = Wallet::new();
    let allowed_issuer = PolicyRequest::WithArgs {
        policy: "allowed-issuer".to_string(),
        args: Some(json!("did:web:trusted.example")),
    };

    let provider = Verifier::new(VERIFIER);
    let mut request = degree_request();
    request.vc_policies = Some(vec!["signature".into(), allowed_issuer.clone()]);
    let created = create(&provider, request).await.expect("should create request");

    let credential = degree(&issuer, &wallet).await;
    let vp = wallet.present(&[credential.clone()], &created.request).await.expect("should present");
    let response = wallet.respond(vp, &created.request).expect("should respond");
    let err = respond(&provider, response).await.expect_err("should fail policy");
    let Error::PolicyEvaluationFailure(failures) = err else {
        panic!("expected policy failure, got {err:?}");
    };
    assert!(failures.starts_with("allowed-issuer: "), "{failures}");

    let session = session(&provider, &created.session_id).await;
    assert!(session.verification.is_some_and(|v| !v.success));

    let provider = Verifier::new(VERIFIER);
    let mut request = degree_request();
    request.vc_policies = Some(vec![allowed_issuer]);
    request.error_redirect_uri = Some("https://verifier.example/error/$id".to_string());
    let created = create(&provider, request).await.expect("should create request");

    let vp = wallet.present(&[credential], &created.request).await.expect("should present");
    let response = wallet.respond(vp, &created.request).expect("should respond");
    let response = respond(&provider, response).await.expect("should redirect");
    let redirect = format!("https://verifier.example/error/{}", created.session_id);
    assert_eq!(response.location.as_deref(), Some(redirect.as_str()));
}

// Should fail the presentation definition check when a requested type is
// not presented.
#[tokio::test]
async fn missing_type() {
    let provider = Verifier::new(VERIFIER);
    let issuer = Issuer::new(ISSUER);
    let wallet = Wallet::new();

    let request = CreateRequestRequest {
        request_credentials: vec!["UniversityDegree".into(), "EmployeeID".into()],
        ..CreateRequestRequest::default()
    };
    let created = create(&provider, request).await.expect("should create request");

    let credential = degree(&issuer, &wallet).await;
    let vp = wallet.present(&[credential], &created.request).await.expect("should present");
    let response = wallet.respond(vp, &created.request).expect("should respond");
    let err = respond(&provider, response).await.expect_err("should fail");
    assert_eq!(
        err,
        Error::PolicyEvaluationFailure(
            "presentation-definition: no presented credential of type EmployeeID".to_string()
        )
    );
}

// Should post the verified session to the status callback.
#[tokio::test]
async fn status_callback() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/callback"))
        .and(header("authorization", "Bearer secret"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let provider = Verifier::new(VERIFIER);
    let issuer = Issuer::new(ISSUER);
    let wallet = Wallet::new();

    let mut request = degree_request();
    request.status_callback = Some(StatusCallback {
        uri: format!("{}/callback", server.uri()),
        api_key: Some("secret".to_string()),
    });
    let created = create(&provider, request).await.expect("should create request");

    let credential = degree(&issuer, &wallet).await;
    let vp = wallet.present(&[credential], &created.request).await.expect("should present");
    let response = wallet.respond(vp, &created.request).expect("should respond");
    respond(&provider, response).await.expect("should verify");

    let mut received = vec![];
    for _ in 0..50 {
        received = server.received_requests().await.unwrap_or_default();
        if !received.is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    let [callback] = received.as_slice() else {
        panic!("expected one callback, got {}", received.len());
    };
    let body: Value = serde_json::from_slice(&callback.body).expect("should be JSON");
    assert_eq!(body["id"], created.session_id);
    assert_eq!(body["verification"]["success"], true);
}

// Should send the definition by reference when a definition URI is set, and
// serve it from the session.
#[tokio::test]
async fn definition_by_reference() {
    let server = MockServer::start().await;
    let provider = Verifier::new(VERIFIER).configure(|config| {
        config.definition_uri = Some(format!("{}/pd", server.uri()));
    });

    let created = create(&provider, degree_request()).await.expect("should create request");
    assert!(created.request.presentation_definition.is_none());
    let uri = created.request.presentation_definition_uri.clone().expect("should have uri");
    assert_eq!(uri, format!("{}/pd/{}", server.uri(), created.session_id));

    let request = PresentationDefinitionRequest {
        session_id: created.session_id.clone(),
    };
    let served = vcflow_oid4vp::handle(VERIFIER, request, &provider).await.expect("should serve");
    let served = served.body.0;

    Mock::given(method("GET"))
        .and(path(format!("/pd/{}", created.session_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(&served))
        .mount(&server)
        .await;

    let resolved = resolve_presentation_definition(&created.request, &reqwest::Client::new())
        .await
        .expect("should resolve");
    assert_eq!(resolved, served);
}

// Should pass the request by reference to a signed request object that the
// wallet verifies against the verifier's key before presenting.
#[tokio::test]
async fn request_by_reference() {
    let provider = Verifier::new(VERIFIER)
        .configure(|config| config.request_object_uri = Some(format!("{VERIFIER}/request")));
    let issuer = Issuer::new(ISSUER);
    let wallet = Wallet::new();

    let created = create(&provider, degree_request()).await.expect("should create request");
    let reference = RequestReference::from_uri(&created.request_uri).expect("should parse");
    assert_eq!(reference.client_id, VERIFIER);
    assert_eq!(reference.request_uri, format!("{VERIFIER}/request/{}", created.session_id));

    let request = RequestObjectRequest {
        session_id: created.session_id.clone(),
    };
    let jwt = vcflow_oid4vp::handle(VERIFIER, request.clone(), &provider)
        .await
        .expect("should sign request object")
        .body
        .0;
    let decoded = jws::decode_unverified::<RequestObject>(&jwt).expect("should decode");
    assert_eq!(decoded.header.typ.as_deref(), Some("oauth-authz-req+jwt"));
    assert!(decoded.header.kid.as_deref().is_some_and(|kid| kid.starts_with(&provider.did())));
    assert_eq!(decoded.claims.iss, VERIFIER);

    let authorization_request =
        verify_request_object(&jwt, &provider).await.expect("should verify request object");
    assert_eq!(authorization_request, created.request);

    let forger = LocalKey::generate(Curve::Ed25519).expect("should generate");
    let forged =
        jws::encode(decoded.header, &decoded.claims, &forger).await.expect("should sign");
    assert!(verify_request_object(&forged, &provider).await.is_err());

    let credential = degree(&issuer, &wallet).await;
    let vp = wallet.present(&[credential], &authorization_request).await.expect("should present");
    let response = wallet.respond(vp, &authorization_request).expect("should respond");
    respond(&provider, response).await.expect("should verify");

    let err = vcflow_oid4vp::handle(VERIFIER, request, &provider)
        .await
        .expect_err("should not serve an answered session");
    assert!(matches!(err, Error::InvalidRequest(_)));
}
