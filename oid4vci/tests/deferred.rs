//! Deferred Issuance Tests

mod common;

use common::{ISSUER, credential, offered, verified_vc};
use test_utils::{Issuer, Wallet};
use vcflow_oid4vci::vdc::Format;
use vcflow_oid4vci::{DeferredCredentialRequest, Error, sweep_deferred};

// Should return a transaction id in place of the credential, then issue the
// credential once against that id.
#[tokio::test]
async fn deferred() {
    let provider = Issuer::new(ISSUER).configure(|config| config.defer_issuance = true);
    let wallet = Wallet::new();
    let token = offered(&provider, Format::JwtVcJson).await;

    let response =
        credential(&provider, &wallet, &token, Format::JwtVcJson).await.expect("should defer");
    assert!(response.credential().is_none());
    let transaction_id = response.transaction_id().expect("should have transaction id").to_string();

    let request = DeferredCredentialRequest {
        transaction_id: transaction_id.clone(),
    };
    let response =
        vcflow_oid4vci::handle(ISSUER, request.clone(), &provider).await.expect("should issue");
    let vc = verified_vc(&provider, response.credential().expect("should be issued")).await;
    assert_eq!(vc["credentialSubject"]["id"], wallet.did());

    let err = vcflow_oid4vci::handle(ISSUER, request, &provider)
        .await
        .expect_err("should be redeemed once");
    assert!(matches!(err, Error::InvalidTransactionId(_)));
}

// Should serve exactly one of several concurrent claims on a transaction id.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_claims() {
    let provider = Issuer::new(ISSUER).configure(|config| config.defer_issuance = true);
    let wallet = Wallet::new();

    for _ in 0..20 {
        let token = offered(&provider, Format::JwtVcJson).await;
        let response =
            credential(&provider, &wallet, &token, Format::JwtVcJson).await.expect("should defer");
        let transaction_id = response.transaction_id().expect("should have transaction id");

        let claims: Vec<_> = (0..2)
            .map(|_| {
                let provider = provider.clone();
                let request = DeferredCredentialRequest {
                    transaction_id: transaction_id.to_string(),
                };
                tokio::spawn(async move { vcflow_oid4vci::handle(ISSUER, request, &provider).await })
            })
            .collect();

        let mut issued = 0;
        for claim in claims {
            match claim.await.expect("should join") {
                Ok(_) => issued += 1,
                Err(e) => assert!(matches!(e, Error::InvalidTransactionId(_)), "{e:?}"),
            }
        }
        assert_eq!(issued, 1);
    }
}

// Should not recognise a transaction id it never issued.
#[tokio::test]
async fn unknown_transaction() {
    let provider = Issuer::new(ISSUER);

    let request = DeferredCredentialRequest {
        transaction_id: "not-a-transaction".to_string(),
    };
    let err = vcflow_oid4vci::handle(ISSUER, request, &provider).await.expect_err("should fail");
    assert!(matches!(err, Error::InvalidTransactionId(_)));
}

// Should evict deferred requests once they expire.
#[tokio::test]
async fn sweep() {
    let provider = Issuer::new(ISSUER).configure(|config| {
        config.defer_issuance = true;
        config.deferred_ttl_secs = 0;
    });
    let wallet = Wallet::new();
    let token = offered(&provider, Format::JwtVcJson).await;

    let response =
        credential(&provider, &wallet, &token, Format::JwtVcJson).await.expect("should defer");
    let transaction_id = response.transaction_id().expect("should have transaction id").to_string();

    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    let removed = sweep_deferred(&provider).await.expect("should sweep");
    assert_eq!(removed, 1);

    let request = DeferredCredentialRequest { transaction_id };
    let err = vcflow_oid4vci::handle(ISSUER, request, &provider).await.expect_err("should be gone");
    assert!(matches!(err, Error::InvalidTransactionId(_)));
}
