//! Validity period policies.

use anyhow::bail;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Value, json};
use vcflow_vdc::W3cVc;

use crate::{Policy, PolicyContext, Verifiable};

/// `expired`: fails when the `exp` claim, or the credential's
/// `validUntil`/`expirationDate`, is in the past.
#[derive(Clone, Copy, Debug, Default)]
pub struct ExpirationPolicy;

#[async_trait]
impl Policy for ExpirationPolicy {
    fn name(&self) -> &str {
        "expired"
    }

    fn description(&self) -> &str {
        "Checks the expiration date has not passed"
    }

    async fn verify(
        &self, data: &Verifiable, _: Option<&Value>, ctx: &PolicyContext<'_>,
    ) -> anyhow::Result<Value> {
        let Some((expiry, claim)) = claim_date(data, "exp")
            .map(|d| (d, "exp"))
            .or_else(|| document(data)?.valid_until().map(|d| (d, "validUntil")))
        else {
            return Ok(json!({"policy_available": false}));
        };

        if expiry < ctx.now {
            bail!("expired since {} (`{claim}`)", expiry.to_rfc3339());
        }
        Ok(json!({
            "policy_available": true,
            "date_seconds_left": (expiry - ctx.now).num_seconds(),
            "available_date": expiry.to_rfc3339(),
            "used_claim": claim,
        }))
    }
}

/// `not-before`: fails when the `nbf` claim, or the credential's
/// `validFrom`/`issuanceDate`, is in the future.
#[derive(Clone, Copy, Debug, Default)]
pub struct NotBeforePolicy;

#[async_trait]
impl Policy for NotBeforePolicy {
    fn name(&self) -> &str {
        "not-before"
    }

    fn description(&self) -> &str {
        "Checks the credential is already valid"
    }

    async fn verify(
        &self, data: &Verifiable, _: Option<&Value>, ctx: &PolicyContext<'_>,
    ) -> anyhow::Result<Value> {
        let Some((not_before, claim)) = claim_date(data, "nbf")
            .map(|d| (d, "nbf"))
            .or_else(|| document(data)?.valid_from().map(|d| (d, "validFrom")))
        else {
            return Ok(json!({"policy_available": false}));
        };

        if not_before > ctx.now {
            bail!("not valid before {} (`{claim}`)", not_before.to_rfc3339());
        }
        Ok(json!({
            "policy_available": true,
            "date_seconds_left": (ctx.now - not_before).num_seconds(),
            "available_date": not_before.to_rfc3339(),
            "used_claim": claim,
        }))
    }
}

fn claim_date(data: &Verifiable, claim: &str) -> Option<DateTime<Utc>> {
    let seconds = data.payload.get(claim)?.as_i64()?;
    DateTime::from_timestamp(seconds, 0)
}

fn document(data: &Verifiable) -> Option<W3cVc> {
    W3cVc::from_value(Value::Object(data.document().clone())).ok()
}

#[cfg(test)]
mod tests {
    use chrono::TimeDelta;

    use super::*;
    use crate::builtin::testing::{context, credential};

    fn vc() -> Value {
        json!({"type": ["VerifiableCredential"], "credentialSubject": {"id": "did:key:z6MkHolder"}})
    }

    #[tokio::test]
    async fn expired_one_second_ago() {
        let exp = (Utc::now() - TimeDelta::seconds(1)).timestamp();
        let data = credential(&vc(), &[("exp", json!(exp))]).await;
        let err = ExpirationPolicy.verify(&data, None, &context()).await.unwrap_err();
        assert!(err.to_string().starts_with("expired since"));
    }

    #[tokio::test]
    async fn not_yet_expired() {
        let mut vc = vc();
        vc["expirationDate"] = json!("2999-01-01T00:00:00Z");
        let data = credential(&vc, &[]).await;
        let result = ExpirationPolicy.verify(&data, None, &context()).await.unwrap();
        assert_eq!(result["used_claim"], "exp");
        assert_eq!(result["policy_available"], true);
    }

    #[tokio::test]
    async fn no_dates() {
        let mut data = credential(&vc(), &[]).await;
        data.payload.remove("nbf");
        data.payload.remove("exp");
        let result = ExpirationPolicy.verify(&data, None, &context()).await.unwrap();
        assert_eq!(result["policy_available"], false);
    }

    #[tokio::test]
    async fn not_before() {
        let nbf = (Utc::now() + TimeDelta::hours(1)).timestamp();
        let data = credential(&vc(), &[("nbf", json!(nbf))]).await;
        assert!(NotBeforePolicy.verify(&data, None, &context()).await.is_err());

        let mut vc = vc();
        vc["issuanceDate"] = json!("2020-01-01T00:00:00Z");
        let data = credential(&vc, &[]).await;
        assert!(NotBeforePolicy.verify(&data, None, &context()).await.is_ok());
    }
}
