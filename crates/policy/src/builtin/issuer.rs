//! Issuer allow-list policy.

use anyhow::bail;
use async_trait::async_trait;
use serde_json::Value;
use vcflow_vdc::W3cVc;

use crate::{Error, Policy, PolicyContext, Verifiable};

const NAME: &str = "allowed-issuer";

/// `allowed-issuer`: the credential issuer is one of the DIDs given as the
/// argument (a single DID or a list).
#[derive(Clone, Copy, Debug, Default)]
pub struct AllowedIssuerPolicy;

#[async_trait]
impl Policy for AllowedIssuerPolicy {
    fn name(&self) -> &str {
        NAME
    }

    fn description(&self) -> &str {
        "Checks the credential was issued by an allowed issuer"
    }

    async fn verify(
        &self, data: &Verifiable, args: Option<&Value>, _: &PolicyContext<'_>,
    ) -> anyhow::Result<Value> {
        let allowed: Vec<&str> = match args {
            Some(Value::String(issuer)) => vec![issuer.as_str()],
            Some(Value::Array(issuers)) => issuers.iter().filter_map(Value::as_str).collect(),
            _ => return Err(Error::arguments(NAME, "an issuer DID or list of DIDs is required").into()),
        };

        let document = W3cVc::from_value(Value::Object(data.document().clone()))?;
        let issuer = data.payload.get("iss").and_then(Value::as_str).or_else(|| document.issuer());
        let Some(issuer) = issuer else {
            bail!("credential names no issuer");
        };
        if !allowed.contains(&issuer) {
            bail!("issuer {issuer} is not allowed");
        }
        Ok(Value::String(issuer.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::builtin::testing::{context, credential};

    #[tokio::test]
    async fn allow_list() {
        let data = credential(&json!({"type": ["VerifiableCredential"], "credentialSubject": {}}), &[]).await;
        let issuer = data.payload["iss"].clone();

        let allowed = json!(["did:web:other.example", issuer]);
        assert_eq!(AllowedIssuerPolicy.verify(&data, Some(&allowed), &context()).await.unwrap(), issuer);

        let denied = json!("did:web:other.example");
        assert!(AllowedIssuerPolicy.verify(&data, Some(&denied), &context()).await.is_err());
    }
}
