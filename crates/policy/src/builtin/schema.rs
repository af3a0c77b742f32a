//! JSON schema policy.

use anyhow::bail;
use async_trait::async_trait;
use serde_json::Value;

use crate::{Error, Policy, PolicyContext, Verifiable};

const NAME: &str = "schema";

/// `schema`: validates the credential document (the `vc` claim, or the
/// whole payload for SD-JWT credentials) against the JSON schema given as
/// the policy argument.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonSchemaPolicy;

#[async_trait]
impl Policy for JsonSchemaPolicy {
    fn name(&self) -> &str {
        NAME
    }

    fn description(&self) -> &str {
        "Validates the credential against a JSON schema"
    }

    async fn verify(
        &self, data: &Verifiable, args: Option<&Value>, _: &PolicyContext<'_>,
    ) -> anyhow::Result<Value> {
        let Some(schema) = args else {
            return Err(Error::arguments(NAME, "a JSON schema is required").into());
        };
        let validator =
            jsonschema::validator_for(schema).map_err(|e| Error::arguments(NAME, e.to_string()))?;

        let instance = Value::Object(data.document().clone());
        let errors: Vec<String> = validator.iter_errors(&instance).map(|e| e.to_string()).collect();
        if !errors.is_empty() {
            bail!("schema validation failed: {}", errors.join("; "));
        }
        Ok(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::builtin::testing::{context, credential};

    fn schema() -> Value {
        json!({
            "type": "object",
            "required": ["type", "credentialSubject"],
            "properties": {
                "credentialSubject": {
                    "type": "object",
                    "required": ["name"],
                    "properties": {"name": {"type": "string"}}
                }
            }
        })
    }

    #[tokio::test]
    async fn valid() {
        let data =
            credential(&json!({"type": ["VerifiableCredential"], "credentialSubject": {"name": "Alice"}}), &[])
                .await;
        assert!(JsonSchemaPolicy.verify(&data, Some(&schema()), &context()).await.is_ok());
    }

    #[tokio::test]
    async fn invalid() {
        let data =
            credential(&json!({"type": ["VerifiableCredential"], "credentialSubject": {"name": 42}}), &[]).await;
        let err = JsonSchemaPolicy.verify(&data, Some(&schema()), &context()).await.unwrap_err();
        assert!(err.to_string().starts_with("schema validation failed"));
    }

    #[tokio::test]
    async fn missing_schema() {
        let data = credential(&json!({"type": ["VerifiableCredential"], "credentialSubject": {}}), &[]).await;
        let err = JsonSchemaPolicy.verify(&data, None, &context()).await.unwrap_err();
        assert!(matches!(err.downcast_ref::<Error>(), Some(Error::InvalidArguments { .. })));
    }
}
