//! Presentation size policies.

use anyhow::bail;
use async_trait::async_trait;
use serde_json::{Value, json};

use crate::{Error, Policy, PolicyContext, Verifiable};

/// `minimum-credentials`: the presentation carries at least the number of
/// credentials given as the argument.
#[derive(Clone, Copy, Debug, Default)]
pub struct MinimumCredentialsPolicy;

#[async_trait]
impl Policy for MinimumCredentialsPolicy {
    fn name(&self) -> &str {
        "minimum-credentials"
    }

    fn description(&self) -> &str {
        "Checks the presentation carries at least a number of credentials"
    }

    async fn verify(
        &self, data: &Verifiable, args: Option<&Value>, _: &PolicyContext<'_>,
    ) -> anyhow::Result<Value> {
        let minimum = count(self.name(), args)?;
        if data.credentials < minimum {
            bail!("presentation carries {} credentials, at least {minimum} required", data.credentials);
        }
        Ok(json!({"total": data.credentials, "remaining": data.credentials - minimum}))
    }
}

/// `maximum-credentials`: the presentation carries at most the number of
/// credentials given as the argument.
#[derive(Clone, Copy, Debug, Default)]
pub struct MaximumCredentialsPolicy;

#[async_trait]
impl Policy for MaximumCredentialsPolicy {
    fn name(&self) -> &str {
        "maximum-credentials"
    }

    fn description(&self) -> &str {
        "Checks the presentation carries at most a number of credentials"
    }

    async fn verify(
        &self, data: &Verifiable, args: Option<&Value>, _: &PolicyContext<'_>,
    ) -> anyhow::Result<Value> {
        let maximum = count(self.name(), args)?;
        if data.credentials > maximum {
            bail!("presentation carries {} credentials, at most {maximum} allowed", data.credentials);
        }
        Ok(json!({"total": data.credentials, "remaining": maximum - data.credentials}))
    }
}

fn count(policy: &str, args: Option<&Value>) -> anyhow::Result<usize> {
    args.and_then(Value::as_u64)
        .and_then(|n| usize::try_from(n).ok())
        .ok_or_else(|| Error::arguments(policy, "a credential count is required").into())
}

#[cfg(test)]
mod tests {
    use serde_json::Map;
    use vcflow_vdc::VpFormat;

    use super::*;
    use crate::Target;
    use crate::builtin::testing::context;

    fn presentation(credentials: usize) -> Verifiable {
        Verifiable {
            raw: String::new(),
            target: Target::Presentation(VpFormat::JwtVpJson),
            payload: Map::new(),
            credentials,
        }
    }

    #[tokio::test]
    async fn bounds() {
        let ctx = context();
        let two = json!(2);
        assert!(MinimumCredentialsPolicy.verify(&presentation(2), Some(&two), &ctx).await.is_ok());
        assert!(MinimumCredentialsPolicy.verify(&presentation(1), Some(&two), &ctx).await.is_err());
        assert!(MaximumCredentialsPolicy.verify(&presentation(2), Some(&two), &ctx).await.is_ok());
        assert!(MaximumCredentialsPolicy.verify(&presentation(3), Some(&two), &ctx).await.is_err());
        assert!(MaximumCredentialsPolicy.verify(&presentation(0), None, &ctx).await.is_err());
    }
}
