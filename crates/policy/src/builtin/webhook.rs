//! Webhook policy.

use std::time::Duration;

use anyhow::{Context as _, bail};
use async_trait::async_trait;
use serde_json::{Value, json};

use crate::{Error, Policy, PolicyContext, Verifiable};

const NAME: &str = "webhook";

/// `webhook`: posts the credential to the URL given as the policy argument
/// and passes when the service answers with a success status. The response
/// body, when JSON, is returned as the result.
#[derive(Clone, Debug)]
pub struct WebhookPolicy {
    client: reqwest::Client,
}

impl WebhookPolicy {
    /// Create a policy whose calls time out after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(timeout: Duration) -> Result<Self, Error> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("building webhook client")?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Policy for WebhookPolicy {
    fn name(&self) -> &str {
        NAME
    }

    fn description(&self) -> &str {
        "Asks an external service to accept the credential"
    }

    async fn verify(
        &self, data: &Verifiable, args: Option<&Value>, _: &PolicyContext<'_>,
    ) -> anyhow::Result<Value> {
        let Some(url) = args.and_then(Value::as_str) else {
            return Err(Error::arguments(NAME, "the webhook URL is required").into());
        };

        let body = json!({"credential": data.raw, "payload": data.payload});
        let response = self.client.post(url).json(&body).send().await.context("calling webhook")?;

        let status = response.status();
        let result = response.json::<Value>().await.unwrap_or(Value::Null);
        if !status.is_success() {
            bail!("webhook rejected the credential with status {status}");
        }
        Ok(result)
    }
}
