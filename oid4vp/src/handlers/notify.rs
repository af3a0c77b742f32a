//! # Status Callback
//!
//! Reports a completed verification to the verifying application. Delivery
//! runs in the background: a slow or failing callback never delays the
//! wallet's response.

use std::time::Duration;

use anyhow::{Context as _, Result};
use serde_json::Value;

use crate::types::{PresentationSession, StatusCallback};

/// Post `session` to `callback` on a background task. Failures are logged
/// and otherwise ignored.
pub fn spawn(callback: StatusCallback, session: &PresentationSession, timeout: Duration) {
    let payload = match serde_json::to_value(session) {
        Ok(payload) => payload,
        Err(e) => {
            tracing::warn!(uri = callback.uri, "cannot serialize session for status callback: {e}");
            return;
        }
    };

    tokio::spawn(async move {
        match deliver(&callback, &payload, timeout).await {
            Ok(()) => tracing::debug!(uri = callback.uri, "notify::delivered"),
            Err(e) => tracing::warn!(uri = callback.uri, "status callback failed: {e:#}"),
        }
    });
}

/// Post `payload` to `callback`, as a bearer-authenticated request when the
/// callback carries an API key.
///
/// # Errors
///
/// Returns an error if the request fails or the endpoint responds with an
/// error status.
pub async fn deliver(callback: &StatusCallback, payload: &Value, timeout: Duration) -> Result<()> {
    let client = reqwest::Client::builder().timeout(timeout).build().context("building client")?;
    let mut request = client.post(&callback.uri).json(payload);
    if let Some(api_key) = &callback.api_key {
        request = request.bearer_auth(api_key);
    }
    request.send().await.context("sending status callback")?.error_for_status()?;
    Ok(())
}
