//! # Issuer Configuration
//!
//! Settings for a single credential issuer. Loading (from a file, the
//! environment, or elsewhere) is left to the embedding application, which
//! hands the settings to the library through [`crate::provider::Metadata`].

use std::collections::BTreeMap;

use anyhow::{Result, anyhow};
use chrono::TimeDelta;
use serde::{Deserialize, Serialize};
use vcflow_vdc::Format;

use crate::types::SendType;

/// Credential issuer settings.
///
/// ```json
/// {
///   "credential_issuer": "https://issuer.example",
///   "credential_types": {
///     "OpenBadgeCredential": ["VerifiableCredential", "OpenBadgeCredential"]
///   }
/// }
/// ```
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct IssuerConfig {
    /// The issuer's identifier: the base URL of its endpoints.
    pub credential_issuer: String,

    /// Lifetime of a credential offer (and its pre-authorized code), in
    /// seconds.
    #[serde(default = "default_offer_ttl")]
    pub offer_ttl_secs: i64,

    /// Lifetime of an access token and its `c_nonce`, in seconds.
    #[serde(default = "default_access_token_ttl")]
    pub access_token_ttl_secs: i64,

    /// How long a deferred credential request waits to be claimed, in
    /// seconds.
    #[serde(default = "default_deferred_ttl")]
    pub deferred_ttl_secs: i64,

    /// Defer every credential request, returning a `transaction_id` to be
    /// redeemed at the deferred credential endpoint.
    #[serde(default)]
    pub defer_issuance: bool,

    /// Issue a sample credential from a throwaway key when a proof carries
    /// no holder `kid` or no `nonce`. For interoperability testing only.
    #[serde(default)]
    pub demo_fallback: bool,

    /// Whether offers are delivered by value or by reference unless the
    /// request says otherwise.
    #[serde(default)]
    pub offer_delivery: SendType,

    /// Prefix for offer URIs, replacing the `openid-credential-offer://`
    /// scheme. Typically an HTTPS link to a web wallet for cross-device
    /// flows.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cross_device_base: Option<String>,

    /// Supported credential types: configuration name to the credential's
    /// `type` array. Each type is offered in every issuable format as
    /// `<name>_<format>`. When empty, any configuration id is accepted.
    #[serde(default)]
    pub credential_types: BTreeMap<String, Vec<String>>,
}

const fn default_offer_ttl() -> i64 {
    300
}

const fn default_access_token_ttl() -> i64 {
    300
}

const fn default_deferred_ttl() -> i64 {
    86_400
}

fn ttl(setting: &str, secs: i64) -> Result<TimeDelta> {
    TimeDelta::try_seconds(secs)
        .ok_or_else(|| anyhow!("invalid configuration: `{setting}` = {secs} is out of range"))
}

/// Formats the issuer can sign.
pub(crate) const ISSUABLE_FORMATS: [Format; 4] =
    [Format::JwtVcJson, Format::JwtVc, Format::JwtVcJsonLd, Format::SdJwtVc];

impl IssuerConfig {
    /// Default settings for `credential_issuer`.
    #[must_use]
    pub fn new(credential_issuer: impl Into<String>) -> Self {
        Self {
            credential_issuer: credential_issuer.into(),
            offer_ttl_secs: default_offer_ttl(),
            access_token_ttl_secs: default_access_token_ttl(),
            deferred_ttl_secs: default_deferred_ttl(),
            defer_issuance: false,
            demo_fallback: false,
            offer_delivery: SendType::default(),
            cross_device_base: None,
            credential_types: BTreeMap::new(),
        }
    }

    /// Offer lifetime.
    ///
    /// # Errors
    ///
    /// Returns an error when `offer_ttl_secs` is out of range.
    pub fn offer_ttl(&self) -> Result<TimeDelta> {
        ttl("offer_ttl_secs", self.offer_ttl_secs)
    }

    /// Access token and `c_nonce` lifetime.
    ///
    /// # Errors
    ///
    /// Returns an error when `access_token_ttl_secs` is out of range.
    pub fn access_token_ttl(&self) -> Result<TimeDelta> {
        ttl("access_token_ttl_secs", self.access_token_ttl_secs)
    }

    /// Deferred request lifetime.
    ///
    /// # Errors
    ///
    /// Returns an error when `deferred_ttl_secs` is out of range.
    pub fn deferred_ttl(&self) -> Result<TimeDelta> {
        ttl("deferred_ttl_secs", self.deferred_ttl_secs)
    }

    /// Credential configuration identifiers, `<name>_<format>`, with the
    /// format and type array of each.
    pub fn configurations(&self) -> impl Iterator<Item = (String, Format, &Vec<String>)> {
        self.credential_types.iter().flat_map(|(name, types)| {
            ISSUABLE_FORMATS.into_iter().map(move |format| (format!("{name}_{format}"), format, types))
        })
    }

    /// Whether `configuration_id` names a supported configuration.
    #[must_use]
    pub fn supports(&self, configuration_id: &str) -> bool {
        self.credential_types.is_empty()
            || self.configurations().any(|(id, _, _)| id == configuration_id)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn defaults() {
        let config: IssuerConfig =
            serde_json::from_value(json!({"credential_issuer": "https://issuer.example"})).unwrap();
        assert_eq!(config, IssuerConfig::new("https://issuer.example"));
        assert!(!config.demo_fallback);
        assert_eq!(config.offer_ttl().unwrap(), TimeDelta::minutes(5));
        assert!(config.supports("anything"));
    }

    #[test]
    fn ttl_out_of_range() {
        let mut config = IssuerConfig::new("https://issuer.example");
        config.deferred_ttl_secs = i64::MAX;
        let err = config.deferred_ttl().expect_err("should be out of range");
        assert!(err.to_string().contains("deferred_ttl_secs"));
        assert!(config.access_token_ttl().is_ok());
    }

    #[test]
    fn configuration_ids() {
        let mut config = IssuerConfig::new("https://issuer.example");
        config.credential_types.insert(
            "OpenBadgeCredential".into(),
            vec!["VerifiableCredential".into(), "OpenBadgeCredential".into()],
        );

        let ids: Vec<String> = config.configurations().map(|(id, _, _)| id).collect();
        assert_eq!(ids, vec![
            "OpenBadgeCredential_jwt_vc_json",
            "OpenBadgeCredential_jwt_vc",
            "OpenBadgeCredential_jwt_vc_json-ld",
            "OpenBadgeCredential_vc+sd-jwt",
        ]);
        assert!(config.supports("OpenBadgeCredential_vc+sd-jwt"));
        assert!(!config.supports("OpenBadgeCredential_mso_mdoc"));
    }
}
