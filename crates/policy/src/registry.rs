//! # Policy Registry

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::builtin::{
    AllowedIssuerPolicy, ExpirationPolicy, JsonSchemaPolicy, JwtSignaturePolicy, MaximumCredentialsPolicy,
    MinimumCredentialsPolicy, NotBeforePolicy, SdJwtVcSignaturePolicy, WebhookPolicy,
};
use crate::{Error, Policy, PolicyRequest};

/// Timeout for webhook calls made by the built-in `webhook` policy.
pub const WEBHOOK_TIMEOUT: Duration = Duration::from_secs(10);

/// Policies by unique name.
#[derive(Clone, Default)]
pub struct PolicyRegistry {
    policies: HashMap<String, Arc<dyn Policy>>,
}

impl PolicyRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the built-in policies.
    ///
    /// # Errors
    ///
    /// Returns an error if the webhook HTTP client cannot be built.
    pub fn with_builtins() -> Result<Self, Error> {
        let mut registry = Self::new();
        registry.register(JwtSignaturePolicy)?;
        registry.register(SdJwtVcSignaturePolicy)?;
        registry.register(JsonSchemaPolicy)?;
        registry.register(ExpirationPolicy)?;
        registry.register(NotBeforePolicy)?;
        registry.register(WebhookPolicy::new(WEBHOOK_TIMEOUT)?)?;
        registry.register(MinimumCredentialsPolicy)?;
        registry.register(MaximumCredentialsPolicy)?;
        registry.register(AllowedIssuerPolicy)?;
        Ok(registry)
    }

    /// Register a policy under its name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicatePolicyName`] if the name is taken. The policy
    /// already registered stays in place.
    pub fn register(&mut self, policy: impl Policy + 'static) -> Result<(), Error> {
        let name = policy.name().to_string();
        if self.policies.contains_key(&name) {
            return Err(Error::DuplicatePolicyName(name));
        }
        tracing::debug!(policy = name, "policy::register");
        self.policies.insert(name, Arc::new(policy));
        Ok(())
    }

    /// The policy registered as `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<dyn Policy>> {
        self.policies.get(name).cloned()
    }

    /// Registered policy names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.policies.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Check every request names a registered policy.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownPolicy`] for the first unregistered name.
    pub fn check(&self, requests: &[PolicyRequest]) -> Result<(), Error> {
        match requests.iter().find(|r| !self.policies.contains_key(r.name())) {
            Some(request) => Err(Error::UnknownPolicy(request.name().to_string())),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for PolicyRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PolicyRegistry").field("policies", &self.names()).finish()
    }
}
