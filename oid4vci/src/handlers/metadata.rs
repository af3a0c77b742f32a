//! # Metadata Endpoint
//!
//! Returns the Credential Issuer's metadata. Each configured credential type
//! is advertised once per issuable format.

use std::collections::BTreeMap;

use anyhow::Context as _;

use crate::config::IssuerConfig;
use crate::handlers::{Body, Error, Handler, Request, Response, Result};
use crate::provider::{Metadata, Provider};
use crate::types::{
    CredentialConfiguration, CredentialDefinition, MetadataRequest, MetadataResponse,
    ProofTypesSupported,
};

const SIGNING_ALGS: [&str; 2] = ["EdDSA", "ES256"];

/// Metadata request handler.
async fn metadata(issuer: &str, provider: &impl Provider, _: MetadataRequest) -> Result<MetadataResponse> {
    let config = Metadata::issuer(provider, issuer).await.context("getting issuer metadata")?;
    Ok(describe(&config))
}

impl<P: Provider> Handler<MetadataResponse, P> for Request<MetadataRequest> {
    type Error = Error;

    async fn handle(
        self, issuer: &str, provider: &P,
    ) -> Result<impl Into<Response<MetadataResponse>>, Self::Error> {
        metadata(issuer, provider, self.body).await
    }
}

impl Body for MetadataRequest {}

fn describe(config: &IssuerConfig) -> MetadataResponse {
    let base = config.credential_issuer.trim_end_matches('/');
    let algs: Vec<String> = SIGNING_ALGS.iter().map(ToString::to_string).collect();

    let credential_configurations_supported = config
        .configurations()
        .map(|(id, format, types)| {
            let configuration = CredentialConfiguration {
                format,
                cryptographic_binding_methods_supported: vec!["did".to_string()],
                credential_signing_alg_values_supported: algs.clone(),
                proof_types_supported: BTreeMap::from([(
                    "jwt".to_string(),
                    ProofTypesSupported {
                        proof_signing_alg_values_supported: algs.clone(),
                    },
                )]),
                credential_definition: CredentialDefinition {
                    type_: types.clone(),
                },
            };
            (id, configuration)
        })
        .collect();

    MetadataResponse {
        credential_issuer: config.credential_issuer.clone(),
        token_endpoint: format!("{base}/token"),
        credential_endpoint: format!("{base}/credential"),
        batch_credential_endpoint: format!("{base}/batch_credential"),
        deferred_credential_endpoint: format!("{base}/credential_deferred"),
        credential_configurations_supported,
    }
}
