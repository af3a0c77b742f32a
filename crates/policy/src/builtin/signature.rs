//! Signature policies.

use async_trait::async_trait;
use serde_json::Value;
use vcflow_vdc::VpFormat;
use vcflow_vdc::sd_jwt::{self, KbExpectations};
use vcflow_vdc::{jwt, w3c_vc};

use crate::{Policy, PolicyContext, Target, Verifiable};

/// `signature`: checks a JWT credential or presentation signature against
/// the key resolved from the signer's DID. Presentations must also carry the
/// expected nonce and audience.
#[derive(Clone, Copy, Debug, Default)]
pub struct JwtSignaturePolicy;

#[async_trait]
impl Policy for JwtSignaturePolicy {
    fn name(&self) -> &str {
        "signature"
    }

    fn description(&self) -> &str {
        "Checks a JWT credential or presentation signature"
    }

    async fn verify(
        &self, data: &Verifiable, _: Option<&Value>, ctx: &PolicyContext<'_>,
    ) -> anyhow::Result<Value> {
        let payload = match data.target {
            Target::Presentation(VpFormat::SdJwtVc) | Target::Credential(_) => {
                jwt::verify(&data.raw, ctx.resolver).await?
            }
            Target::Presentation(_) => {
                w3c_vc::verify_vp(&data.raw, ctx.resolver, ctx.nonce, ctx.audience).await?.payload
            }
        };
        Ok(Value::Object(payload))
    }
}

/// `sd-jwt-vc-signature`: checks an SD-JWT issuer signature and disclosure
/// digests. Presentations must carry a Key Binding JWT signed by the holder
/// with the expected nonce and audience.
#[derive(Clone, Copy, Debug, Default)]
pub struct SdJwtVcSignaturePolicy;

#[async_trait]
impl Policy for SdJwtVcSignaturePolicy {
    fn name(&self) -> &str {
        "sd-jwt-vc-signature"
    }

    fn description(&self) -> &str {
        "Checks an SD-JWT signature, its disclosures and the holder key binding"
    }

    async fn verify(
        &self, data: &Verifiable, _: Option<&Value>, ctx: &PolicyContext<'_>,
    ) -> anyhow::Result<Value> {
        let expect = match (data.is_presentation(), ctx.nonce, ctx.audience) {
            (true, Some(nonce), Some(aud)) => Some(KbExpectations { nonce, aud }),
            _ => None,
        };
        let disclosed = sd_jwt::verify(&data.raw, ctx.resolver, expect).await?;
        Ok(Value::Object(disclosed.payload))
    }
}
