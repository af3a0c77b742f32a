//! # W3C-VC Presentation Verification

use serde_json::{Map, Value};
use vcflow_did::Resolver;

use crate::error::Error;

/// A verified JWT presentation.
#[derive(Clone, Debug)]
pub struct VerifiedVp {
    /// The presentation JWT payload.
    pub payload: Map<String, Value>,

    /// The presented credentials, as they appear in
    /// `vp.verifiableCredential`. A single credential is returned as a
    /// one-element list.
    pub credentials: Vec<Value>,
}

/// Verify a holder-signed JWT presentation.
///
/// The holder signature is always checked. `nonce` and `aud`, when given,
/// must match the presentation's claims.
///
/// # Errors
///
/// Returns [`Error::SignatureVerification`] if the signature does not verify
/// and [`Error::InvalidCredential`] if a claim does not match.
pub async fn verify_vp(
    token: &str, resolver: &dyn Resolver, nonce: Option<&str>, aud: Option<&str>,
) -> Result<VerifiedVp, Error> {
    let payload = crate::jwt::verify(token, resolver).await?;
    tracing::debug!("w3c_vc::verify_vp");

    if let Some(nonce) = nonce
        && payload.get("nonce").and_then(Value::as_str) != Some(nonce)
    {
        return Err(Error::InvalidCredential("`nonce` does not match the request".into()));
    }
    if let Some(aud) = aud {
        let matches = match payload.get("aud") {
            Some(Value::String(value)) => value == aud,
            Some(Value::Array(values)) => values.iter().any(|v| v.as_str() == Some(aud)),
            _ => false,
        };
        if !matches {
            return Err(Error::InvalidCredential("`aud` does not match the verifier".into()));
        }
    }

    let Some(vp) = payload.get("vp") else {
        return Err(Error::InvalidCredential("presentation has no `vp` claim".into()));
    };
    let credentials = match vp.get("verifiableCredential") {
        None | Some(Value::Null) => vec![],
        Some(Value::Array(credentials)) => credentials.clone(),
        Some(single) => vec![single.clone()],
    };

    Ok(VerifiedVp {
        payload,
        credentials,
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use vcflow_jose::{Curve, LocalKey};

    use super::*;
    use crate::issue::sign_raw;
    use crate::test_support::{NoNetwork, did_key};
    use crate::w3c_vc::W3cVpBuilder;

    #[tokio::test]
    async fn present_then_verify() {
        let issuer = LocalKey::generate(Curve::Ed25519).unwrap();
        let holder = LocalKey::generate(Curve::P256).unwrap();
        let vc = json!({"type": ["VerifiableCredential", "EmailCredential"], "credentialSubject": {"email": "a@b.c"}});
        let credential = sign_raw(&vc, &issuer, None, &did_key(&holder)).await.unwrap();

        let vp = W3cVpBuilder::new()
            .credentials([credential.clone()])
            .client_id("did:web:verifier.example")
            .nonce("abc123")
            .signer(&holder)
            .build()
            .await
            .unwrap();

        let verified = verify_vp(&vp, &NoNetwork, Some("abc123"), Some("did:web:verifier.example")).await.unwrap();
        assert_eq!(verified.payload["iss"], did_key(&holder));
        assert_eq!(verified.credentials, vec![Value::from(credential)]);

        let Err(Error::InvalidCredential(_)) = verify_vp(&vp, &NoNetwork, Some("other"), None).await else {
            panic!("expected nonce mismatch");
        };
    }
}
