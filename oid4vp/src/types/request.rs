//! # Authorization Request
//!
//! Types for creating a presentation session and the OpenID4VP
//! Authorization Request sent to the wallet.

use std::fmt;
use std::io::Cursor;

use anyhow::Result;
use base64ct::{Base64, Encoding};
use qrcode::QrCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use vcflow_core::urlencode;
use vcflow_jose::Jwks;
use vcflow_policy::PolicyRequest;
use vcflow_vdc::Format;

use super::presentation_definition::PresentationDefinition;

/// A request to create a presentation session.
///
/// ```json
/// {
///   "request_credentials": [
///     "OpenBadgeCredential",
///     {"type": "UniversityDegree", "format": "jwt_vc_json", "policies": ["schema"]}
///   ],
///   "vp_policies": ["signature", {"policy": "minimum-credentials", "args": 2}],
///   "success_redirect_uri": "https://verifier.example/success/$id"
/// }
/// ```
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct CreateRequestRequest {
    /// The credentials to request.
    pub request_credentials: Vec<RequestedCredential>,

    /// How the wallet returns its response.
    #[serde(default)]
    pub response_mode: ResponseMode,

    /// Policies run against the presentation. Defaults by format when
    /// absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vp_policies: Option<Vec<PolicyRequest>>,

    /// Policies run against each presented credential. Defaults by format
    /// when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vc_policies: Option<Vec<PolicyRequest>>,

    /// Session identifier to use instead of a generated one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,

    /// Where to send the wallet after a successful verification. `$id` is
    /// replaced by the session id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success_redirect_uri: Option<String>,

    /// Where to send the wallet after a failed verification. `$id` is
    /// replaced by the session id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_redirect_uri: Option<String>,

    /// Endpoint notified once the verification completes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_callback: Option<StatusCallback>,
}

/// A requested credential: a bare type, or a type with its format and
/// overriding policies.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum RequestedCredential {
    /// A credential type in the default format.
    Type(String),

    /// A credential type with options.
    Detailed {
        /// Credential type.
        #[serde(rename = "type")]
        type_: String,

        /// Credential format. Defaults to `jwt_vc_json`.
        #[serde(default)]
        format: Format,

        /// Policies replacing the VC policies for credentials of this
        /// type.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        policies: Option<Vec<PolicyRequest>>,
    },
}

impl RequestedCredential {
    /// The credential type.
    #[must_use]
    pub fn credential_type(&self) -> &str {
        match self {
            Self::Type(type_) | Self::Detailed { type_, .. } => type_,
        }
    }

    /// The requested format.
    #[must_use]
    pub const fn format(&self) -> Format {
        match self {
            Self::Type(_) => Format::JwtVcJson,
            Self::Detailed { format, .. } => *format,
        }
    }

    /// Policies overriding the VC policies for this type.
    #[must_use]
    pub fn policies(&self) -> Option<&[PolicyRequest]> {
        match self {
            Self::Type(_) => None,
            Self::Detailed { policies, .. } => policies.as_deref(),
        }
    }
}

impl From<&str> for RequestedCredential {
    fn from(type_: &str) -> Self {
        Self::Type(type_.to_string())
    }
}

/// How the wallet returns its Authorization Response.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub enum ResponseMode {
    /// Form-encoded POST of `vp_token`, `presentation_submission` and
    /// `state`.
    #[default]
    #[serde(rename = "direct_post")]
    DirectPost,

    /// Form-encoded POST of a single `response` parameter: the response
    /// parameters encrypted as a JWE to the session's key.
    #[serde(rename = "direct_post.jwt")]
    DirectPostJwt,
}

/// Where, and how, to report a completed verification.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct StatusCallback {
    /// Endpoint receiving the session as JSON.
    pub uri: String,

    /// Sent as a bearer token when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

/// A created presentation session.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct CreateRequestResponse {
    /// The session id, also the request `state`.
    pub session_id: String,

    /// The Authorization Request as a URI, e.g.
    /// `openid4vp://authorize?response_type=vp_token&...`.
    pub request_uri: String,

    /// The Authorization Request.
    pub request: AuthorizationRequest,
}

/// An OpenID4VP Authorization Request.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct AuthorizationRequest {
    /// Always `vp_token`.
    pub response_type: String,

    /// The verifier's client identifier.
    pub client_id: String,

    /// How the wallet returns its response.
    pub response_mode: ResponseMode,

    /// Where the wallet posts its response.
    pub response_uri: String,

    /// Must be echoed in the presentation.
    pub nonce: String,

    /// The session id.
    pub state: String,

    /// The presentation definition, when sent by value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub presentation_definition: Option<PresentationDefinition>,

    /// Where to fetch the presentation definition, when sent by reference.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub presentation_definition_uri: Option<String>,

    /// Verifier metadata, including the response encryption key for
    /// `direct_post.jwt`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_metadata: Option<ClientMetadata>,
}

impl AuthorizationRequest {
    /// Serialize as a URL query string. Nested objects are JSON-encoded.
    ///
    /// # Errors
    ///
    /// Returns an error if the request cannot be serialized.
    pub fn to_querystring(&self) -> Result<String> {
        urlencode::encode(self)
    }

    /// Parse from a URL query string, with or without the URI prefix.
    ///
    /// # Errors
    ///
    /// Returns an error if the query string is not a valid request.
    pub fn from_uri(uri: &str) -> Result<Self> {
        let query = uri.split_once('?').map_or(uri, |(_, query)| query);
        urlencode::decode(query)
    }

    /// Render `uri` as a QR code: a PNG data URI.
    ///
    /// # Errors
    ///
    /// Returns an error if the URI is too long to encode.
    pub fn to_qrcode(uri: &str) -> Result<String> {
        let qr_code = QrCode::new(uri)
            .map_err(|e| anyhow::anyhow!("failed to create QR code: {e}"))?;

        let img_buf = qr_code.render::<image::Luma<u8>>().build();
        let mut buffer: Vec<u8> = Vec::new();
        let mut writer = Cursor::new(&mut buffer);
        img_buf
            .write_to(&mut writer, image::ImageFormat::Png)
            .map_err(|e| anyhow::anyhow!("failed to create QR code: {e}"))?;

        Ok(format!("data:image/png;base64,{}", Base64::encode_string(buffer.as_slice())))
    }
}

impl fmt::Display for AuthorizationRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        write!(f, "{s}")
    }
}

/// Verifier metadata carried in the Authorization Request.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct ClientMetadata {
    /// The verifier's public keys. Holds the response encryption key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jwks: Option<Jwks>,

    /// JWE `alg` for encrypted responses.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorization_encrypted_response_alg: Option<String>,

    /// JWE `enc` for encrypted responses.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorization_encrypted_response_enc: Option<String>,

    /// Presentation formats the verifier accepts.
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub vp_formats: serde_json::Map<String, Value>,
}

/// JWS `typ` of a signed request object.
pub const REQUEST_OBJECT_TYP: &str = "oauth-authz-req+jwt";

/// `aud` of a request object addressed to any wallet.
pub const SELF_ISSUED_AUDIENCE: &str = "https://self-issued.me/v2";

/// An Authorization Request passed by reference: the wallet fetches the
/// signed request object from `request_uri`.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct RequestReference {
    /// The verifier's client identifier. Must match the request object's.
    pub client_id: String,

    /// Where the signed request object is served.
    pub request_uri: String,
}

impl RequestReference {
    /// Serialize as a URL query string.
    ///
    /// # Errors
    ///
    /// Returns an error if the reference cannot be serialized.
    pub fn to_querystring(&self) -> Result<String> {
        urlencode::encode(self)
    }

    /// Parse from a URL query string, with or without the URI prefix.
    ///
    /// # Errors
    ///
    /// Returns an error if the query string is not a request reference.
    pub fn from_uri(uri: &str) -> Result<Self> {
        let query = uri.split_once('?').map_or(uri, |(_, query)| query);
        urlencode::decode(query)
    }
}

/// The claims of a signed request object.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct RequestObject {
    /// The verifier: its client identifier.
    pub iss: String,

    /// Always [`SELF_ISSUED_AUDIENCE`].
    pub aud: String,

    /// The Authorization Request.
    #[serde(flatten)]
    pub request: AuthorizationRequest,
}

/// Fetch a session's signed request object.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct RequestObjectRequest {
    /// Session id.
    pub session_id: String,
}

/// A signed request object: a compact JWS with `typ`
/// [`REQUEST_OBJECT_TYP`].
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct RequestObjectResponse(pub String);

/// Fetch a session's presentation definition (sent by reference).
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct PresentationDefinitionRequest {
    /// Session id.
    pub session_id: String,
}

/// A session's presentation definition.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct PresentationDefinitionResponse(pub PresentationDefinition);

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn requested_credentials() {
        let request: CreateRequestRequest = serde_json::from_value(json!({
            "request_credentials": [
                "OpenBadgeCredential",
                {"type": "UniversityDegree", "format": "vc+sd-jwt", "policies": ["expired"]}
            ]
        }))
        .unwrap();

        let [badge, degree] = request.request_credentials.as_slice() else {
            panic!("expected two credentials");
        };
        assert_eq!(badge.format(), Format::JwtVcJson);
        assert_eq!(badge.policies(), None);
        assert_eq!(degree.credential_type(), "UniversityDegree");
        assert_eq!(degree.format(), Format::SdJwtVc);
        assert_eq!(degree.policies(), Some([PolicyRequest::from("expired")].as_slice()));
        assert_eq!(request.response_mode, ResponseMode::DirectPost);
    }

    #[test]
    fn querystring() {
        let request = AuthorizationRequest {
            response_type: "vp_token".into(),
            client_id: "https://verifier.example".into(),
            response_mode: ResponseMode::DirectPostJwt,
            response_uri: "https://verifier.example/verify/s1".into(),
            nonce: "n-0S6_WzA2Mj".into(),
            state: "s1".into(),
            presentation_definition_uri: Some("https://verifier.example/pd/s1".into()),
            ..AuthorizationRequest::default()
        };

        let qs = request.to_querystring().unwrap();
        assert!(qs.contains("response_mode=direct_post.jwt"));
        assert!(qs.contains("response_uri=https%3A%2F%2Fverifier.example%2Fverify%2Fs1"));

        let parsed = AuthorizationRequest::from_uri(&format!("openid4vp://authorize?{qs}")).unwrap();
        assert_eq!(parsed, request);
    }
}
