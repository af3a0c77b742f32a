use serde::{Deserialize, Serialize};

/// Upon receiving a successful Authorization Response (here, a credential
/// offer carrying a pre-authorized code), a Token Request is made to obtain
/// an access token and a `c_nonce` for proofs of possession.
///
/// The request is sent form-encoded:
///
/// ```text
/// grant_type=urn:ietf:params:oauth:grant-type:pre-authorized_code
///   &pre-authorized_code=SplxlOBeZQQYbYS6WxSbIA&tx_code=493536
/// ```
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct TokenRequest {
    /// The grant being exchanged.
    #[serde(flatten)]
    pub grant_type: TokenGrantType,

    /// OAuth 2.0 client identifier. Optional for pre-authorized flows.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
}

/// Grants accepted at the token endpoint.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(tag = "grant_type")]
pub enum TokenGrantType {
    /// Pre-authorized code grant.
    #[serde(rename = "urn:ietf:params:oauth:grant-type:pre-authorized_code")]
    PreAuthorizedCode {
        /// The code from the credential offer.
        #[serde(rename = "pre-authorized_code")]
        pre_authorized_code: String,

        /// Transaction code, when the offer requires one.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tx_code: Option<String>,
    },
}

/// Access token types.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub enum TokenType {
    /// Bearer token.
    #[default]
    Bearer,
}

/// Token Response.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct TokenResponse {
    /// Access token for the credential endpoints.
    pub access_token: String,

    /// Token type.
    pub token_type: TokenType,

    /// Lifetime of the access token, in seconds.
    pub expires_in: i64,

    /// Nonce to include in proofs of possession.
    pub c_nonce: String,

    /// Lifetime of `c_nonce`, in seconds.
    pub c_nonce_expires_in: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn form_encoded() {
        let request: TokenRequest = serde_urlencoded::from_str(
            "grant_type=urn%3Aietf%3Aparams%3Aoauth%3Agrant-type%3Apre-authorized_code&pre-authorized_code=abc&tx_code=1234",
        )
        .unwrap();
        assert_eq!(request.grant_type, TokenGrantType::PreAuthorizedCode {
            pre_authorized_code: "abc".into(),
            tx_code: Some("1234".into()),
        });
    }
}
