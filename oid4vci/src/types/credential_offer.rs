use std::fmt::{self, Display};
use std::io::Cursor;

use anyhow::Context as _;
use base64ct::{Base64, Encoding};
use qrcode::QrCode;
use serde::{Deserialize, Serialize};
use vcflow_core::urlencode;

use crate::types::IssuanceRequest;

/// The URI scheme wallets register to receive credential offers.
pub const CREDENTIAL_OFFER_SCHEME: &str = "openid-credential-offer://";

/// Request a Credential Offer for one or more credentials.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct CreateOfferRequest {
    /// The credentials to offer.
    pub credentials: Vec<IssuanceRequest>,

    /// Identifier for the issuance session. Doubles as the pre-authorized
    /// code. Generated when not set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,

    /// Specifies whether a Transaction Code (PIN) is required by the `token`
    /// endpoint.
    #[serde(default)]
    pub tx_code_required: bool,

    /// Whether the offer is sent by value or by reference. Defaults to the
    /// issuer's configured delivery.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub send_type: Option<SendType>,
}

/// Determines how the Credential Offer is sent to the Wallet.
#[derive(Clone, Copy, Default, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SendType {
    /// The Credential Offer is sent to the Wallet by value, as an object
    /// containing the Credential Offer parameters.
    #[default]
    ByVal,

    /// The Credential Offer is sent to the Wallet by reference, as a URL
    /// pointing to a location where the offer can be retrieved.
    ByRef,
}

/// The response to a Create Offer request.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct CreateOfferResponse {
    /// The issuance session identifier (and pre-authorized code).
    pub session_id: String,

    /// The offer as a wallet-invocable URI, e.g.
    /// `openid-credential-offer://?credential_offer=...`.
    pub offer_uri: String,

    /// The offer object, or the URL it can be fetched from.
    #[serde(flatten)]
    pub offer_type: OfferType,

    /// A transaction code to be provided by the End-User in order to complete
    /// a credential request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_code: Option<String>,
}

/// The type of Credential Offer returned in a `CreateOfferResponse`: either an
/// object or a URI.
#[derive(Clone, Debug, Deserialize, Serialize, Eq, PartialEq)]
pub enum OfferType {
    /// A Credential Offer object.
    #[serde(rename = "credential_offer")]
    Object(CredentialOffer),

    /// A URI pointing to the Credential Offer Endpoint where a
    /// `CredentialOffer` object can be retrieved.
    #[serde(rename = "credential_offer_uri")]
    Uri(String),
}

impl OfferType {
    /// The offer object, if sent by value.
    #[must_use]
    pub const fn as_object(&self) -> Option<&CredentialOffer> {
        match self {
            Self::Object(offer) => Some(offer),
            Self::Uri(_) => None,
        }
    }

    /// The offer URI, if sent by reference.
    #[must_use]
    pub const fn as_uri(&self) -> Option<&str> {
        match self {
            Self::Uri(uri) => Some(uri.as_str()),
            Self::Object(_) => None,
        }
    }
}

/// A Credential Offer object that can be sent to a Wallet.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct CredentialOffer {
    /// The URL of the Credential Issuer which the Wallet can use to obtain
    /// Credentials and the Issuer's Metadata.
    pub credential_issuer: String,

    /// Credential configurations offered to the Wallet.
    pub credential_configuration_ids: Vec<String>,

    /// Grant types the issuer will accept for this offer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grants: Option<Grants>,
}

/// Grants offered with a Credential Offer.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct Grants {
    /// Pre-authorized code grant.
    #[serde(rename = "urn:ietf:params:oauth:grant-type:pre-authorized_code")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pre_authorized_code: Option<PreAuthorizedCodeGrant>,
}

/// The pre-authorized code grant.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct PreAuthorizedCodeGrant {
    /// The code exchanged at the token endpoint.
    #[serde(rename = "pre-authorized_code")]
    pub pre_authorized_code: String,

    /// Present when the token endpoint expects a transaction code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_code: Option<TxCode>,
}

/// Describes the transaction code the wallet must collect from the user.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct TxCode {
    /// `numeric` or `text`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_mode: Option<String>,

    /// Length of the code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub length: Option<usize>,

    /// Guidance shown to the user.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl CredentialOffer {
    /// Generate a qrcode for the Credential Offer. `endpoint` is the wallet
    /// endpoint, typically [`CREDENTIAL_OFFER_SCHEME`].
    ///
    /// # Errors
    ///
    /// Returns an error if the offer cannot be serialized or rendered.
    pub fn to_qrcode(&self, endpoint: &str) -> anyhow::Result<String> {
        let qr_code = QrCode::new(format!("{endpoint}?{}", self.to_querystring()?))
            .context("failed to create QR code")?;

        let img_buf = qr_code.render::<image::Luma<u8>>().build();
        let mut buffer: Vec<u8> = Vec::new();
        let mut writer = Cursor::new(&mut buffer);
        img_buf.write_to(&mut writer, image::ImageFormat::Png).context("failed to create QR code")?;

        Ok(format!("data:image/png;base64,{}", Base64::encode_string(buffer.as_slice())))
    }

    /// The offer as a `credential_offer=...` query string.
    ///
    /// # Errors
    ///
    /// Returns an error if the offer cannot be serialized.
    pub fn to_querystring(&self) -> anyhow::Result<String> {
        let json = serde_json::to_string(self)?;
        Ok(format!("credential_offer={}", urlencode::encode_component(&json)))
    }

    /// The pre-authorized code, if the offer carries one.
    #[must_use]
    pub fn pre_authorized_code(&self) -> Option<&PreAuthorizedCodeGrant> {
        self.grants.as_ref().and_then(|grants| grants.pre_authorized_code.as_ref())
    }
}

impl Display for CredentialOffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        write!(f, "{s}")
    }
}

/// The Credential Offer Request is used by the Wallet to retrieve a previously
/// generated Credential Offer.
///
/// The Wallet is sent a `credential_offer_uri` containing a unique URL pointing
/// to the Offer. The URI has the form `credential_issuer/credential_offer/id`.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CredentialOfferRequest {
    /// The unique identifier for the the previously generated Credential Offer.
    pub id: String,
}

/// The Credential Offer Response is used to return a previously generated
/// Credential Offer.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct CredentialOfferResponse(pub CredentialOffer);
