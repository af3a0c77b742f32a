//! # Credential Formats

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Credential format identifiers used in OID4VCI credential configurations
/// and OID4VP presentation definitions.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq, Hash)]
pub enum Format {
    /// W3C credential secured as a JWT, without JSON-LD processing.
    #[default]
    #[serde(rename = "jwt_vc_json")]
    JwtVcJson,

    /// W3C credential secured as a JWT (older identifier).
    #[serde(rename = "jwt_vc")]
    JwtVc,

    /// W3C credential secured as a JWT, with JSON-LD processing.
    #[serde(rename = "jwt_vc_json-ld")]
    JwtVcJsonLd,

    /// W3C credential secured with a Data Integrity proof.
    #[serde(rename = "ldp_vc")]
    LdpVc,

    /// SD-JWT credential.
    #[serde(rename = "vc+sd-jwt", alias = "dc+sd-jwt")]
    SdJwtVc,

    /// ISO/IEC 18013-5 mobile document.
    #[serde(rename = "mso_mdoc")]
    MsoMdoc,
}

/// Presentation format identifiers.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq, Hash)]
pub enum VpFormat {
    /// JWT presentation of `jwt_vc_json` credentials.
    #[default]
    #[serde(rename = "jwt_vp_json")]
    JwtVpJson,

    /// JWT presentation of `jwt_vc` credentials.
    #[serde(rename = "jwt_vp")]
    JwtVp,

    /// Data Integrity presentation.
    #[serde(rename = "ldp_vp")]
    LdpVp,

    /// SD-JWT presentation (an SD-JWT with a key binding JWT).
    #[serde(rename = "vc+sd-jwt")]
    SdJwtVc,

    /// ISO/IEC 18013-5 device response.
    #[serde(rename = "mso_mdoc")]
    MsoMdoc,
}

impl Format {
    /// The format a wallet uses to present credentials of this format.
    #[must_use]
    pub const fn presentation_format(self) -> VpFormat {
        match self {
            Self::JwtVcJson | Self::JwtVcJsonLd => VpFormat::JwtVpJson,
            Self::JwtVc => VpFormat::JwtVp,
            Self::LdpVc => VpFormat::LdpVp,
            Self::SdJwtVc => VpFormat::SdJwtVc,
            Self::MsoMdoc => VpFormat::MsoMdoc,
        }
    }

    /// Whether this is a selective-disclosure format.
    #[must_use]
    pub const fn is_sd_jwt(self) -> bool {
        matches!(self, Self::SdJwtVc)
    }

    /// Wire identifier of the format.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::JwtVcJson => "jwt_vc_json",
            Self::JwtVc => "jwt_vc",
            Self::JwtVcJsonLd => "jwt_vc_json-ld",
            Self::LdpVc => "ldp_vc",
            Self::SdJwtVc => "vc+sd-jwt",
            Self::MsoMdoc => "mso_mdoc",
        }
    }
}

impl VpFormat {
    /// Wire identifier of the format.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::JwtVpJson => "jwt_vp_json",
            Self::JwtVp => "jwt_vp",
            Self::LdpVp => "ldp_vp",
            Self::SdJwtVc => "vc+sd-jwt",
            Self::MsoMdoc => "mso_mdoc",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for VpFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Format {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "jwt_vc_json" => Ok(Self::JwtVcJson),
            "jwt_vc" => Ok(Self::JwtVc),
            "jwt_vc_json-ld" => Ok(Self::JwtVcJsonLd),
            "ldp_vc" => Ok(Self::LdpVc),
            "vc+sd-jwt" | "dc+sd-jwt" => Ok(Self::SdJwtVc),
            "mso_mdoc" => Ok(Self::MsoMdoc),
            other => Err(crate::Error::UnsupportedFormat(other.to_string())),
        }
    }
}
