//! # `OpenID` for Verifiable Credential Issuance Types

mod credential;
mod credential_offer;
mod issuance;
mod metadata;
mod token;

pub use self::credential::*;
pub use self::credential_offer::*;
pub use self::issuance::*;
pub use self::metadata::*;
pub use self::token::*;
