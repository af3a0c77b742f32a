//! # Verifiable Digital Credentials
//!
//! The W3C Verifiable Credential data model and the two credential formats
//! issued and verified by vcflow:
//!
//! - JWT-secured W3C credentials (`jwt_vc_json`), see [`issue`] and [`jwt`].
//! - Selective-disclosure JWT credentials (`vc+sd-jwt`), see [`sd_jwt`].
//!
//! Credentials are built from a template document overlaid with a mapping of
//! dynamic values ([`mapping`]) and signed with a [`vcflow_jose::Signer`].

mod error;
mod format;
pub mod issue;
pub mod jwt;
pub mod mapping;
pub mod sd_jwt;
pub mod w3c_vc;

#[cfg(test)]
mod test_support;

pub use crate::error::Error;
pub use crate::format::{Format, VpFormat};
pub use crate::issue::{IssueRequest, issue_jwt_vc, issue_sd_jwt_vc, issuer_kid, sign_raw};
pub use crate::jwt::JwtOptions;
pub use crate::mapping::{Environment, MergeContext, SystemEnvironment, ValueGenerator, merge};
pub use crate::sd_jwt::SdMap;
pub use crate::w3c_vc::W3cVc;
