//! # `OpenID` for Verifiable Presentations
//!
//! An API for requesting and verifying Verifiable Presentations based on the
//! [OpenID for Verifiable Presentations](https://openid.net/specs/openid-4-verifiable-presentations-1_0.html)
//! specification.
//!
//! 1. [`CreateRequestRequest`]: the verifying application names the
//!    credential types it wants, and the policies to check them with, and
//!    receives an Authorization Request for the wallet.
//! 2. [`RequestObjectRequest`]: a wallet sent the request by reference
//!    fetches it as a signed request object.
//!    [`PresentationDefinitionRequest`]: a wallet sent the presentation
//!    definition by reference fetches it.
//! 3. [`ResponseRequest`]: the wallet posts its presentation. Policies run
//!    and the outcome is stored on the session.
//! 4. [`SessionInfoRequest`]: the verifying application reads the outcome.
//!
//! Each request is processed by [`handle`] against an implementation of
//! [`provider::Provider`].

pub mod config;
pub mod provider;
pub mod types;

mod error;
mod handlers;
mod resolve;
mod state;

pub use vcflow_core::{api, generate, urlencode};
pub use {vcflow_jose as jose, vcflow_policy as policy, vcflow_vdc as vdc};

pub use self::config::VerifierConfig;
pub use self::error::Error;
pub use self::handlers::*;
pub use self::resolve::{resolve_presentation_definition, verify_request_object};
pub use self::types::*;
