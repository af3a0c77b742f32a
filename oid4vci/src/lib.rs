//! # `OpenID` for Verifiable Credential Issuance
//!
//! An API for the issuance of Verifiable Credentials based on the
//! [OpenID for Verifiable Credential Issuance](https://openid.net/specs/openid-4-verifiable-credential-issuance-1_0.html)
//! specification, using the pre-authorized code flow.
//!
//! A flow runs through the endpoints in order:
//!
//! 1. [`CreateOfferRequest`]: the issuing application registers the
//!    credentials to issue and receives a credential offer for the wallet.
//! 2. [`CredentialOfferRequest`]: a wallet sent the offer by reference
//!    fetches it.
//! 3. [`TokenRequest`]: the wallet exchanges the pre-authorized code for an
//!    access token and a `c_nonce`. The code is single use.
//! 4. [`CredentialRequest`] or [`BatchCredentialRequest`]: the wallet proves
//!    possession of its key and receives signed credentials, or a
//!    `transaction_id` when issuance is deferred.
//! 5. [`DeferredCredentialRequest`]: the wallet redeems a `transaction_id`.
//!
//! Each request is processed by [`handle`] against an implementation of
//! [`provider::Provider`].

pub mod config;
pub mod provider;
pub mod types;

mod error;
mod handlers;
mod state;

pub use vcflow_core::{api, generate, urlencode};
pub use {vcflow_did as did, vcflow_jose as jose, vcflow_vdc as vdc};

pub use self::config::IssuerConfig;
pub use self::error::Error;
pub use self::handlers::*;
pub use self::types::*;
