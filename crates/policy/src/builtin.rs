//! # Built-in Policies
//!
//! | Name                  | Checks                                              | Arguments               |
//! |-----------------------|-----------------------------------------------------|-------------------------|
//! | `signature`           | JWT credential or presentation signature            |                         |
//! | `sd-jwt-vc-signature` | SD-JWT signature, disclosures and key binding       |                         |
//! | `schema`              | credential against a JSON schema                    | the schema              |
//! | `expired`             | `exp` (or `validUntil`) is not in the past          |                         |
//! | `not-before`          | `nbf` (or `validFrom`) is not in the future         |                         |
//! | `webhook`             | an external service accepts the credential          | the webhook URL         |
//! | `minimum-credentials` | presentation carries at least N credentials         | N                       |
//! | `maximum-credentials` | presentation carries at most N credentials          | N                       |
//! | `allowed-issuer`      | issuer is in an allow-list                          | DID or list of DIDs     |

mod credentials;
mod dates;
mod issuer;
mod schema;
mod signature;
mod webhook;

pub use self::credentials::{MaximumCredentialsPolicy, MinimumCredentialsPolicy};
pub use self::dates::{ExpirationPolicy, NotBeforePolicy};
pub use self::issuer::AllowedIssuerPolicy;
pub use self::schema::JsonSchemaPolicy;
pub use self::signature::{JwtSignaturePolicy, SdJwtVcSignaturePolicy};
pub use self::webhook::WebhookPolicy;
