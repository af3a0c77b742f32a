//! Types for the `OpenID4VP` verifier endpoints.

mod presentation_definition;
mod request;
mod response;
mod session;

pub use self::presentation_definition::*;
pub use self::request::*;
pub use self::response::*;
pub use self::session::*;
