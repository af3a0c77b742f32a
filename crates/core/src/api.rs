//! # API
//!
//! Request and response wrappers shared by the issuer and verifier crates.
//! Each crate exposes one `handle` function that routes a [`Request`] to the
//! [`Handler`] for its body type, on behalf of an owner: the credential
//! issuer or verifier identifier the request is addressed to.
//!
//! A [`Response`] maps onto HTTP: a status, an optional redirect `location`,
//! and a JSON-serializable body.

use std::fmt::Debug;
use std::ops::Deref;

use http::StatusCode;

/// A request body with any headers its handler needs (an access token for
/// the credential endpoints, nothing for most others).
#[derive(Clone, Debug)]
pub struct Request<B, H = NoHeaders>
where
    B: Body,
    H: Headers,
{
    /// Endpoint-specific request.
    pub body: B,

    /// Endpoint-specific headers.
    pub headers: H,
}

impl<B: Body> From<B> for Request<B> {
    fn from(body: B) -> Self {
        Self {
            body,
            headers: NoHeaders,
        }
    }
}

/// A handler's response.
#[derive(Clone, Debug)]
pub struct Response<T> {
    /// HTTP status: `200 OK` unless the handler says otherwise.
    pub status: StatusCode,

    /// Where the caller should go next. Set by the verifier's response
    /// endpoint when the session names a success or error redirect, with
    /// `$id` already replaced by the session id. Front ends may send it as
    /// a `Location` header or hand it to the wallet in the body.
    pub location: Option<String>,

    /// Endpoint-specific response.
    pub body: T,
}

impl<T> Response<T> {
    /// A `201 Created` response, for handlers that create a session.
    pub const fn created(body: T) -> Self {
        Self {
            status: StatusCode::CREATED,
            location: None,
            body,
        }
    }

    /// Point the caller at `location`, if any. The status is unchanged:
    /// wallets posting a `direct_post` response expect `200 OK`.
    #[must_use]
    pub fn redirect(mut self, location: Option<String>) -> Self {
        self.location = location;
        self
    }
}

impl<T> From<T> for Response<T> {
    fn from(body: T) -> Self {
        Self {
            status: StatusCode::OK,
            location: None,
            body,
        }
    }
}

impl<T> Deref for Response<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.body
    }
}

/// Processes one kind of request for `owner` against a provider `P`,
/// producing a `U`.
pub trait Handler<U, P> {
    /// Error returned when the request cannot be processed.
    type Error;

    /// Process the request.
    fn handle(
        self, owner: &str, provider: &P,
    ) -> impl Future<Output = Result<impl Into<Response<U>>, Self::Error>> + Send;
}

/// Marker for request bodies (the `xxxRequest` types).
pub trait Body: Clone + Debug + Send + Sync {}

/// Marker for request headers.
pub trait Headers: Clone + Debug + Send + Sync {}

/// No headers.
#[derive(Clone, Debug)]
pub struct NoHeaders;
impl Headers for NoHeaders {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses() {
        let ok: Response<&str> = "body".into();
        assert_eq!(ok.status, StatusCode::OK);
        assert_eq!(*ok, "body");

        let created = Response::created("session");
        assert_eq!(created.status, StatusCode::CREATED);

        let redirected = Response::from(()).redirect(Some("https://verifier.example/done/1".into()));
        assert_eq!(redirected.status, StatusCode::OK);
        assert_eq!(redirected.location.as_deref(), Some("https://verifier.example/done/1"));
    }
}
