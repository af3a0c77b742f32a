//! # DID Web
//!
//! The `did:web` method hosts the DID document at a well-known HTTPS
//! location derived from the DID.
//!
//! See <https://w3c-ccg.github.io/did-method-web>.

use std::sync::LazyLock;

use regex::Regex;

use crate::Resolver;
use crate::document::Document;
use crate::error::Error;

static DID_REGEX: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new("^did:web:(?<identifier>[a-zA-Z0-9.\\-:%_]+)(#.*)?$").ok());

/// The URL of the DID document for a `did:web` DID.
///
/// # Errors
///
/// Returns [`Error::InvalidDid`] if the DID is malformed.
pub fn document_url(did: &str) -> Result<String, Error> {
    let regex = DID_REGEX.as_ref().ok_or_else(|| Error::InvalidDid("regex unavailable".into()))?;
    let Some(caps) = regex.captures(did) else {
        return Err(Error::InvalidDid(format!("{did} is not a valid did:web")));
    };
    let identifier = &caps["identifier"];

    // path segments are `:`-delimited, a port is percent-encoded
    let domain = identifier.replace(':', "/").replace("%3A", ":");
    let mut url = format!("https://{domain}");
    if !identifier.contains(':') {
        url = format!("{url}/.well-known");
    }
    Ok(format!("{url}/did.json"))
}

/// Resolve a `did:web` DID by fetching its document through `resolver`.
///
/// # Errors
///
/// Returns [`Error::NotFound`] if the document cannot be fetched or does not
/// describe the DID.
pub async fn resolve(did: &str, resolver: &dyn Resolver) -> Result<Document, Error> {
    let url = document_url(did)?;
    let document = resolver.resolve(&url).await.map_err(|e| Error::NotFound(format!("{url}: {e}")))?;

    let base = did.split('#').next().unwrap_or(did);
    if document.id != base {
        return Err(Error::NotFound(format!("document at {url} describes {}", document.id)));
    }
    Ok(document)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls() {
        assert_eq!(document_url("did:web:w3c-ccg.github.io").unwrap(), "https://w3c-ccg.github.io/.well-known/did.json");
        assert_eq!(
            document_url("did:web:w3c-ccg.github.io:user:alice").unwrap(),
            "https://w3c-ccg.github.io/user/alice/did.json"
        );
        assert_eq!(
            document_url("did:web:example.com%3A3000#key-1").unwrap(),
            "https://example.com:3000/.well-known/did.json"
        );
    }
}
