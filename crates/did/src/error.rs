/// DID resolution error codes.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The DID method is not supported.
    #[error("methodNotSupported: {0}")]
    MethodNotSupported(String),

    /// The DID does not conform to valid syntax.
    #[error("invalidDid: {0}")]
    InvalidDid(String),

    /// The DID document could not be found.
    #[error("notFound: {0}")]
    NotFound(String),

    /// The public key is invalid or of an unsupported type.
    #[error("invalidPublicKey: {0}")]
    InvalidPublicKey(String),

    /// Other, unspecified errors (usually transport).
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// Returns the DID resolution error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::MethodNotSupported(_) => "methodNotSupported",
            Self::InvalidDid(_) => "invalidDid",
            Self::NotFound(_) => "notFound",
            Self::InvalidPublicKey(_) => "invalidPublicKey",
            Self::Other(_) => "internalError",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes() {
        let err = Error::InvalidDid("bad prefix".into());
        assert_eq!(err.code(), "invalidDid");
        assert_eq!(err.to_string(), "invalidDid: bad prefix");
    }
}
