//! # Core
//!
//! Types and plumbing shared by the issuer and verifier crates: request and
//! response wrappers, the TTL-aware state store, per-key locking, and random
//! token generation.

pub mod api;
pub mod datastore;
pub mod generate;
pub mod lock;
pub mod state;
pub mod urlencode;

use serde::{Deserialize, Serialize};

pub use crate::datastore::{Datastore, MemoryStore};
pub use crate::lock::KeyedLock;
pub use crate::state::{State, StateStore};

/// `OneMany` allows serde to serialize/deserialize a single object or a set of
/// objects.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum OneMany<T> {
    /// Single object
    One(T),

    /// Set of objects
    Many(Vec<T>),
}

impl<T: Default> Default for OneMany<T> {
    fn default() -> Self {
        Self::One(T::default())
    }
}

impl<T> From<T> for OneMany<T> {
    fn from(value: T) -> Self {
        Self::One(value)
    }
}

impl<T> From<Vec<T>> for OneMany<T> {
    fn from(value: Vec<T>) -> Self {
        Self::Many(value)
    }
}

impl<T> OneMany<T> {
    /// Returns the contents as a Vec regardless of shape.
    pub fn to_vec(self) -> Vec<T> {
        match self {
            Self::One(one) => vec![one],
            Self::Many(many) => many,
        }
    }

    /// Returns `true` for an empty `Many`.
    pub const fn is_empty(&self) -> bool {
        match self {
            Self::One(_) => false,
            Self::Many(many) => many.is_empty(),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn one_many_shapes() {
        let one: OneMany<String> = serde_json::from_value(json!("VerifiableCredential")).unwrap();
        assert_eq!(one.to_vec(), ["VerifiableCredential"]);

        let many: OneMany<String> =
            serde_json::from_value(json!(["VerifiableCredential", "OpenBadgeCredential"]))
                .unwrap();
        assert_eq!(many.to_vec().last().map(String::as_str), Some("OpenBadgeCredential"));

        let none: OneMany<String> = serde_json::from_value(json!([])).unwrap();
        assert!(none.is_empty());
    }
}
