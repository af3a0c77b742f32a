//! # Url Encoder/Decoder
//!
//! Encoding and decoding of `application/x-www-form-urlencoded` query
//! strings and form posts. Nested objects and arrays are carried as
//! URL-encoded JSON, the way OID4VCI offers and OID4VP authorization
//! requests carry them.

use anyhow::{Result, anyhow};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

const UNRESERVED: &AsciiSet = &NON_ALPHANUMERIC.remove(b'.').remove(b'_').remove(b'-').remove(b'~');

/// Create an `application/x-www-form-urlencoded` representation of the
/// provided value suitable for use in an HTML query string or form post.
///
/// # Errors
///
/// Will return an error if the value is not an object or string, or if any
/// object-type field cannot be serialized to JSON.
pub fn encode<T: Serialize>(value: &T) -> Result<String> {
    let encoded = match serde_json::to_value(value)? {
        Value::Object(map) => map
            .iter()
            .filter(|(_, v)| !v.is_null())
            .map(|(k, v)| {
                let s = if let Value::String(s) = v { s } else { &v.to_string() };
                format!("{k}={}", utf8_percent_encode(s, UNRESERVED))
            })
            .collect::<Vec<String>>(),
        Value::String(s) => {
            vec![utf8_percent_encode(&s, UNRESERVED).to_string()]
        }
        _ => return Err(anyhow!("unsupported value")),
    };
    Ok(encoded.join("&"))
}

/// Percent-encode a single component.
#[must_use]
pub fn encode_component(value: &str) -> String {
    utf8_percent_encode(value, UNRESERVED).to_string()
}

/// Deserializes a url-encoded string to a value. Values that look like JSON
/// objects or arrays are parsed as JSON.
///
/// # Errors
///
/// Returns an error when a pair has no key, a JSON-looking value is not
/// valid JSON, or the result cannot be deserialized to `T`.
pub fn decode<T: DeserializeOwned>(s: &str) -> Result<T> {
    let mut map = Map::new();

    for part in s.trim_start_matches('?').split('&').filter(|p| !p.is_empty()) {
        let (key, encoded) = part.split_once('=').unwrap_or((part, ""));
        if key.is_empty() {
            return Err(anyhow!("missing key"));
        }
        let plus_free = encoded.replace('+', " ");
        let decoded = percent_decode_str(&plus_free).decode_utf8_lossy();
        let value = if decoded.starts_with('[') || decoded.starts_with('{') {
            serde_json::from_str(&decoded)?
        } else {
            Value::String(decoded.to_string())
        };
        map.insert(key.to_string(), value);
    }

    Ok(serde_json::from_value(Value::Object(map))?)
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;
    use serde_json::json;

    use super::*;

    #[derive(Debug, Deserialize, Serialize, PartialEq)]
    struct Offer {
        credential_offer_uri: Option<String>,
        credential_offer: Option<Value>,
    }

    #[test]
    fn nested_json_round_trip() {
        let offer = Offer {
            credential_offer_uri: None,
            credential_offer: Some(json!({"credential_issuer": "https://issuer.example"})),
        };
        let encoded = encode(&offer).unwrap();
        assert!(encoded.starts_with("credential_offer=%7B"));

        let decoded: Offer = decode(&encoded).unwrap();
        assert_eq!(decoded, offer);
    }

    #[test]
    fn plus_is_space() {
        let decoded: Map<String, Value> = decode("state=a+b&nonce=x%3Dy").unwrap();
        assert_eq!(decoded["state"], "a b");
        assert_eq!(decoded["nonce"], "x=y");
    }
}
