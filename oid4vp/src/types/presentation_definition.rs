//! # Presentation Definition
//!
//! The subset of [Presentation Exchange](https://identity.foundation/presentation-exchange/spec/v2.0.0/)
//! used to ask a wallet for credentials by type.

use anyhow::{Context as _, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use vcflow_vdc::Format;

/// Paths, in order of preference, at which a credential's `type` is found.
const TYPE_PATHS: [&str; 2] = ["$.vc.type", "$.type"];

/// Describes the credentials a verifier wants presented.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct PresentationDefinition {
    /// Unique identifier of the definition.
    pub id: String,

    /// One descriptor per requested credential.
    pub input_descriptors: Vec<InputDescriptor>,
}

/// Describes a single requested credential.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct InputDescriptor {
    /// Identifier of the descriptor. The requested credential type.
    pub id: String,

    /// Acceptable formats, keyed by format identifier.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub format: Map<String, Value>,

    /// Conditions a presented credential must meet.
    pub constraints: Constraints,
}

/// Constraints on a presented credential.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct Constraints {
    /// Fields the credential must contain.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<Field>,

    /// `required` when the wallet should disclose only what the fields
    /// name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit_disclosure: Option<String>,
}

/// A required field.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct Field {
    /// Candidate paths to the field. The first that resolves is used.
    pub path: Vec<String>,

    /// JSON Schema the field's value must satisfy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<Value>,
}

impl PresentationDefinition {
    /// A definition asking for one credential of each of `types`, all in
    /// `format`.
    #[must_use]
    pub fn for_types<I, S>(id: impl Into<String>, types: I, format: Format) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let input_descriptors = types
            .into_iter()
            .map(|type_| {
                let type_ = type_.into();
                InputDescriptor {
                    format: Map::from_iter([(format.to_string(), json!({}))]),
                    constraints: Constraints {
                        fields: vec![Field {
                            path: TYPE_PATHS.iter().map(ToString::to_string).collect(),
                            filter: Some(json!({
                                "type": "array",
                                "contains": {"const": type_}
                            })),
                        }],
                        limit_disclosure: format.is_sd_jwt().then(|| "required".to_string()),
                    },
                    id: type_,
                }
            })
            .collect();

        Self {
            id: id.into(),
            input_descriptors,
        }
    }

    /// The requested credential types.
    pub fn requested_types(&self) -> impl Iterator<Item = &str> {
        self.input_descriptors.iter().map(|d| d.id.as_str())
    }
}

impl InputDescriptor {
    /// Whether the credential `payload` satisfies every field constraint.
    ///
    /// # Errors
    ///
    /// Returns an error if a field's filter is not a valid JSON Schema.
    pub fn matches(&self, payload: &Map<String, Value>) -> Result<bool> {
        for field in &self.constraints.fields {
            let Some(value) = field.path.iter().find_map(|path| select(payload, path)) else {
                return Ok(false);
            };
            if let Some(filter) = &field.filter {
                let validator = jsonschema::validator_for(filter)
                    .map_err(|e| anyhow::anyhow!("{e}"))
                    .with_context(|| format!("invalid filter in input descriptor `{}`", self.id))?;
                if !validator.is_valid(value) {
                    return Ok(false);
                }
            }
        }
        Ok(true)
    }
}

// Resolve a dotted `$.a.b` path.
fn select<'a>(payload: &'a Map<String, Value>, path: &str) -> Option<&'a Value> {
    let mut segments = path.strip_prefix("$.")?.split('.');
    let mut current = payload.get(segments.next()?)?;
    for segment in segments {
        current = current.get(segment)?;
    }
    Some(current)
}
