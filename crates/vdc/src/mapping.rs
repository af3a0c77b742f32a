//! # Mapping Overlay
//!
//! A mapping is a JSON object shaped like part of a credential template.
//! Each leaf is either a literal or a placeholder naming a dynamic value:
//!
//! | Placeholder          | Value                                    |
//! |----------------------|------------------------------------------|
//! | `<uuid>`             | `urn:uuid:` + a fresh random UUID        |
//! | `<issuerDid>`        | the issuer DID                           |
//! | `<subjectDid>`       | the subject (holder) DID                 |
//! | `<timestamp>`        | now, RFC 3339                            |
//! | `<timestamp-in:Nd>`  | now + N days, RFC 3339                   |
//!
//! Unrecognised placeholders are carried through unchanged. Merging overlays
//! the resolved mapping onto the template: objects merge member by member,
//! anything else replaces the template value.

use chrono::{DateTime, SecondsFormat, TimeDelta, Utc};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Source of time and randomness for dynamic values.
pub trait Environment: Send + Sync {
    /// Current time.
    fn now(&self) -> DateTime<Utc>;

    /// A fresh UUID.
    fn uuid(&self) -> Uuid;
}

/// [`Environment`] backed by the system clock and random UUIDs.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemEnvironment;

impl Environment for SystemEnvironment {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn uuid(&self) -> Uuid {
        Uuid::new_v4()
    }
}

/// Values available to the generators during a merge.
pub struct MergeContext<'a> {
    /// Issuer DID for `<issuerDid>`.
    pub issuer_did: &'a str,

    /// Subject DID for `<subjectDid>`.
    pub subject_did: &'a str,

    /// Clock and UUID source.
    pub env: &'a dyn Environment,
}

/// A mapping leaf, classified.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ValueGenerator {
    /// Used as-is.
    Literal(Value),

    /// `<uuid>`
    Uuid,

    /// `<issuerDid>`
    IssuerDid,

    /// `<subjectDid>`
    SubjectDid,

    /// `<timestamp>`
    Timestamp,

    /// `<timestamp-in:Nd>`
    TimestampIn(TimeDelta),
}

impl ValueGenerator {
    /// Classify a mapping leaf.
    #[must_use]
    pub fn parse(leaf: &Value) -> Self {
        let Some(placeholder) = leaf.as_str().and_then(|s| s.strip_prefix('<')?.strip_suffix('>'))
        else {
            return Self::Literal(leaf.clone());
        };

        match placeholder {
            "uuid" => Self::Uuid,
            "issuerDid" => Self::IssuerDid,
            "subjectDid" => Self::SubjectDid,
            "timestamp" => Self::Timestamp,
            other => other
                .strip_prefix("timestamp-in:")
                .and_then(|n| n.strip_suffix('d'))
                .and_then(|n| n.parse::<i64>().ok())
                .and_then(TimeDelta::try_days)
                .map_or_else(|| Self::Literal(leaf.clone()), Self::TimestampIn),
        }
    }

    /// Whether resolving this generator can yield a different value on each
    /// call.
    #[must_use]
    pub const fn is_dynamic(&self) -> bool {
        matches!(self, Self::Uuid | Self::Timestamp | Self::TimestampIn(_))
    }

    /// Produce the value.
    #[must_use]
    pub fn resolve(&self, ctx: &MergeContext) -> Value {
        match self {
            Self::Literal(value) => value.clone(),
            Self::Uuid => format!("urn:uuid:{}", ctx.env.uuid()).into(),
            Self::IssuerDid => ctx.issuer_did.into(),
            Self::SubjectDid => ctx.subject_did.into(),
            Self::Timestamp => timestamp(ctx.env.now()).into(),
            Self::TimestampIn(delta) => timestamp(ctx.env.now() + *delta).into(),
        }
    }
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Overlay `mapping` onto `template`, resolving placeholders in the mapping.
#[must_use]
pub fn merge(template: &Value, mapping: &Value, ctx: &MergeContext) -> Value {
    let mut merged = template.clone();
    overlay(&mut merged, mapping, ctx);
    merged
}

/// Resolve placeholders appearing in `template` itself.
#[must_use]
pub fn render(template: &Value, ctx: &MergeContext) -> Value {
    resolve(template, ctx)
}

fn overlay(target: &mut Value, mapping: &Value, ctx: &MergeContext) {
    match (target, mapping) {
        (Value::Object(target), Value::Object(mapping)) => {
            for (name, value) in mapping {
                match target.get_mut(name) {
                    Some(existing) if existing.is_object() && value.is_object() => {
                        overlay(existing, value, ctx);
                    }
                    _ => {
                        target.insert(name.clone(), resolve(value, ctx));
                    }
                }
            }
        }
        (target, mapping) => *target = resolve(mapping, ctx),
    }
}

fn resolve(value: &Value, ctx: &MergeContext) -> Value {
    match value {
        Value::Object(map) => {
            Value::Object(map.iter().map(|(k, v)| (k.clone(), resolve(v, ctx))).collect::<Map<_, _>>())
        }
        Value::Array(items) => Value::Array(items.iter().map(|v| resolve(v, ctx)).collect()),
        leaf => ValueGenerator::parse(leaf).resolve(ctx),
    }
}

/// Whether `mapping` contains any generator yielding a fresh value on each
/// merge.
#[must_use]
pub fn is_dynamic(mapping: &Value) -> bool {
    match mapping {
        Value::Object(map) => map.values().any(is_dynamic),
        Value::Array(items) => items.iter().any(is_dynamic),
        leaf => ValueGenerator::parse(leaf).is_dynamic(),
    }
}
