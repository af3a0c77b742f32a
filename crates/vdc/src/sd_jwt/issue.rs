//! # SD-JWT Issuance

use anyhow::Result;
use serde_json::{Map, Value};

use crate::sd_jwt::{Disclosure, SdMap};

/// Replace each field marked in `sd_map` with the digest of a new disclosure,
/// returning the disclosures in the order they were created.
///
/// Nested fields are concealed before their parent, so a disclosable object
/// may itself carry `_sd` digests. Marked fields absent from `doc` are
/// ignored. Each `_sd` array is sorted so digest order reveals nothing about
/// the original field order.
///
/// # Errors
///
/// Returns an error if a disclosure cannot be encoded.
pub fn conceal(doc: &mut Map<String, Value>, sd_map: &SdMap) -> Result<Vec<Disclosure>> {
    let mut disclosures = vec![];
    let mut digests = vec![];

    for (name, field) in &sd_map.fields {
        if let Some(children) = &field.children
            && let Some(Value::Object(nested)) = doc.get_mut(name)
        {
            disclosures.extend(conceal(nested, children)?);
        }

        if field.sd
            && let Some(value) = doc.remove(name)
        {
            let disclosure = Disclosure::new(name, value);
            digests.push(disclosure.digest()?);
            disclosures.push(disclosure);
        }
    }

    if !digests.is_empty() {
        if let Some(Value::Array(existing)) = doc.remove("_sd") {
            digests.extend(existing.into_iter().filter_map(|d| d.as_str().map(ToString::to_string)));
        }
        digests.sort();
        doc.insert("_sd".into(), digests.into_iter().map(Value::from).collect());
    }

    Ok(disclosures)
}
