//! Value normalization.
//!
//! Past this boundary every field value is either a single string or an
//! ordered sequence of strings. Scalars are stringified through their
//! canonical textual form; `null` top-level values mean "no edit requested"
//! and are dropped; anything else that cannot become a string is an error.
//!
//! The wire sentinel [`REMOVE_TAG`] is also recognized here: inside the
//! engine a deletion is the tagged [`Write::Delete`], never the literal
//! string, so a field whose real value happens to be that text cannot leak
//! into merge decisions anywhere past this module.

use indexmap::IndexMap;
use serde_json::Value;

use crate::types::{Error, MetadataMap};

/// Reserved value marking a field or array element for deletion.
pub const REMOVE_TAG: &str = "REMOVE_TAG";

/// A single normalized field write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Write {
    Set(String),
    Delete,
}

/// Stringify a scalar value.
///
/// # Errors
///
/// [`Error::UnsupportedValue`] for `null`, objects, and arrays; the message
/// names the value's type. Callers that know the field key wrap the error
/// with it instead.
///
/// # Example
///
/// ```
/// use metapatch::normalize_scalar;
/// use serde_json::json;
///
/// assert_eq!(normalize_scalar(&json!("x")).unwrap(), "x");
/// assert_eq!(normalize_scalar(&json!(42)).unwrap(), "42");
/// assert_eq!(normalize_scalar(&json!(true)).unwrap(), "true");
/// assert!(normalize_scalar(&json!(null)).is_err());
/// ```
pub fn normalize_scalar(value: &Value) -> Result<String, Error> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Null => Err(Error::UnsupportedValue("null".to_string())),
        Value::Array(_) => Err(Error::UnsupportedValue("array".to_string())),
        Value::Object(_) => Err(Error::UnsupportedValue("object".to_string())),
    }
}

/// Flatten a metadata map into indexed flat keys with string values.
///
/// Scalar fields emit one entry under the bare name; array fields emit one
/// entry per element under `name[i]`. `null` top-level values are dropped
/// silently. A `null` (or otherwise unsupported) array element is an error
/// naming the flattened key, since a gap in an ordered list is not
/// representable.
///
/// # Example
///
/// ```
/// use metapatch::normalize_flattened;
/// use serde_json::json;
///
/// let map = json!({"title": "A", "subject": ["x", "y"], "skip": null});
/// let flat = normalize_flattened(map.as_object().unwrap()).unwrap();
/// assert_eq!(flat.get("title").unwrap(), "A");
/// assert_eq!(flat.get("subject[0]").unwrap(), "x");
/// assert_eq!(flat.get("subject[1]").unwrap(), "y");
/// assert!(!flat.contains_key("skip"));
/// ```
pub fn normalize_flattened(map: &MetadataMap) -> Result<IndexMap<String, String>, Error> {
    let mut out = IndexMap::new();
    for (name, value) in map {
        match value {
            Value::Null => continue,
            Value::Array(items) => {
                for (i, item) in items.iter().enumerate() {
                    let key = metapatch_flatkey::encode(name, Some(i));
                    let s = normalize_scalar(item)
                        .map_err(|_| Error::UnsupportedValue(key.clone()))?;
                    out.insert(key, s);
                }
            }
            scalar => {
                let s =
                    normalize_scalar(scalar).map_err(|_| Error::UnsupportedValue(name.clone()))?;
                out.insert(name.clone(), s);
            }
        }
    }
    Ok(out)
}

/// Normalize a scalar into a tagged write, recognizing the deletion
/// sentinel. Errors name `key`.
pub(crate) fn write_for(key: &str, value: &Value) -> Result<Write, Error> {
    let s = normalize_scalar(value).map_err(|_| Error::UnsupportedValue(key.to_string()))?;
    if s == REMOVE_TAG {
        Ok(Write::Delete)
    } else {
        Ok(Write::Set(s))
    }
}
