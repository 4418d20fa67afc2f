//! Flat-key codec for indexed metadata fields.
//!
//! Archive-style metadata APIs represent ordered multi-valued fields as
//! individually addressable string keys: `subject`, `subject[0]`,
//! `subject[1]`, and so on. This crate encodes and decodes that convention.
//!
//! # Example
//!
//! ```
//! use metapatch_flatkey::{encode, decode};
//!
//! assert_eq!(encode("subject", Some(2)), "subject[2]");
//! assert_eq!(encode("subject", None), "subject");
//!
//! let (name, idx) = decode("subject[2]").unwrap();
//! assert_eq!(name, "subject");
//! assert_eq!(idx, Some(2));
//! ```

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum KeyError {
    #[error("EMPTY_KEY")]
    Empty,
    #[error("INVALID_NAME: {0}")]
    InvalidName(String),
    #[error("INVALID_INDEX: {0}")]
    InvalidIndex(String),
}

/// Encode a field name and optional index as a flat key.
///
/// # Example
///
/// ```
/// use metapatch_flatkey::encode;
///
/// assert_eq!(encode("creator", None), "creator");
/// assert_eq!(encode("creator", Some(0)), "creator[0]");
/// ```
pub fn encode(name: &str, idx: Option<usize>) -> String {
    match idx {
        None => name.to_string(),
        Some(i) => format!("{name}[{i}]"),
    }
}

/// Decode a flat key into its field name and optional index.
///
/// The name portion must start with an ASCII letter and continue with
/// letters, digits, `.`, `-`, or `_`. The index, when present, is a
/// bracketed run of ASCII digits and is parsed to an integer, so
/// `"a[01]"` decodes to `("a", 1)`. The name is never canonicalized.
///
/// # Errors
///
/// - [`KeyError::Empty`] for the empty string
/// - [`KeyError::InvalidName`] when the name violates the grammar
/// - [`KeyError::InvalidIndex`] when the bracket portion is not a
///   parseable run of digits
///
/// # Example
///
/// ```
/// use metapatch_flatkey::decode;
///
/// assert_eq!(decode("subject").unwrap(), ("subject".to_string(), None));
/// assert_eq!(decode("subject[3]").unwrap(), ("subject".to_string(), Some(3)));
/// assert!(decode("[1]").is_err());
/// assert!(decode("1abc").is_err());
/// ```
pub fn decode(key: &str) -> Result<(String, Option<usize>), KeyError> {
    if key.is_empty() {
        return Err(KeyError::Empty);
    }
    let (name, idx) = match split_index(key)? {
        Some((name, digits)) => {
            let idx: usize = digits
                .parse()
                .map_err(|_| KeyError::InvalidIndex(key.to_string()))?;
            (name, Some(idx))
        }
        None => (key, None),
    };
    if !is_valid_name(name) {
        return Err(KeyError::InvalidName(key.to_string()));
    }
    Ok((name.to_string(), idx))
}

/// Split a trailing `[digits]` suffix off a key, if present.
///
/// Returns `Ok(Some((name, digits)))` for `name[digits]`, `Ok(None)` when
/// the key carries no suffix, and an error when brackets are present but
/// malformed (unclosed, empty, or holding non-digits).
fn split_index(key: &str) -> Result<Option<(&str, &str)>, KeyError> {
    let bytes = key.as_bytes();
    if bytes[bytes.len() - 1] != b']' {
        return Ok(None);
    }
    let open = key
        .find('[')
        .ok_or_else(|| KeyError::InvalidIndex(key.to_string()))?;
    let digits = &key[open + 1..key.len() - 1];
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(KeyError::InvalidIndex(key.to_string()));
    }
    Ok(Some((&key[..open], digits)))
}

/// Check a field name against the identifier grammar:
/// an ASCII letter followed by letters, digits, `.`, `-`, or `_`.
pub fn is_valid_name(name: &str) -> bool {
    let bytes = name.as_bytes();
    match bytes.first() {
        Some(b) if b.is_ascii_alphabetic() => {}
        _ => return false,
    }
    bytes[1..]
        .iter()
        .all(|&b| b.is_ascii_alphanumeric() || b == b'.' || b == b'-' || b == b'_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_bare_and_indexed() {
        assert_eq!(encode("subject", None), "subject");
        assert_eq!(encode("subject", Some(0)), "subject[0]");
        assert_eq!(encode("external-identifier", Some(12)), "external-identifier[12]");
    }

    #[test]
    fn decode_bare() {
        assert_eq!(decode("subject").unwrap(), ("subject".to_string(), None));
        assert_eq!(decode("x").unwrap(), ("x".to_string(), None));
        assert_eq!(
            decode("scanner.date").unwrap(),
            ("scanner.date".to_string(), None)
        );
    }

    #[test]
    fn decode_indexed() {
        assert_eq!(decode("subject[0]").unwrap(), ("subject".to_string(), Some(0)));
        assert_eq!(decode("subject[42]").unwrap(), ("subject".to_string(), Some(42)));
    }

    #[test]
    fn decode_leading_zero_index() {
        // The index is parsed to an integer; leading zeros are not preserved.
        assert_eq!(decode("a[01]").unwrap(), ("a".to_string(), Some(1)));
        assert_eq!(decode("a[0]").unwrap(), ("a".to_string(), Some(0)));
    }

    #[test]
    fn decode_negative_corpus() {
        for key in ["", "[1]", "a[", "1abc", "a[x]", "a[]", "a[1]b", "a[-1]", "-a"] {
            assert!(decode(key).is_err(), "expected error for {key:?}");
        }
    }

    #[test]
    fn decode_error_kinds() {
        assert_eq!(decode(""), Err(KeyError::Empty));
        assert!(matches!(decode("1abc"), Err(KeyError::InvalidName(_))));
        assert!(matches!(decode("[1]"), Err(KeyError::InvalidName(_))));
        assert!(matches!(decode("a[]"), Err(KeyError::InvalidIndex(_))));
        assert!(matches!(decode("a[x]"), Err(KeyError::InvalidIndex(_))));
    }

    #[test]
    fn decode_overflowing_index() {
        assert!(matches!(
            decode("a[99999999999999999999999999]"),
            Err(KeyError::InvalidIndex(_))
        ));
    }

    #[test]
    fn roundtrip() {
        let cases = [
            ("subject", None),
            ("subject", Some(0)),
            ("subject", Some(17)),
            ("x-archive.meta_01", Some(3)),
            ("a", Some(100)),
        ];
        for (name, idx) in cases {
            let key = encode(name, idx);
            assert_eq!(decode(&key).unwrap(), (name.to_string(), idx));
        }
    }
}
