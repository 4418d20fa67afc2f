//! Core types shared across the engine.

use thiserror::Error;

pub use metapatch_flatkey::KeyError;

/// A metadata document: field name to value, insertion order preserved
/// (`serde_json` is built with `preserve_order`).
pub type MetadataMap = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, Error)]
pub enum Error {
    /// A supplied flat key does not match the key grammar.
    #[error("MALFORMED_KEY: {0}")]
    Key(#[from] KeyError),
    /// A field or array element has a type that cannot be normalized.
    #[error("UNSUPPORTED_VALUE: {0}")]
    UnsupportedValue(String),
    /// A target string is syntactically invalid.
    #[error("MALFORMED_TARGET: {0}")]
    MalformedTarget(String),
    /// The source metadata for the requested target cannot be resolved.
    #[error("ITEM_NOT_FOUND: {0}")]
    ItemLocate(String),
    /// The source snapshot structure is not diffable.
    #[error("INVALID_SOURCE: {0}")]
    InvalidSource(String),
    /// A serialized patch operation could not be decoded.
    #[error("INVALID_OP: {0}")]
    InvalidOp(String),
    /// A patch operation could not be applied to the document.
    #[error("APPLY: {0}")]
    Apply(String),
    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),
}
