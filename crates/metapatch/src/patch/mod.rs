//! Patch generation (RFC 6902 subset).
//!
//! [`diff`] computes a structural diff between two documents; objects are
//! diffed per key and arrays positionally. [`generate_patch`] validates
//! the source document, strips deletion sentinels from the destination,
//! and returns the operation list whose in-order application reproduces
//! the destination exactly. [`apply_op`]/[`apply_patch`] implement that
//! application for verification.

pub mod apply;
pub mod codec;
pub mod diff;
pub mod types;

pub use apply::{apply_op, apply_patch};
pub use codec::{from_json, to_json};
pub use diff::{diff, generate_patch};
pub use types::{Op, Path};

/// Format a path as a JSON Pointer string (RFC 6901), escaping `~` and `/`.
pub(crate) fn format_pointer(path: &[String]) -> String {
    if path.is_empty() {
        return String::new();
    }
    let mut out = String::with_capacity(path.len() * 8);
    for step in path {
        out.push('/');
        out.push_str(&step.replace('~', "~0").replace('/', "~1"));
    }
    out
}

/// Parse a JSON Pointer string into path steps, unescaping `~1` then `~0`.
pub(crate) fn parse_pointer(pointer: &str) -> Vec<String> {
    if pointer.is_empty() {
        return Vec::new();
    }
    pointer[1..]
        .split('/')
        .map(|step| step.replace("~1", "/").replace("~0", "~"))
        .collect()
}
