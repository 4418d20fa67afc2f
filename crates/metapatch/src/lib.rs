//! Metadata patch engine.
//!
//! Computes minimal RFC 6902-style patch payloads for a remote
//! metadata-write API from a partial set of field edits. Multi-valued
//! fields arrive encoded as indexed flat keys (`subject[0]`, `subject[1]`)
//! and are reconciled against the current source snapshot under one of
//! four edit semantics: overwrite (the default), text append, list append,
//! and positional insert. The reserved value `"REMOVE_TAG"` marks a field
//! or array element for deletion.
//!
//! The engine is purely computational: it produces a patch body and a
//! target string and never performs I/O. Fetching the source snapshot and
//! submitting the payload belong to the surrounding transport layer.
//!
//! # Example
//!
//! ```
//! use metapatch::{build_payload, EditFlags, ItemSnapshot, MetadataEdit};
//! use serde_json::json;
//!
//! let snapshot: ItemSnapshot = serde_json::from_value(json!({
//!     "metadata": {"title": "Old title", "subject": ["a", "b"]},
//!     "files": []
//! })).unwrap();
//!
//! let fields = json!({"title": "New title"});
//! let edit = MetadataEdit::Single {
//!     target: "metadata".to_string(),
//!     fields: fields.as_object().unwrap().clone(),
//! };
//!
//! let payload = build_payload(&edit, Some(&snapshot), &EditFlags::default(), -5).unwrap();
//! let body = payload.to_body().unwrap();
//! assert_eq!(body["-target"], "metadata");
//! assert_eq!(body["priority"], -5);
//! ```

pub mod merge;
pub mod normalize;
pub mod patch;
pub mod route;
pub mod types;

pub use merge::{merge, EditFlags};
pub use normalize::{normalize_flattened, normalize_scalar, REMOVE_TAG};
pub use patch::{apply_patch, diff, generate_patch, Op};
pub use route::{build_payload, ItemSnapshot, MetadataEdit, PatchPayload, Target, TargetPatch};
pub use types::{Error, MetadataMap};
