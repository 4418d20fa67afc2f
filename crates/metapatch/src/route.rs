//! Target routing and payload assembly.
//!
//! An edit names the metadata surface it applies to: the whole item
//! (`metadata`), a single file (`files/<name>`), or a custom path into the
//! item document. The router resolves the matching source slice from the
//! snapshot, runs the merger and patch generator against it, and packages
//! the result into the wire payload, aggregating multiple targets into one
//! multi-change payload when asked.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::merge::{merge, EditFlags};
use crate::patch::{codec, generate_patch, Op};
use crate::types::{Error, MetadataMap};

/// A metadata surface an edit applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// Whole-item metadata.
    Metadata,
    /// A single file's metadata record.
    File(String),
    /// A custom path into the item document, `/`-separated. Routing here
    /// is best-effort: the slice is resolved from the snapshot's
    /// remaining top-level members and missing paths merge against an
    /// empty document.
    Custom(String),
}

impl Target {
    /// Parse a target string. The empty string defaults to `metadata`.
    ///
    /// # Errors
    ///
    /// [`Error::MalformedTarget`] for a bare `files/` with no file name,
    /// or for custom paths with empty segments (leading, trailing, or
    /// doubled `/`).
    pub fn parse(s: &str) -> Result<Target, Error> {
        if s.is_empty() || s == "metadata" {
            return Ok(Target::Metadata);
        }
        if let Some(name) = s.strip_prefix("files/") {
            if name.is_empty() {
                return Err(Error::MalformedTarget(s.to_string()));
            }
            return Ok(Target::File(name.to_string()));
        }
        if s.split('/').any(str::is_empty) {
            return Err(Error::MalformedTarget(s.to_string()));
        }
        Ok(Target::Custom(s.to_string()))
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Metadata => f.write_str("metadata"),
            Target::File(name) => write!(f, "files/{name}"),
            Target::Custom(path) => f.write_str(path),
        }
    }
}

/// The current remote state of the item being edited, as supplied by the
/// caller. The engine only reads it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ItemSnapshot {
    /// Item-level metadata.
    #[serde(default)]
    pub metadata: MetadataMap,
    /// Per-file metadata records; each record carries its `name` key.
    #[serde(default)]
    pub files: Vec<MetadataMap>,
    /// Any other top-level members, kept for custom-target routing.
    #[serde(flatten)]
    pub rest: MetadataMap,
}

impl ItemSnapshot {
    /// The metadata record of the file named `name`, if present.
    pub fn file_metadata(&self, name: &str) -> Option<&MetadataMap> {
        self.files
            .iter()
            .find(|f| f.get("name").and_then(Value::as_str) == Some(name))
    }

    /// Best-effort slice for a custom target path: walk the non-standard
    /// top-level members segment by segment, returning an empty document
    /// as soon as the path leaves known objects.
    fn custom_slice(&self, path: &str) -> MetadataMap {
        let mut segments = path.split('/');
        let first = match segments.next() {
            Some(s) => s,
            None => return MetadataMap::new(),
        };
        let mut current = match self.rest.get(first) {
            Some(v) => v,
            None => return MetadataMap::new(),
        };
        for segment in segments {
            current = match current.as_object().and_then(|o| o.get(segment)) {
                Some(v) => v,
                None => return MetadataMap::new(),
            };
        }
        current.as_object().cloned().unwrap_or_default()
    }
}

/// An edit request: either one target or several, each with its own field
/// map. The two shapes are distinct on purpose; nothing is inferred from
/// the layout of the field map itself.
#[derive(Debug, Clone)]
pub enum MetadataEdit {
    Single {
        target: String,
        fields: MetadataMap,
    },
    Multi {
        /// Field maps keyed by target string, order preserved.
        changes: IndexMap<String, MetadataMap>,
    },
}

/// One computed target/patch pair.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetPatch {
    pub target: String,
    pub patch: Vec<Op>,
}

/// The assembled request payload for the remote metadata-write API.
#[derive(Debug, Clone, PartialEq)]
pub enum PatchPayload {
    Single {
        patch: Vec<Op>,
        target: String,
        priority: i64,
    },
    Multi {
        changes: Vec<TargetPatch>,
        priority: i64,
    },
}

impl PatchPayload {
    /// Serialize to the wire body. The patch and change lists are
    /// JSON-encoded *strings* inside the body, as the remote API expects:
    /// `{"-patch": "...", "-target": "...", "priority": n}` or
    /// `{"-changes": "...", "priority": n}`.
    pub fn to_body(&self) -> Result<Value, Error> {
        match self {
            PatchPayload::Single {
                patch,
                target,
                priority,
            } => {
                let ops: Vec<Value> = patch.iter().map(codec::to_json).collect();
                Ok(json!({
                    "-patch": serde_json::to_string(&ops)?,
                    "-target": target,
                    "priority": priority,
                }))
            }
            PatchPayload::Multi { changes, priority } => {
                let entries: Vec<Value> = changes
                    .iter()
                    .map(|change| {
                        let ops: Vec<Value> = change.patch.iter().map(codec::to_json).collect();
                        json!({"target": change.target, "patch": ops})
                    })
                    .collect();
                Ok(json!({
                    "-changes": serde_json::to_string(&entries)?,
                    "priority": priority,
                }))
            }
        }
    }
}

/// Compute the patch payload for an edit request.
///
/// Resolves each target's source slice from the snapshot, merges the new
/// fields against it, diffs, and packages the result with the task
/// `priority` threaded through untouched.
///
/// # Errors
///
/// [`Error::ItemLocate`] when the `metadata` target is edited without a
/// snapshot; [`Error::MalformedTarget`] for invalid target strings; key
/// and value errors propagate from the merger.
pub fn build_payload(
    edit: &MetadataEdit,
    snapshot: Option<&ItemSnapshot>,
    flags: &EditFlags,
    priority: i64,
) -> Result<PatchPayload, Error> {
    match edit {
        MetadataEdit::Single { target, fields } => {
            let change = patch_for_target(target, fields, snapshot, flags)?;
            Ok(PatchPayload::Single {
                patch: change.patch,
                target: change.target,
                priority,
            })
        }
        MetadataEdit::Multi { changes } => {
            let mut out = Vec::with_capacity(changes.len());
            for (target, fields) in changes {
                out.push(patch_for_target(target, fields, snapshot, flags)?);
            }
            Ok(PatchPayload::Multi {
                changes: out,
                priority,
            })
        }
    }
}

fn patch_for_target(
    target: &str,
    fields: &MetadataMap,
    snapshot: Option<&ItemSnapshot>,
    flags: &EditFlags,
) -> Result<TargetPatch, Error> {
    let parsed = Target::parse(target)?;
    let slice: MetadataMap = match &parsed {
        Target::Metadata => snapshot
            .ok_or_else(|| Error::ItemLocate("metadata".to_string()))?
            .metadata
            .clone(),
        // Editing a not-yet-existing file's metadata is a create.
        Target::File(name) => snapshot
            .and_then(|s| s.file_metadata(name))
            .cloned()
            .unwrap_or_default(),
        Target::Custom(path) => snapshot
            .map(|s| s.custom_slice(path))
            .unwrap_or_default(),
    };
    let dest = merge(fields, &slice, flags)?;
    let patch = generate_patch(&Value::Object(slice), &Value::Object(dest))?;
    Ok(TargetPatch {
        target: parsed.to_string(),
        patch,
    })
}
