//! Patch operation types.

use serde_json::Value;

/// A parsed operation path: one step per object key or array index.
pub type Path = Vec<String>;

/// A patch operation (RFC 6902 subset).
///
/// The generator emits `add`, `remove`, and `replace`; `test`, `move`,
/// and `copy` are accepted on the wire and by [`crate::patch::apply`].
#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    Add { path: Path, value: Value },
    Remove { path: Path },
    Replace { path: Path, value: Value },
    Test { path: Path, value: Value },
    Move { path: Path, from: Path },
    Copy { path: Path, from: Path },
}

impl Op {
    /// The operation name as it appears on the wire.
    pub fn op_name(&self) -> &'static str {
        match self {
            Op::Add { .. } => "add",
            Op::Remove { .. } => "remove",
            Op::Replace { .. } => "replace",
            Op::Test { .. } => "test",
            Op::Move { .. } => "move",
            Op::Copy { .. } => "copy",
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            Op::Add { path, .. } => path,
            Op::Remove { path } => path,
            Op::Replace { path, .. } => path,
            Op::Test { path, .. } => path,
            Op::Move { path, .. } => path,
            Op::Copy { path, .. } => path,
        }
    }
}
