//! JSON wire codec for patch operations (RFC 6902 shape).
//!
//! `value` is omitted for `remove`; paths are JSON Pointer strings with
//! `~0`/`~1` escaping.

use serde_json::{json, Value};

use crate::patch::types::Op;
use crate::patch::{format_pointer, parse_pointer};
use crate::types::Error;

/// Serialize an operation to its wire value.
pub fn to_json(op: &Op) -> Value {
    match op {
        Op::Add { path, value } => json!({
            "op": "add",
            "path": format_pointer(path),
            "value": value
        }),
        Op::Remove { path } => json!({
            "op": "remove",
            "path": format_pointer(path)
        }),
        Op::Replace { path, value } => json!({
            "op": "replace",
            "path": format_pointer(path),
            "value": value
        }),
        Op::Test { path, value } => json!({
            "op": "test",
            "path": format_pointer(path),
            "value": value
        }),
        Op::Move { path, from } => json!({
            "op": "move",
            "path": format_pointer(path),
            "from": format_pointer(from)
        }),
        Op::Copy { path, from } => json!({
            "op": "copy",
            "path": format_pointer(path),
            "from": format_pointer(from)
        }),
    }
}

/// Decode a wire value back into an operation.
pub fn from_json(value: &Value) -> Result<Op, Error> {
    let obj = value
        .as_object()
        .ok_or_else(|| Error::InvalidOp("operation must be an object".to_string()))?;
    let op = obj
        .get("op")
        .and_then(Value::as_str)
        .ok_or_else(|| Error::InvalidOp("missing op".to_string()))?;
    let path = parse_pointer(
        obj.get("path")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::InvalidOp("missing path".to_string()))?,
    );
    let required_value = || {
        obj.get("value")
            .cloned()
            .ok_or_else(|| Error::InvalidOp(format!("{op} requires a value")))
    };
    let required_from = || {
        obj.get("from")
            .and_then(Value::as_str)
            .map(parse_pointer)
            .ok_or_else(|| Error::InvalidOp(format!("{op} requires a from path")))
    };
    match op {
        "add" => Ok(Op::Add {
            path,
            value: required_value()?,
        }),
        "remove" => Ok(Op::Remove { path }),
        "replace" => Ok(Op::Replace {
            path,
            value: required_value()?,
        }),
        "test" => Ok(Op::Test {
            path,
            value: required_value()?,
        }),
        "move" => Ok(Op::Move {
            path,
            from: required_from()?,
        }),
        "copy" => Ok(Op::Copy {
            path,
            from: required_from()?,
        }),
        other => Err(Error::InvalidOp(format!("unknown op: {other}"))),
    }
}
