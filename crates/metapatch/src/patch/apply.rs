//! In-memory application of patch operations.
//!
//! Used to verify the generator's round-trip guarantee; callers can also
//! apply a computed patch to a local snapshot to preview the result.

use serde_json::Value;

use crate::patch::format_pointer;
use crate::patch::types::Op;
use crate::types::Error;

/// Apply a full patch to a clone of `doc`, in order.
pub fn apply_patch(doc: &Value, ops: &[Op]) -> Result<Value, Error> {
    let mut out = doc.clone();
    for op in ops {
        apply_op(&mut out, op)?;
    }
    Ok(out)
}

/// Apply a single operation in place.
pub fn apply_op(doc: &mut Value, op: &Op) -> Result<(), Error> {
    match op {
        Op::Add { path, value } => apply_add(doc, path, value.clone()),
        Op::Remove { path } => apply_remove(doc, path).map(|_| ()),
        Op::Replace { path, value } => apply_replace(doc, path, value.clone()),
        Op::Test { path, value } => {
            let actual = get_at(doc, path)
                .ok_or_else(|| Error::Apply(not_found(path)))?;
            if actual == value {
                Ok(())
            } else {
                Err(Error::Apply(format!("test failed at {}", format_pointer(path))))
            }
        }
        Op::Move { path, from } => {
            if path.len() >= from.len() && path[..from.len()] == from[..] {
                return Err(Error::Apply(format!(
                    "cannot move {} into itself",
                    format_pointer(from)
                )));
            }
            let value = apply_remove(doc, from)?;
            apply_add(doc, path, value)
        }
        Op::Copy { path, from } => {
            let value = get_at(doc, from)
                .ok_or_else(|| Error::Apply(not_found(from)))?
                .clone();
            apply_add(doc, path, value)
        }
    }
}

fn not_found(path: &[String]) -> String {
    format!("no value at {}", format_pointer(path))
}

fn get_at<'a>(doc: &'a Value, path: &[String]) -> Option<&'a Value> {
    doc.pointer(&format_pointer(path))
}

fn get_mut_at<'a>(doc: &'a mut Value, path: &[String]) -> Result<&'a mut Value, Error> {
    let ptr = format_pointer(path);
    doc.pointer_mut(&ptr)
        .ok_or_else(|| Error::Apply(format!("no value at {ptr}")))
}

fn apply_add(doc: &mut Value, path: &[String], value: Value) -> Result<(), Error> {
    if path.is_empty() {
        *doc = value;
        return Ok(());
    }
    let (parent_path, key) = path.split_at(path.len() - 1);
    let key = &key[0];
    let parent = get_mut_at(doc, parent_path)?;
    match parent {
        Value::Object(map) => {
            map.insert(key.clone(), value);
            Ok(())
        }
        Value::Array(arr) => {
            if key == "-" {
                arr.push(value);
                Ok(())
            } else {
                let idx: usize = key
                    .parse()
                    .map_err(|_| Error::Apply(format!("invalid index {key}")))?;
                if idx > arr.len() {
                    return Err(Error::Apply(format!("index {idx} out of bounds")));
                }
                arr.insert(idx, value);
                Ok(())
            }
        }
        _ => Err(Error::Apply(not_found(path))),
    }
}

fn apply_remove(doc: &mut Value, path: &[String]) -> Result<Value, Error> {
    if path.is_empty() {
        return Err(Error::Apply("cannot remove the root".to_string()));
    }
    let (parent_path, key) = path.split_at(path.len() - 1);
    let key = &key[0];
    let parent = get_mut_at(doc, parent_path)?;
    match parent {
        Value::Object(map) => map
            .remove(key)
            .ok_or_else(|| Error::Apply(not_found(path))),
        Value::Array(arr) => {
            let idx: usize = key
                .parse()
                .map_err(|_| Error::Apply(format!("invalid index {key}")))?;
            if idx >= arr.len() {
                return Err(Error::Apply(format!("index {idx} out of bounds")));
            }
            Ok(arr.remove(idx))
        }
        _ => Err(Error::Apply(not_found(path))),
    }
}

fn apply_replace(doc: &mut Value, path: &[String], value: Value) -> Result<(), Error> {
    if path.is_empty() {
        *doc = value;
        return Ok(());
    }
    let target = get_mut_at(doc, path)?;
    *target = value;
    Ok(())
}
