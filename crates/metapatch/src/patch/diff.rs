//! Structural diff and patch generation.

use serde_json::{Map, Value};

use crate::normalize::REMOVE_TAG;
use crate::patch::types::Op;
use crate::types::Error;

/// Generate the patch that transforms `source` into `dest`.
///
/// Both documents must be JSON objects ([`Error::InvalidSource`]
/// otherwise). Any destination field or array element still carrying the
/// literal `"REMOVE_TAG"` sentinel is stripped from a working copy first,
/// so deletions surface as `remove` operations rather than as literal
/// sentinel text. Applying the returned operations in order to a clone of
/// `source` yields the stripped destination; equal documents yield the
/// empty patch.
pub fn generate_patch(source: &Value, dest: &Value) -> Result<Vec<Op>, Error> {
    if !source.is_object() {
        return Err(Error::InvalidSource(
            "source document is not an object".to_string(),
        ));
    }
    if !dest.is_object() {
        return Err(Error::InvalidSource(
            "destination document is not an object".to_string(),
        ));
    }
    let mut work = dest.clone();
    strip_removals(&mut work);
    Ok(diff(source, &work))
}

/// Generate a list of operations that transforms `src` into `dst`.
pub fn diff(src: &Value, dst: &Value) -> Vec<Op> {
    let mut ops = Vec::new();
    diff_at_path(&mut ops, &[], src, dst);
    ops
}

fn diff_at_path(ops: &mut Vec<Op>, path: &[String], src: &Value, dst: &Value) {
    if src == dst {
        return;
    }
    match (src, dst) {
        (Value::Object(s), Value::Object(d)) => diff_obj(ops, path, s, d),
        (Value::Array(s), Value::Array(d)) => diff_arr(ops, path, s, d),
        _ => ops.push(Op::Replace {
            path: path.to_vec(),
            value: dst.clone(),
        }),
    }
}

fn diff_obj(ops: &mut Vec<Op>, path: &[String], src: &Map<String, Value>, dst: &Map<String, Value>) {
    // Remove keys in src that are not in dst
    for key in src.keys() {
        if !dst.contains_key(key) {
            let mut p = path.to_vec();
            p.push(key.clone());
            ops.push(Op::Remove { path: p });
        }
    }
    // Add/replace keys in dst
    for (key, dst_val) in dst {
        let mut p = path.to_vec();
        p.push(key.clone());
        match src.get(key) {
            None => ops.push(Op::Add {
                path: p,
                value: dst_val.clone(),
            }),
            Some(src_val) => diff_at_path(ops, &p, src_val, dst_val),
        }
    }
}

fn diff_arr(ops: &mut Vec<Op>, path: &[String], src: &[Value], dst: &[Value]) {
    // Pure deletions get a remove per dropped element, addressed by its
    // source index and emitted in descending order so earlier removes do
    // not shift the positions later ones refer to.
    if dst.len() < src.len() {
        if let Some(removed) = removed_indices(src, dst) {
            for i in removed.iter().rev() {
                let mut p = path.to_vec();
                p.push(i.to_string());
                ops.push(Op::Remove { path: p });
            }
            return;
        }
    }
    let common = src.len().min(dst.len());
    for i in 0..common {
        let mut p = path.to_vec();
        p.push(i.to_string());
        diff_at_path(ops, &p, &src[i], &dst[i]);
    }
    if dst.len() > src.len() {
        for (i, v) in dst.iter().enumerate().skip(src.len()) {
            let mut p = path.to_vec();
            p.push(i.to_string());
            ops.push(Op::Add {
                path: p,
                value: v.clone(),
            });
        }
    } else {
        // Remove from the end to avoid index shifting
        for i in (dst.len()..src.len()).rev() {
            let mut p = path.to_vec();
            p.push(i.to_string());
            ops.push(Op::Remove { path: p });
        }
    }
}

/// If `dst` is `src` with some elements deleted (relative order
/// preserved), return the source indices of the deleted elements.
fn removed_indices(src: &[Value], dst: &[Value]) -> Option<Vec<usize>> {
    let mut out = Vec::with_capacity(src.len() - dst.len());
    let mut d = 0;
    for (i, v) in src.iter().enumerate() {
        if d < dst.len() && *v == dst[d] {
            d += 1;
        } else {
            out.push(i);
        }
    }
    (d == dst.len()).then_some(out)
}

/// Strip sentinel-valued fields and array elements from a working copy.
/// Array elements are dropped by `retain`, preserving the order of the
/// survivors; a field whose value is the sentinel disappears wholesale.
fn strip_removals(doc: &mut Value) {
    if let Value::Object(map) = doc {
        let doomed: Vec<String> = map
            .iter()
            .filter(|(_, v)| v.as_str() == Some(REMOVE_TAG))
            .map(|(k, _)| k.clone())
            .collect();
        for key in doomed {
            map.remove(&key);
        }
        for value in map.values_mut() {
            match value {
                Value::Array(arr) => arr.retain(|v| v.as_str() != Some(REMOVE_TAG)),
                Value::Object(_) => strip_removals(value),
                _ => {}
            }
        }
    }
}
