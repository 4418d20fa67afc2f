//! Metadata merging.
//!
//! Combines a caller-supplied map of new field values with the current
//! source snapshot for the same target, producing the destination document
//! the patch generator diffs against. Per-field behavior is selected by
//! [`EditFlags`]; with no flags set an edit is a plain overwrite/create.
//!
//! The merger is pure: inputs are taken by reference and never mutated,
//! the destination is always a fresh document.

use std::collections::HashSet;

use indexmap::IndexMap;
use serde_json::Value;

use crate::normalize::{normalize_scalar, write_for, Write};
use crate::types::{Error, MetadataMap};

/// Edit-mode modifiers. All default to false (plain overwrite).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EditFlags {
    /// Concatenate onto an existing scalar value with a single space.
    pub append: bool,
    /// Add elements to an existing array field, skipping byte-equal
    /// duplicates.
    pub append_list: bool,
    /// Splice into an existing array at the index carried by the flat key
    /// (default 0), then dedupe stable, first occurrence wins.
    pub insert: bool,
}

/// One caller-supplied edit after key decoding and value normalization.
#[derive(Debug)]
enum Entry {
    /// Scalar under a bare name.
    Plain { name: String, write: Write },
    /// Scalar under an explicit `name[idx]` key.
    Indexed {
        name: String,
        idx: usize,
        write: Write,
    },
    /// A whole array value under a bare name. The array is the unit of the
    /// edit: it unions under `append_list`, splices under `insert`, and
    /// overwrites the field otherwise. Only explicit `name[idx]` keys get
    /// positional writes.
    List { name: String, items: Vec<Write> },
}

/// Merge new field values into the source document.
///
/// Resolution order per supplied key, first match wins:
/// 1. explicitly indexed key, `insert` off — positional write into the
///    field's array, extending with placeholders that are dropped if never
///    filled;
/// 2. `append_list` and the source has a value — union without
///    duplicating existing elements;
/// 3. `append` and the source holds a scalar — `"{source} {new}"`;
/// 4. `insert` and the source has a value — splice at the carried index
///    (default 0), then stable dedup;
/// 5. otherwise — plain overwrite/create.
///
/// A value equal to `"REMOVE_TAG"` deletes the addressed field or array
/// element instead; indexed deletions are applied per field in descending
/// index order so one removal cannot shift the position a later removal
/// refers to. Source fields not mentioned in the edit pass through
/// unchanged.
pub fn merge(
    fields: &MetadataMap,
    source: &MetadataMap,
    flags: &EditFlags,
) -> Result<MetadataMap, Error> {
    let entries = normalize_entries(fields)?;
    let mut dest = source.clone();

    // (field, indices) pending element deletions, applied last.
    let mut element_removals: IndexMap<String, Vec<usize>> = IndexMap::new();
    let mut field_removals: Vec<String> = Vec::new();

    // Indexed entries, grouped per base field in supplied order.
    let mut groups: IndexMap<&str, Vec<(usize, &Write)>> = IndexMap::new();
    for entry in &entries {
        if let Entry::Indexed { name, idx, write } = entry {
            groups.entry(name.as_str()).or_default().push((*idx, write));
        }
    }

    for (name, writes) in &groups {
        if flags.insert && source.contains_key(*name) {
            let mut arr = coerce_array(dest.get(*name));
            // Deletion indices name source positions; apply them before
            // any splice shifts the array.
            let mut doomed: Vec<usize> = writes
                .iter()
                .filter_map(|(idx, write)| matches!(write, Write::Delete).then_some(*idx))
                .collect();
            doomed.sort_unstable();
            doomed.dedup();
            for idx in doomed.iter().rev() {
                if *idx < arr.len() {
                    arr.remove(*idx);
                }
            }
            // Splice each new value in, then dedupe.
            for (idx, write) in writes {
                if let Write::Set(s) = write {
                    let at = (*idx).min(arr.len());
                    arr.insert(at, Value::String(s.clone()));
                }
            }
            dedupe_stable(&mut arr);
            if arr.is_empty() {
                dest.remove(*name);
            } else {
                dest.insert((*name).to_string(), Value::Array(arr));
            }
        } else {
            // Positional writes. The working array starts from the source
            // value (scalar coerced to one element, absent to empty) and is
            // extended with empty placeholders up to the highest supplied
            // index; placeholders never filled are dropped afterwards.
            let mut arr = coerce_array(dest.get(*name));
            let src_len = arr.len();
            let mut filled: HashSet<usize> = HashSet::new();
            for (idx, write) in writes {
                match write {
                    Write::Set(s) => {
                        if *idx >= arr.len() {
                            arr.resize(idx + 1, Value::String(String::new()));
                        }
                        arr[*idx] = Value::String(s.clone());
                        filled.insert(*idx);
                    }
                    Write::Delete => {
                        element_removals
                            .entry((*name).to_string())
                            .or_default()
                            .push(*idx);
                    }
                }
            }
            let mut p = arr.len();
            while p > src_len {
                p -= 1;
                if !filled.contains(&p) {
                    arr.remove(p);
                }
            }
            dest.insert((*name).to_string(), Value::Array(arr));
        }
    }

    // Unindexed entries, in supplied order.
    for entry in &entries {
        match entry {
            Entry::Indexed { .. } => {}
            Entry::Plain { name, write } => match write {
                Write::Delete => field_removals.push(name.clone()),
                Write::Set(s) => {
                    let new = Value::String(s.clone());
                    if flags.append_list && source.contains_key(name) {
                        let mut arr = coerce_array(dest.get(name));
                        if !arr.contains(&new) {
                            arr.push(new);
                        }
                        dest.insert(name.clone(), Value::Array(arr));
                    } else if flags.append && has_scalar(source, name) {
                        let base = normalize_scalar(&source[name])
                            .map_err(|_| Error::UnsupportedValue(name.clone()))?;
                        dest.insert(name.clone(), Value::String(format!("{base} {s}")));
                    } else if flags.insert && source.contains_key(name) {
                        let mut arr = coerce_array(dest.get(name));
                        arr.insert(0, new);
                        dedupe_stable(&mut arr);
                        dest.insert(name.clone(), Value::Array(arr));
                    } else {
                        dest.insert(name.clone(), new);
                    }
                }
            },
            Entry::List { name, items } => {
                if flags.append_list && source.contains_key(name) {
                    let mut arr = coerce_array(dest.get(name));
                    for write in items {
                        // A sentinel inside a union list is skipped: the
                        // union has no positional identity to delete.
                        if let Write::Set(s) = write {
                            let v = Value::String(s.clone());
                            if !arr.contains(&v) {
                                arr.push(v);
                            }
                        }
                    }
                    dest.insert(name.clone(), Value::Array(arr));
                } else if flags.insert && source.contains_key(name) {
                    let mut arr = coerce_array(dest.get(name));
                    let mut at = 0;
                    for write in items {
                        if let Write::Set(s) = write {
                            arr.insert(at.min(arr.len()), Value::String(s.clone()));
                            at += 1;
                        }
                    }
                    dedupe_stable(&mut arr);
                    dest.insert(name.clone(), Value::Array(arr));
                } else {
                    let vals: Vec<Value> = items
                        .iter()
                        .filter_map(|w| match w {
                            Write::Set(s) => Some(Value::String(s.clone())),
                            Write::Delete => None,
                        })
                        .collect();
                    if vals.is_empty() {
                        field_removals.push(name.clone());
                    } else {
                        dest.insert(name.clone(), Value::Array(vals));
                    }
                }
            }
        }
    }

    // Deletions last: whole fields, then array elements in descending
    // index order per field.
    for name in field_removals {
        dest.remove(&name);
    }
    for (name, mut idxs) in element_removals {
        if let Some(Value::Array(arr)) = dest.get_mut(&name) {
            idxs.sort_unstable();
            idxs.dedup();
            for idx in idxs.iter().rev() {
                if *idx < arr.len() {
                    arr.remove(*idx);
                }
            }
            if arr.is_empty() {
                dest.remove(&name);
            }
        }
    }

    Ok(dest)
}

fn normalize_entries(fields: &MetadataMap) -> Result<Vec<Entry>, Error> {
    let mut entries = Vec::with_capacity(fields.len());
    for (key, value) in fields {
        let (name, idx) = metapatch_flatkey::decode(key)?;
        match value {
            // "No edit requested" for this field.
            Value::Null => continue,
            Value::Array(items) => {
                if idx.is_some() {
                    return Err(Error::UnsupportedValue(key.clone()));
                }
                let mut writes = Vec::with_capacity(items.len());
                for (i, item) in items.iter().enumerate() {
                    writes.push(write_for(&metapatch_flatkey::encode(&name, Some(i)), item)?);
                }
                entries.push(Entry::List {
                    name,
                    items: writes,
                });
            }
            scalar => {
                let write = write_for(key, scalar)?;
                match idx {
                    Some(idx) => entries.push(Entry::Indexed { name, idx, write }),
                    None => entries.push(Entry::Plain { name, write }),
                }
            }
        }
    }
    Ok(entries)
}

/// Coerce a source value into a working array: absent and `null` become
/// empty, a scalar becomes a one-element array.
fn coerce_array(value: Option<&Value>) -> Vec<Value> {
    match value {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items.clone(),
        Some(scalar) => vec![scalar.clone()],
    }
}

fn has_scalar(map: &MetadataMap, name: &str) -> bool {
    matches!(
        map.get(name),
        Some(Value::String(_)) | Some(Value::Number(_)) | Some(Value::Bool(_))
    )
}

/// Stable dedup, first occurrence wins.
fn dedupe_stable(arr: &mut Vec<Value>) {
    let mut seen: HashSet<String> = HashSet::new();
    arr.retain(|v| seen.insert(serde_json::to_string(v).unwrap_or_default()));
}
