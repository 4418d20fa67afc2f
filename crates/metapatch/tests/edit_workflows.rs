//! End-to-end edit workflows: snapshot in, wire payload out.

use indexmap::IndexMap;
use metapatch::{
    apply_patch, build_payload, merge, EditFlags, ItemSnapshot, MetadataEdit, MetadataMap,
    PatchPayload,
};
use serde_json::{json, Value};

fn map(v: Value) -> MetadataMap {
    v.as_object().unwrap().clone()
}

fn snapshot() -> ItemSnapshot {
    serde_json::from_value(json!({
        "metadata": {
            "identifier": "example-item",
            "title": "Hello",
            "description": "Hello",
            "subject": ["a", "b", "c"],
            "creator": ["A", "B"]
        },
        "files": [
            {"name": "item.pdf", "format": "PDF"}
        ]
    }))
    .unwrap()
}

#[test]
fn sentinel_deletion_workflow() {
    let snap = snapshot();
    let edit = MetadataEdit::Single {
        target: "metadata".to_string(),
        fields: map(json!({"subject[1]": "REMOVE_TAG"})),
    };
    let payload = build_payload(&edit, Some(&snap), &EditFlags::default(), 0).unwrap();
    let PatchPayload::Single { patch, .. } = &payload else {
        panic!("expected single payload");
    };

    // The patch deletes the element outright; no placeholder, no literal
    // sentinel text anywhere in the operations.
    let ops: Vec<Value> = {
        let body = payload.to_body().unwrap();
        serde_json::from_str(body["-patch"].as_str().unwrap()).unwrap()
    };
    assert!(ops
        .iter()
        .any(|op| op["op"] == "remove" && op["path"] == "/subject/1"));
    assert!(!ops.iter().any(|op| op["value"] == "REMOVE_TAG"));

    let result = apply_patch(&Value::Object(snap.metadata.clone()), patch).unwrap();
    assert_eq!(result["subject"], json!(["a", "c"]));
}

#[test]
fn append_workflow() {
    let snap = snapshot();
    let edit = MetadataEdit::Single {
        target: "metadata".to_string(),
        fields: map(json!({"description": "World"})),
    };
    let flags = EditFlags {
        append: true,
        ..Default::default()
    };
    let payload = build_payload(&edit, Some(&snap), &flags, 0).unwrap();
    let PatchPayload::Single { patch, .. } = payload else {
        panic!("expected single payload");
    };
    let result = apply_patch(&Value::Object(snap.metadata.clone()), &patch).unwrap();
    assert_eq!(result["description"], json!("Hello World"));
}

#[test]
fn insert_workflow() {
    let snap = snapshot();
    let edit = MetadataEdit::Single {
        target: "metadata".to_string(),
        fields: map(json!({"creator[0]": "Z"})),
    };
    let flags = EditFlags {
        insert: true,
        ..Default::default()
    };
    let payload = build_payload(&edit, Some(&snap), &flags, 0).unwrap();
    let PatchPayload::Single { patch, .. } = payload else {
        panic!("expected single payload");
    };
    let result = apply_patch(&Value::Object(snap.metadata.clone()), &patch).unwrap();
    assert_eq!(result["creator"], json!(["Z", "A", "B"]));
}

#[test]
fn multi_target_workflow() {
    let snap = snapshot();
    let mut changes = IndexMap::new();
    changes.insert("metadata".to_string(), map(json!({"title": "Renamed"})));
    changes.insert(
        "files/new.txt".to_string(),
        map(json!({"title": "Transcript"})),
    );
    let edit = MetadataEdit::Multi { changes };
    let payload = build_payload(&edit, Some(&snap), &EditFlags::default(), 7).unwrap();

    let body = payload.to_body().unwrap();
    assert_eq!(body["priority"], 7);
    let entries: Value = serde_json::from_str(body["-changes"].as_str().unwrap()).unwrap();
    let entries = entries.as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["target"], "metadata");
    assert_eq!(entries[1]["target"], "files/new.txt");
}

#[test]
fn edit_equal_to_source_is_a_noop() {
    let snap = snapshot();
    let edit = MetadataEdit::Single {
        target: "metadata".to_string(),
        fields: snap.metadata.clone(),
    };
    let payload = build_payload(&edit, Some(&snap), &EditFlags::default(), 0).unwrap();
    let PatchPayload::Single { patch, .. } = payload else {
        panic!("expected single payload");
    };
    assert!(patch.is_empty());
}

#[test]
fn merge_then_build_agree() {
    // The payload's patch reproduces exactly what merge computes.
    let snap = snapshot();
    let fields = map(json!({
        "title": "Changed",
        "subject[0]": "zero",
        "subject[2]": "REMOVE_TAG",
        "newfield": ["x", "y"]
    }));
    let dest = merge(&fields, &snap.metadata, &EditFlags::default()).unwrap();

    let edit = MetadataEdit::Single {
        target: "metadata".to_string(),
        fields,
    };
    let payload = build_payload(&edit, Some(&snap), &EditFlags::default(), 0).unwrap();
    let PatchPayload::Single { patch, .. } = payload else {
        panic!("expected single payload");
    };
    let result = apply_patch(&Value::Object(snap.metadata.clone()), &patch).unwrap();
    assert_eq!(result, Value::Object(dest));
}
