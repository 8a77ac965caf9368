//! JSON serialization of the node tree.
//!
//! Each node serializes as `{"type", "attributes", "children"}`; a
//! text-bearing node's delta rides inside `attributes.delta` in the delta
//! JSON array form. Round-tripping preserves type, attribute order,
//! children order, and delta content.
//!
//! The decoder is strict and fails before constructing any tree, so a
//! half-decoded document can never exist.

use blockdoc_delta::{Delta, DeltaError};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::blocks::keys;
use crate::Node;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CodecError {
    #[error("node must be a json object")]
    NotAnObject,
    #[error("node requires a string 'type'")]
    MissingType,
    #[error("'attributes' must be a json object")]
    BadAttributes,
    #[error("'children' must be a json array")]
    BadChildren,
    #[error(transparent)]
    Delta(#[from] DeltaError),
}

/// Serializes `node` (and its subtree) to the interchange JSON form.
pub fn node_to_json(node: &Node) -> Value {
    let mut obj = Map::new();
    obj.insert(
        "type".to_string(),
        Value::String(node.node_type().to_string()),
    );
    let mut attributes = node.attributes().clone();
    if let Some(delta) = node.delta() {
        attributes.insert(keys::DELTA.to_string(), delta.to_json());
    }
    if !attributes.is_empty() {
        obj.insert("attributes".to_string(), Value::Object(attributes));
    }
    if !node.children().is_empty() {
        obj.insert(
            "children".to_string(),
            Value::Array(node.children().iter().map(node_to_json).collect()),
        );
    }
    Value::Object(obj)
}

/// Parses the interchange JSON form back into a node tree.
pub fn node_from_json(value: &Value) -> Result<Node, CodecError> {
    let obj = value.as_object().ok_or(CodecError::NotAnObject)?;
    let node_type = obj
        .get("type")
        .and_then(Value::as_str)
        .ok_or(CodecError::MissingType)?;

    let mut node = Node::new(node_type);

    match obj.get("attributes") {
        None => {}
        Some(Value::Object(attributes)) => {
            let mut attributes = attributes.clone();
            if let Some(delta_json) = attributes.shift_remove(keys::DELTA) {
                node = node.with_delta(Delta::from_json(&delta_json)?);
            }
            node = node.with_attributes(attributes);
        }
        Some(_) => return Err(CodecError::BadAttributes),
    }

    match obj.get("children") {
        None => {}
        Some(Value::Array(children)) => {
            let children = children
                .iter()
                .map(node_from_json)
                .collect::<Result<Vec<_>, _>>()?;
            node = node.with_children(children);
        }
        Some(_) => return Err(CodecError::BadChildren),
    }

    Ok(node)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blocks;
    use blockdoc_delta::Delta;
    use serde_json::json;

    #[test]
    fn serialized_shape_matches_interface_contract() {
        let node = blocks::heading(2, Delta::new().insert("Title"));
        assert_eq!(
            node_to_json(&node),
            json!({
                "type": "heading",
                "attributes": {
                    "level": 2,
                    "delta": [{"insert": "Title"}],
                },
            })
        );
    }

    #[test]
    fn roundtrip_preserves_structure() {
        let tree = blocks::document(vec![
            blocks::paragraph(Delta::new().insert("hello")),
            blocks::divider(),
            blocks::table(2, 2),
        ]);
        let decoded = node_from_json(&node_to_json(&tree)).expect("roundtrip must decode");
        assert_eq!(decoded, tree);
    }

    #[test]
    fn rejects_missing_type() {
        assert_eq!(
            node_from_json(&json!({"attributes": {}})),
            Err(CodecError::MissingType)
        );
    }

    #[test]
    fn rejects_malformed_delta_before_building_tree() {
        let bad = json!({
            "type": "paragraph",
            "attributes": {"delta": [{"retain": "three"}]},
        });
        assert!(matches!(node_from_json(&bad), Err(CodecError::Delta(_))));
    }

    #[test]
    fn rejects_non_array_children() {
        let bad = json!({"type": "document", "children": {}});
        assert_eq!(node_from_json(&bad), Err(CodecError::BadChildren));
    }
}
