//! JSON form of a delta: `[{"insert": …} | {"retain": …} | {"delete": …}]`.
//!
//! The decoder is strict: anything that is not exactly the documented shape
//! is rejected with `DeltaError::Codec` before any delta is constructed.

use serde_json::{Map, Value};

use crate::{Delta, DeltaError, DeltaOp};

pub(crate) fn to_json(delta: &Delta) -> Value {
    let mut out = Vec::with_capacity(delta.ops().len());
    for op in delta.ops() {
        let mut obj = Map::new();
        match op {
            DeltaOp::Insert { text, attributes } => {
                obj.insert("insert".to_string(), Value::String(text.clone()));
                if let Some(attrs) = attributes {
                    obj.insert("attributes".to_string(), Value::Object(attrs.clone()));
                }
            }
            DeltaOp::Retain { len, attributes } => {
                obj.insert("retain".to_string(), Value::from(*len as u64));
                if let Some(attrs) = attributes {
                    obj.insert("attributes".to_string(), Value::Object(attrs.clone()));
                }
            }
            DeltaOp::Delete { len } => {
                obj.insert("delete".to_string(), Value::from(*len as u64));
            }
        }
        out.push(Value::Object(obj));
    }
    Value::Array(out)
}

pub(crate) fn from_json(value: &Value) -> Result<Delta, DeltaError> {
    let items = value
        .as_array()
        .ok_or_else(|| DeltaError::Codec("delta must be an array".to_string()))?;
    let mut delta = Delta::new();
    for item in items {
        let obj = item
            .as_object()
            .ok_or_else(|| DeltaError::Codec("delta op must be an object".to_string()))?;
        let attributes = match obj.get("attributes") {
            None => None,
            Some(Value::Object(map)) => Some(map.clone()),
            Some(_) => {
                return Err(DeltaError::Codec(
                    "attributes must be an object".to_string(),
                ))
            }
        };
        let kind_keys = ["insert", "retain", "delete"]
            .iter()
            .filter(|k| obj.contains_key(**k))
            .count();
        if kind_keys != 1 {
            return Err(DeltaError::Codec(
                "delta op must have exactly one of insert/retain/delete".to_string(),
            ));
        }
        if let Some(v) = obj.get("insert") {
            let text = v
                .as_str()
                .ok_or_else(|| DeltaError::Codec("insert must be a string".to_string()))?;
            delta.push(DeltaOp::Insert {
                text: text.to_string(),
                attributes,
            });
        } else if let Some(v) = obj.get("retain") {
            let len = op_length(v, "retain")?;
            delta.push(DeltaOp::Retain { len, attributes });
        } else if let Some(v) = obj.get("delete") {
            if attributes.is_some() {
                return Err(DeltaError::Codec(
                    "delete must not carry attributes".to_string(),
                ));
            }
            let len = op_length(v, "delete")?;
            delta.push(DeltaOp::Delete { len });
        }
    }
    Ok(delta)
}

fn op_length(value: &Value, kind: &str) -> Result<usize, DeltaError> {
    value
        .as_u64()
        .filter(|n| *n > 0)
        .map(|n| n as usize)
        .ok_or_else(|| DeltaError::Codec(format!("{kind} must be a positive integer")))
}
