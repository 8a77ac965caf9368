//! Delta inversion against a base document.
//!
//! A change delta alone cannot be undone — a delete does not remember the
//! text it removed, and an attribute retain does not remember the values it
//! overwrote. Inversion therefore takes the base document delta the change
//! applied to and recovers both from it.

use crate::attributes::invert_attributes;
use crate::{Delta, DeltaOp};

pub(crate) fn invert(change: &Delta, base: &Delta) -> Delta {
    let mut inverted = Delta::new();
    let mut base_pos = 0usize;
    for op in change.ops() {
        match op {
            DeltaOp::Insert { text, .. } => {
                inverted.push(DeltaOp::Delete {
                    len: text.chars().count(),
                });
            }
            DeltaOp::Retain {
                len,
                attributes: None,
            } => {
                inverted.push(DeltaOp::Retain {
                    len: *len,
                    attributes: None,
                });
                base_pos += len;
            }
            DeltaOp::Retain {
                len,
                attributes: Some(attrs),
            } => {
                // Restore the overwritten attribute values run by run, since
                // the base may change attribution inside the retained span.
                for base_op in base.slice(base_pos, base_pos + len).ops() {
                    inverted.push(DeltaOp::Retain {
                        len: base_op.dst_len(),
                        attributes: invert_attributes(Some(attrs), base_op.attributes()),
                    });
                }
                base_pos += len;
            }
            DeltaOp::Delete { len } => {
                // Re-insert the deleted text with its original attribution.
                for base_op in base.slice(base_pos, base_pos + len).ops() {
                    inverted.push(base_op.clone());
                }
                base_pos += len;
            }
        }
    }
    inverted.chop()
}

#[cfg(test)]
mod tests {
    use crate::{Attributes, Delta};
    use serde_json::json;

    fn attrs(v: serde_json::Value) -> Attributes {
        v.as_object().expect("object literal").clone()
    }

    fn roundtrip(base: &Delta, change: &Delta) {
        let applied = base.compose(change).expect("change must compose");
        let undone = applied
            .compose(&change.invert(base))
            .expect("inverse must compose");
        assert_eq!(&undone, base);
    }

    #[test]
    fn invert_insert_is_delete() {
        let base = Delta::new().insert("abc");
        let change = Delta::new().retain(1).insert("XY");
        assert_eq!(change.invert(&base), Delta::new().retain(1).delete(2));
        roundtrip(&base, &change);
    }

    #[test]
    fn invert_delete_restores_text_and_attributes() {
        let base = Delta::new()
            .insert("ab")
            .insert_attr("cd", attrs(json!({"bold": true})));
        let change = Delta::new().retain(1).delete(2);
        assert_eq!(
            change.invert(&base),
            Delta::new()
                .retain(1)
                .insert("b")
                .insert_attr("c", attrs(json!({"bold": true})))
        );
        roundtrip(&base, &change);
    }

    #[test]
    fn invert_attribute_retain_restores_values() {
        let base = Delta::new().insert_attr("ab", attrs(json!({"color": "red"})));
        let change = Delta::new().retain_attr(2, attrs(json!({"color": "blue"})));
        assert_eq!(
            change.invert(&base),
            Delta::new().retain_attr(2, attrs(json!({"color": "red"})))
        );
        roundtrip(&base, &change);
    }

    #[test]
    fn invert_mixed_change_roundtrips() {
        let base = Delta::new()
            .insert("hello ")
            .insert_attr("world", attrs(json!({"bold": true})));
        let change = Delta::new()
            .retain(2)
            .delete(3)
            .insert("LL")
            .retain_attr(2, attrs(json!({"italic": true})));
        roundtrip(&base, &change);
    }
}
