//! Delta composition.
//!
//! `compose(a, b)` walks both operation lists in lock-step, carrying a
//! remainder when one side's current operation outlives the other's. The
//! result is a single delta equivalent to applying `a` then `b`.
//!
//! When `a` is a document delta (insert-only), `b` may not consume more
//! content than the document holds — that is `LengthMismatch`. Between two
//! change deltas composition is total:
//! operations reaching past `a`'s explicit output address the implicitly
//! retained tail of the underlying document and pass through.

use crate::attributes::compose_attributes;
use crate::{Delta, DeltaError, DeltaOp};

pub(crate) fn compose(a: &Delta, b: &Delta) -> Result<Delta, DeltaError> {
    if a.base_length() == 0 && b.base_length() > a.length() {
        return Err(DeltaError::LengthMismatch {
            requested: b.base_length(),
            available: a.length(),
        });
    }

    let mut result = Delta::new();
    let mut iter_a = a.ops().iter().cloned();
    let mut iter_b = b.ops().iter().cloned();
    let mut rem_a: Option<DeltaOp> = None;
    let mut rem_b: Option<DeltaOp> = None;

    loop {
        let op_a = rem_a.take().or_else(|| iter_a.next());
        let op_b = rem_b.take().or_else(|| iter_b.next());
        match (op_a, op_b) {
            (None, None) => break,
            // Leftovers on either side address implicitly retained content.
            (Some(op), None) => result.push(op),
            (None, Some(op)) => result.push(op),
            (Some(op_a), Some(op_b)) => match (op_a, op_b) {
                // Deletes in `a` remove text `b` never sees.
                (del @ DeltaOp::Delete { .. }, op_b) => {
                    result.push(del);
                    rem_b = Some(op_b);
                }
                // Inserts in `b` land after `a`'s output at this point.
                (op_a, ins @ DeltaOp::Insert { .. }) => {
                    result.push(ins);
                    rem_a = Some(op_a);
                }
                (
                    DeltaOp::Insert {
                        text,
                        attributes: attrs_a,
                    },
                    DeltaOp::Retain {
                        len,
                        attributes: attrs_b,
                    },
                ) => {
                    let text_len = text.chars().count();
                    let take = text_len.min(len);
                    let kept: String = text.chars().take(take).collect();
                    result.push(DeltaOp::Insert {
                        text: kept,
                        attributes: compose_attributes(attrs_a.as_ref(), attrs_b.as_ref(), false),
                    });
                    if text_len > take {
                        rem_a = Some(DeltaOp::Insert {
                            text: text.chars().skip(take).collect(),
                            attributes: attrs_a,
                        });
                    } else if len > take {
                        rem_b = Some(DeltaOp::Retain {
                            len: len - take,
                            attributes: attrs_b,
                        });
                    }
                }
                (
                    DeltaOp::Insert {
                        text,
                        attributes: attrs_a,
                    },
                    DeltaOp::Delete { len },
                ) => {
                    // Inserted-then-deleted text cancels out entirely.
                    let text_len = text.chars().count();
                    let take = text_len.min(len);
                    if text_len > take {
                        rem_a = Some(DeltaOp::Insert {
                            text: text.chars().skip(take).collect(),
                            attributes: attrs_a,
                        });
                    } else if len > take {
                        rem_b = Some(DeltaOp::Delete { len: len - take });
                    }
                }
                (
                    DeltaOp::Retain {
                        len: len_a,
                        attributes: attrs_a,
                    },
                    DeltaOp::Retain {
                        len: len_b,
                        attributes: attrs_b,
                    },
                ) => {
                    let take = len_a.min(len_b);
                    result.push(DeltaOp::Retain {
                        len: take,
                        attributes: compose_attributes(attrs_a.as_ref(), attrs_b.as_ref(), true),
                    });
                    if len_a > take {
                        rem_a = Some(DeltaOp::Retain {
                            len: len_a - take,
                            attributes: attrs_a,
                        });
                    } else if len_b > take {
                        rem_b = Some(DeltaOp::Retain {
                            len: len_b - take,
                            attributes: attrs_b,
                        });
                    }
                }
                (
                    DeltaOp::Retain {
                        len: len_a,
                        attributes: attrs_a,
                    },
                    DeltaOp::Delete { len: len_b },
                ) => {
                    let take = len_a.min(len_b);
                    result.push(DeltaOp::Delete { len: take });
                    if len_a > take {
                        rem_a = Some(DeltaOp::Retain {
                            len: len_a - take,
                            attributes: attrs_a,
                        });
                    } else if len_b > take {
                        rem_b = Some(DeltaOp::Delete { len: len_b - take });
                    }
                }
            },
        }
    }
    Ok(result.chop())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Attributes;
    use serde_json::json;

    fn attrs(v: serde_json::Value) -> Attributes {
        v.as_object().expect("object literal").clone()
    }

    #[test]
    fn compose_insert_into_document() {
        let doc = Delta::new().insert("ab");
        let change = Delta::new().retain(1).insert("X");
        assert_eq!(doc.compose(&change).unwrap(), Delta::new().insert("aXb"));
    }

    #[test]
    fn compose_insert_then_delete_cancels() {
        let a = Delta::new().insert("X");
        let b = Delta::new().delete(1);
        assert!(a.compose(&b).unwrap().is_empty());
    }

    #[test]
    fn compose_merges_adjacent_same_attribute_inserts() {
        let a = Delta::new().insert("ab");
        let b = Delta::new().retain(2).insert("cd");
        let composed = a.compose(&b).unwrap();
        assert_eq!(composed.ops().len(), 1);
        assert_eq!(composed, Delta::new().insert("abcd"));
    }

    #[test]
    fn compose_retain_reattributes_insert() {
        let a = Delta::new().insert("abc");
        let b = Delta::new().retain_attr(2, attrs(json!({"bold": true})));
        assert_eq!(
            a.compose(&b).unwrap(),
            Delta::new()
                .insert_attr("ab", attrs(json!({"bold": true})))
                .insert("c")
        );
    }

    #[test]
    fn compose_null_attribute_removes_key() {
        let a = Delta::new().insert_attr("ab", attrs(json!({"bold": true})));
        let b = Delta::new().retain_attr(2, attrs(json!({"bold": null})));
        assert_eq!(a.compose(&b).unwrap(), Delta::new().insert("ab"));
    }

    #[test]
    fn compose_retain_over_retain_keeps_null() {
        let a = Delta::new().retain_attr(2, attrs(json!({"bold": true})));
        let b = Delta::new().retain_attr(2, attrs(json!({"bold": null})));
        let composed = a.compose(&b).unwrap();
        assert_eq!(
            composed,
            Delta::new().retain_attr(2, attrs(json!({"bold": null})))
        );
    }

    #[test]
    fn compose_overlong_delete_is_length_mismatch() {
        let doc = Delta::new().insert("abc");
        let change = Delta::new().delete(5);
        assert_eq!(
            doc.compose(&change),
            Err(DeltaError::LengthMismatch {
                requested: 5,
                available: 3
            })
        );
    }

    #[test]
    fn compose_overlong_retain_on_document_is_length_mismatch() {
        let doc = Delta::new().insert("abc");
        let change = Delta::new().retain(2).retain_attr(2, attrs(json!({"bold": true})));
        assert!(matches!(
            doc.compose(&change),
            Err(DeltaError::LengthMismatch { .. })
        ));
    }

    #[test]
    fn compose_between_changes_passes_tail_operations_through() {
        // `a` only touches the first codepoint of some larger document; `b`
        // reaches past `a`'s explicit output into the implicitly retained
        // tail.
        let a = Delta::new().retain_attr(1, attrs(json!({"bold": true})));
        let b = Delta::new().retain(1).delete(2);
        assert_eq!(
            a.compose(&b).unwrap(),
            Delta::new()
                .retain_attr(1, attrs(json!({"bold": true})))
                .delete(2)
        );
    }

    #[test]
    fn compose_empty_deltas_is_noop() {
        let doc = Delta::new().insert("abc");
        assert_eq!(doc.compose(&Delta::new()).unwrap(), doc);
        assert_eq!(Delta::new().compose(&Delta::new()).unwrap(), Delta::new());
    }

    #[test]
    fn compose_trims_trailing_retain() {
        let a = Delta::new().insert("abc");
        let b = Delta::new().retain(3);
        assert_eq!(a.compose(&b).unwrap(), a);
    }
}
