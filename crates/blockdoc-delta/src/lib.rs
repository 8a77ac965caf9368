//! Rich-text delta operations.
//!
//! A [`Delta`] is an ordered run of text operations — insert, retain, delete —
//! describing either a document's rich-text content (insert-only) or a change
//! to it. Retains and inserts may carry an attribute map (bold, link, …).
//!
//! Lengths are counted in Unicode codepoints (`char`), engine-wide, so a
//! surrogate pair never splits across two operations.
//!
//! # Example
//!
//! ```
//! use blockdoc_delta::Delta;
//!
//! let doc = Delta::new().insert("ab");
//! let change = Delta::new().retain(1).insert("X");
//! let composed = doc.compose(&change).unwrap();
//! assert_eq!(composed, Delta::new().insert("aXb"));
//! ```

use serde_json::Value;
use thiserror::Error;

pub mod attributes;
mod codec;
mod compose;
mod invert;

pub use attributes::{compose_attributes, invert_attributes, Attributes};

/// Errors raised by delta construction and transformation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeltaError {
    /// A retain or delete runs past the remaining content length.
    #[error("retain/delete of {requested} exceeds remaining content length {available}")]
    LengthMismatch { requested: usize, available: usize },
    /// Malformed JSON delta input, rejected before any delta is built.
    #[error("invalid delta json: {0}")]
    Codec(String),
}

/// A single delta operation.
#[derive(Debug, Clone, PartialEq)]
pub enum DeltaOp {
    /// Insert `text`, optionally attributed.
    Insert {
        text: String,
        attributes: Option<Attributes>,
    },
    /// Keep `len` codepoints, optionally re-attributing them.
    Retain {
        len: usize,
        attributes: Option<Attributes>,
    },
    /// Remove `len` codepoints.
    Delete { len: usize },
}

impl DeltaOp {
    /// Length of this operation on the *source* text.
    pub fn src_len(&self) -> usize {
        match self {
            DeltaOp::Insert { .. } => 0,
            DeltaOp::Retain { len, .. } => *len,
            DeltaOp::Delete { len } => *len,
        }
    }

    /// Length of this operation on the *destination* text.
    pub fn dst_len(&self) -> usize {
        match self {
            DeltaOp::Insert { text, .. } => text.chars().count(),
            DeltaOp::Retain { len, .. } => *len,
            DeltaOp::Delete { .. } => 0,
        }
    }

    /// The operation's attribute map, if any.
    pub fn attributes(&self) -> Option<&Attributes> {
        match self {
            DeltaOp::Insert { attributes, .. } | DeltaOp::Retain { attributes, .. } => {
                attributes.as_ref()
            }
            DeltaOp::Delete { .. } => None,
        }
    }

    fn is_empty(&self) -> bool {
        match self {
            DeltaOp::Insert { text, .. } => text.is_empty(),
            DeltaOp::Retain { len, .. } | DeltaOp::Delete { len } => *len == 0,
        }
    }
}

/// An immutable sequence of text operations.
///
/// Every transform (`compose`, `invert`, `slice`) returns a new `Delta`;
/// builders consume and return `self` so construction chains:
///
/// ```
/// use blockdoc_delta::Delta;
///
/// let d = Delta::new().retain(2).insert("hi").delete(1);
/// assert_eq!(d.base_length(), 3);
/// assert_eq!(d.length(), 4);
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Delta {
    ops: Vec<DeltaOp>,
}

impl Delta {
    pub fn new() -> Self {
        Self::default()
    }

    /// The underlying operations.
    pub fn ops(&self) -> &[DeltaOp] {
        &self.ops
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Appends an insert of `text`.
    pub fn insert(mut self, text: impl Into<String>) -> Self {
        self.push(DeltaOp::Insert {
            text: text.into(),
            attributes: None,
        });
        self
    }

    /// Appends an insert of `text` carrying `attributes`.
    pub fn insert_attr(mut self, text: impl Into<String>, attributes: Attributes) -> Self {
        self.push(DeltaOp::Insert {
            text: text.into(),
            attributes: Some(attributes),
        });
        self
    }

    /// Appends a retain of `len` codepoints.
    pub fn retain(mut self, len: usize) -> Self {
        self.push(DeltaOp::Retain {
            len,
            attributes: None,
        });
        self
    }

    /// Appends a retain of `len` codepoints applying `attributes`.
    pub fn retain_attr(mut self, len: usize, attributes: Attributes) -> Self {
        self.push(DeltaOp::Retain {
            len,
            attributes: Some(attributes),
        });
        self
    }

    /// Appends a delete of `len` codepoints.
    pub fn delete(mut self, len: usize) -> Self {
        self.push(DeltaOp::Delete { len });
        self
    }

    /// Appends `op`, merging it into the previous operation when both are the
    /// same kind with equal attributes. Empty operations are dropped.
    pub(crate) fn push(&mut self, op: DeltaOp) {
        if op.is_empty() {
            return;
        }
        match (self.ops.last_mut(), &op) {
            (
                Some(DeltaOp::Insert { text, attributes }),
                DeltaOp::Insert {
                    text: t,
                    attributes: a,
                },
            ) if attributes == a => {
                text.push_str(t);
                return;
            }
            (
                Some(DeltaOp::Retain { len, attributes }),
                DeltaOp::Retain {
                    len: n,
                    attributes: a,
                },
            ) if attributes == a => {
                *len += n;
                return;
            }
            (Some(DeltaOp::Delete { len }), DeltaOp::Delete { len: n }) => {
                *len += n;
                return;
            }
            _ => {}
        }
        self.ops.push(op);
    }

    /// Strips trailing attribute-less retains (they are implicit).
    pub(crate) fn chop(mut self) -> Self {
        while let Some(DeltaOp::Retain {
            attributes: None, ..
        }) = self.ops.last()
        {
            self.ops.pop();
        }
        self
    }

    /// Total length of the text this delta produces (insert + retain).
    pub fn length(&self) -> usize {
        self.ops.iter().map(DeltaOp::dst_len).sum()
    }

    /// Total length of the text this delta consumes (retain + delete).
    pub fn base_length(&self) -> usize {
        self.ops.iter().map(DeltaOp::src_len).sum()
    }

    /// Extracts the sub-delta covering `[start, end)` of the produced text.
    /// Deletes contribute nothing to the produced text and are skipped.
    pub fn slice(&self, start: usize, end: usize) -> Delta {
        let mut result = Delta::new();
        let mut pos = 0usize;
        for op in &self.ops {
            if pos >= end {
                break;
            }
            let len = op.dst_len();
            if len == 0 {
                continue;
            }
            let op_start = start.saturating_sub(pos).min(len);
            let op_end = end.saturating_sub(pos).min(len);
            if op_start < op_end {
                match op {
                    DeltaOp::Insert { text, attributes } => {
                        let piece: String = text
                            .chars()
                            .skip(op_start)
                            .take(op_end - op_start)
                            .collect();
                        result.push(DeltaOp::Insert {
                            text: piece,
                            attributes: attributes.clone(),
                        });
                    }
                    DeltaOp::Retain { attributes, .. } => {
                        result.push(DeltaOp::Retain {
                            len: op_end - op_start,
                            attributes: attributes.clone(),
                        });
                    }
                    DeltaOp::Delete { .. } => {}
                }
            }
            pos += len;
        }
        result
    }

    /// Applies this delta to plain text, returning the edited text.
    ///
    /// Text past the delta's reach is kept (an implicit trailing retain). A
    /// retain or delete that runs past the end of `text` is a
    /// [`DeltaError::LengthMismatch`].
    pub fn apply(&self, text: &str) -> Result<String, DeltaError> {
        let chars: Vec<char> = text.chars().collect();
        let mut out = String::with_capacity(text.len());
        let mut idx = 0usize;
        for op in &self.ops {
            match op {
                DeltaOp::Insert { text, .. } => out.push_str(text),
                DeltaOp::Retain { len, .. } => {
                    if idx + len > chars.len() {
                        return Err(DeltaError::LengthMismatch {
                            requested: *len,
                            available: chars.len() - idx,
                        });
                    }
                    out.extend(&chars[idx..idx + len]);
                    idx += len;
                }
                DeltaOp::Delete { len } => {
                    if idx + len > chars.len() {
                        return Err(DeltaError::LengthMismatch {
                            requested: *len,
                            available: chars.len() - idx,
                        });
                    }
                    idx += len;
                }
            }
        }
        out.extend(&chars[idx..]);
        Ok(out)
    }

    /// Concatenation of all inserted text. The plain-text view of a document
    /// delta.
    pub fn document_text(&self) -> String {
        let mut out = String::new();
        for op in &self.ops {
            if let DeltaOp::Insert { text, .. } = op {
                out.push_str(text);
            }
        }
        out
    }

    /// Composes `self` with `other` into a single equivalent delta.
    ///
    /// See [`DeltaError::LengthMismatch`] for the over-length failure mode.
    pub fn compose(&self, other: &Delta) -> Result<Delta, DeltaError> {
        compose::compose(self, other)
    }

    /// Inverts this change against `base`, the document delta it applied to.
    ///
    /// `base.compose(d)?.compose(&d.invert(&base))? == base` for any change
    /// `d` that composes with `base`.
    pub fn invert(&self, base: &Delta) -> Delta {
        invert::invert(self, base)
    }

    /// Serializes to the JSON array form
    /// `[{"insert": …} | {"retain": …} | {"delete": …}, …]`.
    pub fn to_json(&self) -> Value {
        codec::to_json(self)
    }

    /// Parses the JSON array form. Malformed input is a
    /// [`DeltaError::Codec`]; no partial delta is ever returned.
    pub fn from_json(value: &Value) -> Result<Delta, DeltaError> {
        codec::from_json(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn attrs(pairs: &[(&str, Value)]) -> Attributes {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn push_merges_same_kind_same_attributes() {
        let d = Delta::new().insert("ab").insert("cd");
        assert_eq!(d.ops().len(), 1);
        assert_eq!(d, Delta::new().insert("abcd"));
    }

    #[test]
    fn push_keeps_differently_attributed_inserts_apart() {
        let d = Delta::new()
            .insert("ab")
            .insert_attr("cd", attrs(&[("bold", json!(true))]));
        assert_eq!(d.ops().len(), 2);
    }

    #[test]
    fn push_drops_empty_ops() {
        let d = Delta::new().insert("").retain(0).delete(0);
        assert!(d.is_empty());
    }

    #[test]
    fn lengths_count_codepoints() {
        let d = Delta::new().insert("héllo 🦀");
        assert_eq!(d.length(), 7);
        assert_eq!(d.base_length(), 0);
    }

    #[test]
    fn apply_retain_insert_delete() {
        let d = Delta::new().retain(5).insert(" there").delete(6);
        assert_eq!(d.apply("hello world!").unwrap(), "hello there!");
    }

    #[test]
    fn apply_overlong_delete_fails() {
        let d = Delta::new().delete(5);
        assert_eq!(
            d.apply("abc"),
            Err(DeltaError::LengthMismatch {
                requested: 5,
                available: 3
            })
        );
    }

    #[test]
    fn slice_extracts_middle() {
        let d = Delta::new()
            .insert("abc")
            .insert_attr("def", attrs(&[("bold", json!(true))]));
        let s = d.slice(2, 4);
        assert_eq!(
            s,
            Delta::new()
                .insert("c")
                .insert_attr("d", attrs(&[("bold", json!(true))]))
        );
    }

    #[test]
    fn slice_out_of_range_is_clamped() {
        let d = Delta::new().insert("abc");
        assert_eq!(d.slice(2, 10), Delta::new().insert("c"));
        assert!(d.slice(5, 9).is_empty());
    }

    #[test]
    fn document_text_skips_non_inserts() {
        let d = Delta::new().retain(2).insert("xy").delete(1);
        assert_eq!(d.document_text(), "xy");
    }
}
