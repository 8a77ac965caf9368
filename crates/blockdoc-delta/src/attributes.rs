//! Attribute maps and their compose/invert algebra.
//!
//! Attributes are ordered JSON maps. A `Null` value in a change map removes
//! the key from the content it applies to; `Null` is kept in the composed map
//! only while it still has content to remove (`keep_null`).

use serde_json::{Map, Value};

/// Ordered attribute map attached to inserts and retains.
pub type Attributes = Map<String, Value>;

/// Composes attribute map `a` (applied first) with `b` (applied second).
///
/// Keys in `b` win. With `keep_null` set, `Null` removals survive into the
/// result (needed when the result still applies to underlying content, i.e.
/// when `a` sat on a retain); otherwise they are dropped.
///
/// # Example
///
/// ```
/// use blockdoc_delta::compose_attributes;
/// use serde_json::json;
///
/// let a = json!({"bold": true, "color": "red"});
/// let b = json!({"color": null, "link": "x"});
/// let out = compose_attributes(
///     a.as_object(),
///     b.as_object(),
///     false,
/// );
/// assert_eq!(serde_json::Value::Object(out.unwrap()), json!({"link": "x", "bold": true}));
/// ```
pub fn compose_attributes(
    a: Option<&Attributes>,
    b: Option<&Attributes>,
    keep_null: bool,
) -> Option<Attributes> {
    let mut out: Attributes = b.cloned().unwrap_or_default();
    if let Some(a) = a {
        for (key, value) in a {
            if !out.contains_key(key) {
                out.insert(key.clone(), value.clone());
            }
        }
    }
    if !keep_null {
        out.retain(|_, v| !v.is_null());
    }
    if out.is_empty() {
        None
    } else {
        Some(out)
    }
}

/// Computes the attribute map that undoes `change` against `base`.
///
/// For every key `change` touches, the result restores `base`'s value, or
/// removes the key (`Null`) when `base` never had it.
pub fn invert_attributes(
    change: Option<&Attributes>,
    base: Option<&Attributes>,
) -> Option<Attributes> {
    let change = change?;
    let mut out = Attributes::new();
    for (key, value) in change {
        match base.and_then(|m| m.get(key)) {
            Some(base_value) if base_value != value => {
                out.insert(key.clone(), base_value.clone());
            }
            Some(_) => {}
            None if !value.is_null() => {
                out.insert(key.clone(), Value::Null);
            }
            None => {}
        }
    }
    if out.is_empty() {
        None
    } else {
        Some(out)
    }
}
