//! Typed tree nodes.
//!
//! A node carries a type tag, an ordered attribute map, an optional rich-text
//! delta (text-bearing types only), and ordered children. There is no parent
//! back-reference; ancestry is recovered by walking from the root with a
//! [`Path`](crate::Path).
//!
//! Attribute, delta, and children mutation is crate-private: the transaction
//! apply routine is the only writer.

use blockdoc_delta::{Attributes, Delta};
use serde_json::Value;

use crate::Path;

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    node_type: String,
    attributes: Attributes,
    delta: Option<Delta>,
    children: Vec<Node>,
}

impl Node {
    pub fn new(node_type: impl Into<String>) -> Self {
        Self {
            node_type: node_type.into(),
            attributes: Attributes::new(),
            delta: None,
            children: Vec::new(),
        }
    }

    pub fn with_attributes(mut self, attributes: Attributes) -> Self {
        self.attributes = attributes;
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: Value) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }

    pub fn with_delta(mut self, delta: Delta) -> Self {
        self.delta = Some(delta);
        self
    }

    pub fn with_children(mut self, children: Vec<Node>) -> Self {
        self.children = children;
        self
    }

    pub fn node_type(&self) -> &str {
        &self.node_type
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    pub fn delta(&self) -> Option<&Delta> {
        self.delta.as_ref()
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// The node's plain text, when it is text-bearing.
    pub fn text(&self) -> Option<String> {
        self.delta.as_ref().map(Delta::document_text)
    }

    /// Returns a copy with `partial` shallow-merged into the attributes.
    /// A `Null` value removes the key. Delta and children are carried over.
    pub fn copy_with(&self, partial: &Attributes) -> Node {
        let mut copy = self.clone();
        copy.merge_attributes(partial);
        copy
    }

    /// Walks `path` down from this node.
    pub fn descendant(&self, path: &Path) -> Option<&Node> {
        let mut current = self;
        for &index in path.steps() {
            current = current.children.get(index)?;
        }
        Some(current)
    }

    pub(crate) fn descendant_mut(&mut self, path: &Path) -> Option<&mut Node> {
        let mut current = self;
        for &index in path.steps() {
            current = current.children.get_mut(index)?;
        }
        Some(current)
    }

    pub(crate) fn merge_attributes(&mut self, partial: &Attributes) {
        for (key, value) in partial {
            if value.is_null() {
                self.attributes.remove(key);
            } else {
                self.attributes.insert(key.clone(), value.clone());
            }
        }
    }

    pub(crate) fn set_delta(&mut self, delta: Delta) {
        self.delta = Some(delta);
    }

    pub(crate) fn insert_child(&mut self, index: usize, child: Node) {
        self.children.insert(index, child);
    }

    pub(crate) fn remove_child(&mut self, index: usize) -> Node {
        self.children.remove(index)
    }
}
