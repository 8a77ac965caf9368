//! Transactions: ordered batches of tree and text mutations.
//!
//! A transaction is the sole legal mutation channel. Operations apply in
//! order against the tree as mutated by the preceding operations of the same
//! transaction, so later paths must account for earlier structural shifts.

use blockdoc_delta::{Attributes, Delta};
use serde_json::Value;

use crate::{DocumentError, Node, Path, Selection};

/// A single structural or text operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    /// Insert `node` so that it ends up at `path`.
    InsertNode { path: Path, node: Node },
    /// Remove the node at `path` (and its subtree).
    DeleteNode { path: Path },
    /// Shallow-merge `attributes` into the node at `path`; `Null` removes.
    UpdateAttributes { path: Path, attributes: Attributes },
    /// Compose `delta` onto the text of the node at `path`.
    TextEdit { path: Path, delta: Delta },
}

impl Operation {
    pub fn path(&self) -> &Path {
        match self {
            Operation::InsertNode { path, .. }
            | Operation::DeleteNode { path }
            | Operation::UpdateAttributes { path, .. }
            | Operation::TextEdit { path, .. } => path,
        }
    }
}

/// An atomic batch of operations with captured before/after selections.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Transaction {
    operations: Vec<Operation>,
    before_selection: Option<Selection>,
    after_selection: Option<Selection>,
}

impl Transaction {
    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    pub fn before_selection(&self) -> Option<&Selection> {
        self.before_selection.as_ref()
    }

    pub fn after_selection(&self) -> Option<&Selection> {
        self.after_selection.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Computes the inverse transaction against `root`, the tree this
    /// transaction has not yet been applied to.
    ///
    /// Inverse operations are captured op by op against the intermediate
    /// states (a delete must remember the subtree it removed, a text edit
    /// the delta it overwrote) and emitted in reverse order, with the
    /// before/after selections swapped.
    pub fn inverted(&self, root: &Node) -> Result<Transaction, DocumentError> {
        let mut scratch = root.clone();
        let mut inverse_ops = Vec::with_capacity(self.operations.len());
        for op in &self.operations {
            inverse_ops.push(invert_op(&scratch, op)?);
            apply_op(&mut scratch, op)?;
        }
        inverse_ops.reverse();
        Ok(Transaction {
            operations: inverse_ops,
            before_selection: self.after_selection.clone(),
            after_selection: self.before_selection.clone(),
        })
    }
}

/// Accumulates operations and selections into a [`Transaction`].
#[derive(Debug, Default)]
pub struct TransactionBuilder {
    operations: Vec<Operation>,
    before_selection: Option<Selection>,
    after_selection: Option<Selection>,
}

impl TransactionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(mut self, op: Operation) -> Self {
        self.operations.push(op);
        self
    }

    pub fn insert_node(self, path: impl Into<Path>, node: Node) -> Self {
        self.push(Operation::InsertNode {
            path: path.into(),
            node,
        })
    }

    pub fn delete_node(self, path: impl Into<Path>) -> Self {
        self.push(Operation::DeleteNode { path: path.into() })
    }

    pub fn update_attributes(self, path: impl Into<Path>, attributes: Attributes) -> Self {
        self.push(Operation::UpdateAttributes {
            path: path.into(),
            attributes,
        })
    }

    pub fn text_edit(self, path: impl Into<Path>, delta: Delta) -> Self {
        self.push(Operation::TextEdit {
            path: path.into(),
            delta,
        })
    }

    pub fn before_selection(mut self, selection: Selection) -> Self {
        self.before_selection = Some(selection);
        self
    }

    pub fn after_selection(mut self, selection: Selection) -> Self {
        self.after_selection = Some(selection);
        self
    }

    pub fn build(self) -> Transaction {
        Transaction {
            operations: self.operations,
            before_selection: self.before_selection,
            after_selection: self.after_selection,
        }
    }
}

/// Applies a single operation to `root` in place.
///
/// Callers own atomicity: the document apply routine runs this against a
/// scratch copy and only swaps the copy in once every operation and the
/// post-apply validation have succeeded.
pub(crate) fn apply_op(root: &mut Node, op: &Operation) -> Result<(), DocumentError> {
    match op {
        Operation::InsertNode { path, node } => {
            let (parent_path, index) = split_parent(path)?;
            let parent = root
                .descendant_mut(&parent_path)
                .ok_or_else(|| DocumentError::PathOutOfRange(path.clone()))?;
            if index > parent.children().len() {
                return Err(DocumentError::PathOutOfRange(path.clone()));
            }
            parent.insert_child(index, node.clone());
        }
        Operation::DeleteNode { path } => {
            let (parent_path, index) = split_parent(path)?;
            let parent = root
                .descendant_mut(&parent_path)
                .ok_or_else(|| DocumentError::PathOutOfRange(path.clone()))?;
            if index >= parent.children().len() {
                return Err(DocumentError::PathOutOfRange(path.clone()));
            }
            parent.remove_child(index);
        }
        Operation::UpdateAttributes { path, attributes } => {
            let node = root
                .descendant_mut(path)
                .ok_or_else(|| DocumentError::PathOutOfRange(path.clone()))?;
            node.merge_attributes(attributes);
        }
        Operation::TextEdit { path, delta } => {
            let node = root
                .descendant_mut(path)
                .ok_or_else(|| DocumentError::PathOutOfRange(path.clone()))?;
            let base = node.delta().cloned().unwrap_or_default();
            let edited = base.compose(delta)?;
            node.set_delta(edited);
        }
    }
    Ok(())
}

/// Computes the inverse of `op` against the tree state it is about to apply
/// to.
fn invert_op(root: &Node, op: &Operation) -> Result<Operation, DocumentError> {
    Ok(match op {
        Operation::InsertNode { path, .. } => Operation::DeleteNode { path: path.clone() },
        Operation::DeleteNode { path } => {
            let node = root
                .descendant(path)
                .ok_or_else(|| DocumentError::PathOutOfRange(path.clone()))?;
            Operation::InsertNode {
                path: path.clone(),
                node: node.clone(),
            }
        }
        Operation::UpdateAttributes { path, attributes } => {
            let node = root
                .descendant(path)
                .ok_or_else(|| DocumentError::PathOutOfRange(path.clone()))?;
            let mut restored = Attributes::new();
            for key in attributes.keys() {
                match node.attribute(key) {
                    Some(value) => restored.insert(key.clone(), value.clone()),
                    None => restored.insert(key.clone(), Value::Null),
                };
            }
            Operation::UpdateAttributes {
                path: path.clone(),
                attributes: restored,
            }
        }
        Operation::TextEdit { path, delta } => {
            let node = root
                .descendant(path)
                .ok_or_else(|| DocumentError::PathOutOfRange(path.clone()))?;
            let base = node.delta().cloned().unwrap_or_default();
            Operation::TextEdit {
                path: path.clone(),
                delta: delta.invert(&base),
            }
        }
    })
}

fn split_parent(path: &Path) -> Result<(Path, usize), DocumentError> {
    match (path.parent(), path.last()) {
        (Some(parent), Some(index)) => Ok((parent, index)),
        // The root itself cannot be inserted or deleted.
        _ => Err(DocumentError::PathOutOfRange(path.clone())),
    }
}
