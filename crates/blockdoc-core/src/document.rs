//! The document: root node, transactional apply, undo/redo, and change
//! notification.

use std::collections::BTreeMap;

use crate::transaction::apply_op;
use crate::{
    blocks, BlockRegistry, DocumentError, Node, Operation, Path, Position, Selection, Transaction,
};

/// Result of a successful apply: the selection the view should adopt.
#[derive(Debug, Clone, PartialEq)]
pub struct ApplyOutcome {
    pub selection: Option<Selection>,
}

/// Emitted to `selection_changed` listeners after every successful apply and
/// every explicit selection update.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionEvent {
    pub before: Option<Selection>,
    pub after: Option<Selection>,
}

type SelectionListener = Box<dyn FnMut(&SelectionEvent) + Send + Sync>;

enum History {
    Record,
    Undo,
    Redo,
}

/// A block document. All mutation goes through [`Document::apply`]; on any
/// failure the tree is left untouched.
pub struct Document {
    root: Node,
    registry: BlockRegistry,
    selection: Option<Selection>,
    undo_stack: Vec<Transaction>,
    redo_stack: Vec<Transaction>,
    next_listener_id: u64,
    listeners: BTreeMap<u64, SelectionListener>,
    dirty: Vec<Path>,
}

impl Document {
    /// An empty document: a root with one empty paragraph.
    pub fn new(registry: BlockRegistry) -> Self {
        let root = blocks::document(vec![blocks::paragraph(Default::default())]);
        Self::with_root(root, registry)
    }

    /// Wraps an existing tree (e.g. a deserialized one).
    pub fn with_root(root: Node, registry: BlockRegistry) -> Self {
        Self {
            root,
            registry,
            selection: None,
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            next_listener_id: 1,
            listeners: BTreeMap::new(),
            dirty: Vec::new(),
        }
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    pub fn registry(&self) -> &BlockRegistry {
        &self.registry
    }

    /// Resolves `path` to a node, or `PathOutOfRange`.
    pub fn node_at_path(&self, path: &Path) -> Result<&Node, DocumentError> {
        self.root
            .descendant(path)
            .ok_or_else(|| DocumentError::PathOutOfRange(path.clone()))
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    /// Updates the selection outside of a transaction (pointer placement).
    pub fn set_selection(&mut self, selection: Option<Selection>) {
        let before = self.selection.clone();
        self.selection = selection;
        if before != self.selection {
            self.notify(before);
        }
    }

    /// Applies `transaction` atomically and records it for undo.
    pub fn apply(&mut self, transaction: Transaction) -> Result<ApplyOutcome, DocumentError> {
        self.apply_internal(transaction, History::Record)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Re-applies the inverse of the most recent transaction. Returns `false`
    /// when there is nothing to undo.
    pub fn undo(&mut self) -> Result<bool, DocumentError> {
        let Some(inverse) = self.undo_stack.pop() else {
            return Ok(false);
        };
        match self.apply_internal(inverse.clone(), History::Undo) {
            Ok(_) => Ok(true),
            Err(err) => {
                self.undo_stack.push(inverse);
                Err(err)
            }
        }
    }

    /// Re-applies the most recently undone transaction. Returns `false` when
    /// there is nothing to redo.
    pub fn redo(&mut self) -> Result<bool, DocumentError> {
        let Some(transaction) = self.redo_stack.pop() else {
            return Ok(false);
        };
        match self.apply_internal(transaction.clone(), History::Redo) {
            Ok(_) => Ok(true),
            Err(err) => {
                self.redo_stack.push(transaction);
                Err(err)
            }
        }
    }

    /// Registers a `selection_changed` listener; the returned id unregisters
    /// it via [`Document::off_selection_change`].
    pub fn on_selection_change<F>(&mut self, listener: F) -> u64
    where
        F: FnMut(&SelectionEvent) + Send + Sync + 'static,
    {
        let id = self.next_listener_id;
        self.next_listener_id = self.next_listener_id.saturating_add(1);
        self.listeners.insert(id, Box::new(listener));
        id
    }

    pub fn off_selection_change(&mut self, listener_id: u64) -> bool {
        self.listeners.remove(&listener_id).is_some()
    }

    /// Drains the paths touched since the last drain. Schedulers (row-height
    /// propagation) use this instead of per-node listeners.
    pub fn take_dirty(&mut self) -> Vec<Path> {
        std::mem::take(&mut self.dirty)
    }

    fn apply_internal(
        &mut self,
        transaction: Transaction,
        history: History,
    ) -> Result<ApplyOutcome, DocumentError> {
        // Inversion walks the same operation sequence against a scratch tree,
        // so it doubles as an up-front dry run: a path error surfaces here
        // before the real tree is ever touched.
        let inverse = transaction.inverted(&self.root)?;

        let mut scratch = self.root.clone();
        let mut touched: Vec<Path> = Vec::new();
        for op in transaction.operations() {
            apply_op(&mut scratch, op)?;
            // Paths recorded for earlier operations must follow the sibling
            // shifts (and subtree removals) this operation causes.
            match op {
                Operation::InsertNode { path, .. } => {
                    for recorded in &mut touched {
                        *recorded = recorded.transformed(path, 1);
                    }
                }
                Operation::DeleteNode { path } => {
                    touched.retain(|p| p != path && !path.is_ancestor_of(p));
                    for recorded in &mut touched {
                        *recorded = recorded.transformed(path, -1);
                    }
                }
                Operation::UpdateAttributes { .. } | Operation::TextEdit { .. } => {}
            }
            record_touched(&mut touched, op);
        }
        touched.sort();
        touched.dedup();

        // Post-transaction validation over every touched node that still
        // resolves; a failure rejects the whole batch.
        for path in &touched {
            if let Some(node) = scratch.descendant(path) {
                self.registry.validate(node)?;
            }
        }

        self.root = scratch;
        match history {
            // Operation-less transactions (caret moves) leave no history: an
            // undo step must have a visible effect.
            History::Record if !transaction.is_empty() => {
                self.undo_stack.push(inverse);
                self.redo_stack.clear();
            }
            History::Record => {}
            History::Undo => self.redo_stack.push(inverse),
            History::Redo => self.undo_stack.push(inverse),
        }
        self.dirty.extend(touched);

        // A transaction that captured no selections (background edits, the
        // row-height scheduler) keeps the document's current one, re-clamped
        // to the mutated tree.
        let selection = match (transaction.after_selection(), transaction.before_selection()) {
            (Some(selection), _) => Some(selection.clone()),
            (None, Some(selection)) => Some(self.resolve_nearest(selection)),
            (None, None) => self
                .selection
                .as_ref()
                .map(|selection| self.resolve_nearest(selection)),
        };
        let before = self.selection.clone();
        self.selection = selection.clone();
        self.notify(before);

        Ok(ApplyOutcome { selection })
    }

    /// Clamps a possibly stale selection to the nearest valid position in
    /// the current tree.
    fn resolve_nearest(&self, selection: &Selection) -> Selection {
        Selection::new(
            self.nearest_position(selection.start()),
            self.nearest_position(selection.end()),
        )
    }

    fn nearest_position(&self, position: &Position) -> Position {
        let mut node = &self.root;
        let mut resolved = Vec::with_capacity(position.path.len());
        for &index in position.path.steps() {
            if node.children().is_empty() {
                break;
            }
            let clamped = index.min(node.children().len() - 1);
            resolved.push(clamped);
            node = &node.children()[clamped];
        }
        let limit = match node.delta() {
            Some(delta) => delta.length(),
            None => node.children().len(),
        };
        Position::new(Path::new(resolved), position.offset.min(limit))
    }

    fn notify(&mut self, before: Option<Selection>) {
        if self.listeners.is_empty() {
            return;
        }
        let event = SelectionEvent {
            before,
            after: self.selection.clone(),
        };
        for listener in self.listeners.values_mut() {
            listener(&event);
        }
    }
}

/// Records the paths whose nodes a single operation touched: the operation's
/// own target plus its parent (structural changes alter the parent's child
/// list; attribute changes on grid cells concern the enclosing table). An
/// inserted node brings its whole subtree into the document, so every
/// descendant is touched too.
fn record_touched(touched: &mut Vec<Path>, op: &Operation) {
    match op {
        Operation::InsertNode { path, node } => {
            touched.push(path.clone());
            record_descendants(touched, path, node);
            if let Some(parent) = path.parent() {
                touched.push(parent);
            }
        }
        Operation::DeleteNode { path } => {
            if let Some(parent) = path.parent() {
                touched.push(parent);
            }
        }
        Operation::UpdateAttributes { path, .. } | Operation::TextEdit { path, .. } => {
            touched.push(path.clone());
            if let Some(parent) = path.parent() {
                touched.push(parent);
            }
        }
    }
}

fn record_descendants(touched: &mut Vec<Path>, path: &Path, node: &Node) {
    for (index, child) in node.children().iter().enumerate() {
        let child_path = path.child(index);
        record_descendants(touched, &child_path, child);
        touched.push(child_path);
    }
}
