use std::sync::{Arc, Mutex};

use blockdoc_core::{
    blocks, node_to_json, BlockRegistry, Document, Path, Selection, TransactionBuilder,
};
use blockdoc_delta::Delta;

fn sample_document() -> Document {
    let root = blocks::document(vec![
        blocks::paragraph(Delta::new().insert("hello")),
        blocks::paragraph(Delta::new().insert("world")),
    ]);
    Document::with_root(root, BlockRegistry::standard())
}

#[test]
fn undo_restores_the_pre_apply_tree() {
    let mut doc = sample_document();
    let before = node_to_json(doc.root());

    let tx = TransactionBuilder::new()
        .text_edit([0], Delta::new().retain(5).insert("!"))
        .delete_node([1])
        .build();
    doc.apply(tx).expect("edit must apply");
    let after = node_to_json(doc.root());
    assert_ne!(before, after);

    assert!(doc.undo().expect("undo must apply"));
    assert_eq!(node_to_json(doc.root()), before);

    assert!(doc.redo().expect("redo must apply"));
    assert_eq!(node_to_json(doc.root()), after);
}

#[test]
fn undo_inverts_attribute_updates_exactly() {
    let mut doc = sample_document();
    let tx = TransactionBuilder::new()
        .update_attributes(
            [0],
            serde_json::json!({"align": "center"})
                .as_object()
                .expect("object")
                .clone(),
        )
        .build();
    doc.apply(tx).expect("update must apply");
    assert_eq!(
        doc.node_at_path(&Path::from([0]))
            .expect("path must resolve")
            .attribute("align"),
        Some(&serde_json::json!("center"))
    );
    doc.undo().expect("undo must apply");
    assert_eq!(
        doc.node_at_path(&Path::from([0]))
            .expect("path must resolve")
            .attribute("align"),
        None
    );
}

#[test]
fn undo_stack_is_cleared_by_a_new_edit_after_undo() {
    let mut doc = sample_document();
    let tx1 = TransactionBuilder::new()
        .text_edit([0], Delta::new().retain(5).insert("1"))
        .build();
    doc.apply(tx1).expect("first edit must apply");
    doc.undo().expect("undo must apply");
    assert!(doc.can_redo());

    let tx2 = TransactionBuilder::new()
        .text_edit([0], Delta::new().retain(5).insert("2"))
        .build();
    doc.apply(tx2).expect("second edit must apply");
    assert!(!doc.can_redo());
    assert!(doc.undo().expect("undo must apply"));
    assert!(!doc.undo().expect("empty undo is not an error"));
}

#[test]
fn selection_listeners_observe_apply_and_explicit_updates() {
    let mut doc = sample_document();
    let seen: Arc<Mutex<Vec<Option<Selection>>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let id = doc.on_selection_change(move |event| {
        sink.lock().expect("lock").push(event.after.clone());
    });

    doc.set_selection(Some(Selection::single([0], 1, 1)));
    let tx = TransactionBuilder::new()
        .text_edit([0], Delta::new().insert("x"))
        .after_selection(Selection::single([0], 1, 1))
        .build();
    doc.apply(tx).expect("edit must apply");

    assert!(doc.off_selection_change(id));
    assert!(!doc.off_selection_change(id));
    doc.set_selection(None);

    let seen = seen.lock().expect("lock");
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[0], Some(Selection::single([0], 1, 1)));
}

#[test]
fn selectionless_transaction_keeps_the_current_selection() {
    let mut doc = sample_document();
    doc.set_selection(Some(Selection::single([0], 2, 2)));

    // A background edit built without captured selections.
    let tx = TransactionBuilder::new()
        .text_edit([0], Delta::new().retain(5).insert("!"))
        .build();
    doc.apply(tx).expect("edit must apply");
    assert_eq!(doc.selection(), Some(&Selection::single([0], 2, 2)));

    // When the edit invalidates the caret, it is clamped, not cleared.
    doc.set_selection(Some(Selection::single([1], 9, 9)));
    let tx = TransactionBuilder::new().delete_node([1]).build();
    doc.apply(tx).expect("delete must apply");
    assert_eq!(doc.selection(), Some(&Selection::single([0], 6, 6)));
}

#[test]
fn operation_less_transactions_leave_history_untouched() {
    let mut doc = sample_document();
    let caret_move = TransactionBuilder::new()
        .after_selection(Selection::single([1], 0, 0))
        .build();
    doc.apply(caret_move.clone()).expect("move must apply");
    assert!(!doc.can_undo());

    // A caret move between undo and redo must not clear the redo stack.
    let edit = TransactionBuilder::new()
        .text_edit([0], Delta::new().retain(5).insert("!"))
        .build();
    doc.apply(edit).expect("edit must apply");
    doc.undo().expect("undo must apply");
    assert!(doc.can_redo());
    doc.apply(caret_move).expect("move must apply");
    assert!(doc.can_redo());
    assert!(doc.redo().expect("redo must apply"));
}

#[test]
fn dirty_queue_collects_touched_paths_and_drains() {
    let mut doc = sample_document();
    let tx = TransactionBuilder::new()
        .text_edit([1], Delta::new().retain(5).insert("!"))
        .build();
    doc.apply(tx).expect("edit must apply");

    let dirty = doc.take_dirty();
    assert!(dirty.contains(&Path::from([1])));
    assert!(doc.take_dirty().is_empty());
}

#[test]
fn new_document_starts_with_an_empty_paragraph() {
    let doc = Document::new(BlockRegistry::standard());
    assert_eq!(doc.root().node_type(), "document");
    assert_eq!(doc.root().children().len(), 1);
    assert_eq!(doc.root().children()[0].text().as_deref(), Some(""));
}
