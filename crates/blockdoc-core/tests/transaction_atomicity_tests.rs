use blockdoc_core::{
    blocks, node_to_json, BlockRegistry, Document, DocumentError, Node, Path, Selection,
    TransactionBuilder,
};
use blockdoc_delta::Delta;
use serde_json::json;

fn sample_document() -> Document {
    let root = blocks::document(vec![
        blocks::paragraph(Delta::new().insert("one")),
        blocks::paragraph(Delta::new().insert("two")),
    ]);
    Document::with_root(root, BlockRegistry::standard())
}

#[test]
fn apply_mutates_through_the_only_legal_channel() {
    let mut doc = sample_document();
    let tx = TransactionBuilder::new()
        .insert_node([1], blocks::divider())
        .build();
    doc.apply(tx).expect("insert must apply");
    let types: Vec<&str> = doc.root().children().iter().map(Node::node_type).collect();
    assert_eq!(types, ["paragraph", "divider", "paragraph"]);
}

#[test]
fn operations_apply_against_the_mutated_tree_not_a_snapshot() {
    let mut doc = sample_document();
    // Insert at [0], then delete the original first paragraph, which has
    // shifted to [1] by the time the second operation runs.
    let tx = TransactionBuilder::new()
        .insert_node([0], blocks::quote(Delta::new().insert("q")))
        .delete_node([1])
        .build();
    doc.apply(tx).expect("batch must apply");
    let types: Vec<&str> = doc.root().children().iter().map(Node::node_type).collect();
    assert_eq!(types, ["quote", "paragraph"]);
    assert_eq!(doc.root().children()[1].text().as_deref(), Some("two"));
}

#[test]
fn failed_path_leaves_tree_byte_identical() {
    let mut doc = sample_document();
    let before = node_to_json(doc.root());
    let tx = TransactionBuilder::new()
        .text_edit([0], Delta::new().insert("x"))
        .delete_node([9])
        .build();
    let err = doc.apply(tx).expect_err("out-of-range path must fail");
    assert!(matches!(err, DocumentError::PathOutOfRange(_)));
    assert_eq!(node_to_json(doc.root()), before);
}

#[test]
fn overlong_delete_rejects_whole_transaction() {
    let mut doc = sample_document();
    let before = node_to_json(doc.root());
    // "one" has three codepoints; deleting five must fail and roll back the
    // preceding insert as well.
    let tx = TransactionBuilder::new()
        .insert_node([2], blocks::divider())
        .text_edit([0], Delta::new().delete(5))
        .build();
    let err = doc.apply(tx).expect_err("overlong delete must fail");
    assert!(matches!(
        err,
        DocumentError::Delta(blockdoc_delta::DeltaError::LengthMismatch {
            requested: 5,
            available: 3
        })
    ));
    assert_eq!(node_to_json(doc.root()), before);
}

#[test]
fn post_transaction_validation_rolls_back() {
    let mut doc = sample_document();
    let before = node_to_json(doc.root());
    // A heading with an out-of-range level passes application but fails the
    // registry check.
    let bad = Node::new("heading")
        .with_attribute("level", json!(9))
        .with_delta(Delta::new().insert("t"));
    let tx = TransactionBuilder::new().insert_node([0], bad).build();
    let err = doc.apply(tx).expect_err("validation must reject");
    assert!(matches!(err, DocumentError::ValidationFailed { .. }));
    assert_eq!(node_to_json(doc.root()), before);
}

#[test]
fn inserted_subtree_descendants_are_validated() {
    let mut doc = sample_document();
    let before = node_to_json(doc.root());
    // The container itself is fine; the offending heading is nested one
    // level down and must still be caught.
    let bad_child = Node::new("heading")
        .with_attribute("level", json!(9))
        .with_delta(Delta::new().insert("t"));
    let container = Node::new("document").with_children(vec![bad_child]);
    let tx = TransactionBuilder::new().insert_node([0], container).build();
    let err = doc.apply(tx).expect_err("nested validation must reject");
    assert!(matches!(err, DocumentError::ValidationFailed { .. }));
    assert_eq!(node_to_json(doc.root()), before);
}

#[test]
fn inserted_table_with_delta_less_cell_is_rejected() {
    let mut doc = sample_document();
    let before = node_to_json(doc.root());
    let bare_cell = Node::new("table/cell")
        .with_attribute("colPosition", json!(0))
        .with_attribute("rowPosition", json!(0));
    let table = blocks::table_from_cells(1, 1, vec![bare_cell]);
    let tx = TransactionBuilder::new().insert_node([0], table).build();
    let err = doc.apply(tx).expect_err("cell contract must be enforced");
    assert!(matches!(err, DocumentError::ValidationFailed { .. }));
    assert_eq!(node_to_json(doc.root()), before);
}

#[test]
fn broken_table_grid_rolls_back() {
    let mut doc = sample_document();
    let tx = TransactionBuilder::new()
        .insert_node([0], blocks::table(2, 2))
        .build();
    doc.apply(tx).expect("table insert must apply");
    let before = node_to_json(doc.root());

    // Removing one cell without renumbering breaks coverage.
    let tx = TransactionBuilder::new().delete_node([0, 3]).build();
    let err = doc.apply(tx).expect_err("grid must be enforced");
    assert!(matches!(err, DocumentError::TableInvariantViolation(_)));
    assert_eq!(node_to_json(doc.root()), before);
}

#[test]
fn sibling_insert_shifts_following_paths_by_one() {
    let mut doc = sample_document();
    let second_before = doc
        .node_at_path(&Path::from([1]))
        .expect("path must resolve")
        .clone();
    let tx = TransactionBuilder::new()
        .insert_node([1], blocks::divider())
        .build();
    doc.apply(tx).expect("insert must apply");
    // Preceding sibling unaffected, following sibling shifted by exactly one.
    assert_eq!(
        doc.node_at_path(&Path::from([0]))
            .expect("path must resolve")
            .text()
            .as_deref(),
        Some("one")
    );
    assert_eq!(
        doc.node_at_path(&Path::from([2])).expect("path must resolve"),
        &second_before
    );
}

#[test]
fn after_selection_is_adopted_verbatim() {
    let mut doc = sample_document();
    let after = Selection::single([1], 0, 0);
    let tx = TransactionBuilder::new()
        .insert_node([1], blocks::paragraph(Delta::new()))
        .after_selection(after.clone())
        .build();
    let outcome = doc.apply(tx).expect("insert must apply");
    assert_eq!(outcome.selection, Some(after.clone()));
    assert_eq!(doc.selection(), Some(&after));
}

#[test]
fn missing_after_selection_falls_back_to_nearest_valid() {
    let mut doc = sample_document();
    // The before-selection points past the end of the document and into text
    // that is shorter than its offset; the fallback clamps both.
    let tx = TransactionBuilder::new()
        .delete_node([1])
        .before_selection(Selection::single([1], 9, 9))
        .build();
    let outcome = doc.apply(tx).expect("delete must apply");
    assert_eq!(outcome.selection, Some(Selection::single([0], 3, 3)));
}
