//! Block registry: per-type structural contracts and validators.
//!
//! Validation runs after every transaction on the nodes that transaction
//! touched; a failing check rejects the whole transaction. Unknown block
//! types validate permissively so embedders can carry custom blocks without
//! registering them first.

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::fmt;

use serde_json::Value;

use crate::blocks::{self, keys, types};
use crate::{DocumentError, Node};

type Constructor = Box<dyn Fn() -> Node + Send + Sync>;
type Validator = Box<dyn Fn(&Node) -> Result<(), DocumentError> + Send + Sync>;

/// Structural contract and factory for one block type.
pub struct BlockSpec {
    block_type: String,
    accepts_children: bool,
    requires_delta: bool,
    constructor: Constructor,
    validator: Option<Validator>,
}

impl BlockSpec {
    pub fn new(
        block_type: impl Into<String>,
        constructor: impl Fn() -> Node + Send + Sync + 'static,
    ) -> Self {
        Self {
            block_type: block_type.into(),
            accepts_children: false,
            requires_delta: false,
            constructor: Box::new(constructor),
            validator: None,
        }
    }

    pub fn accepts_children(mut self, value: bool) -> Self {
        self.accepts_children = value;
        self
    }

    pub fn requires_delta(mut self, value: bool) -> Self {
        self.requires_delta = value;
        self
    }

    pub fn validator(
        mut self,
        f: impl Fn(&Node) -> Result<(), DocumentError> + Send + Sync + 'static,
    ) -> Self {
        self.validator = Some(Box::new(f));
        self
    }

    pub fn block_type(&self) -> &str {
        &self.block_type
    }

    pub fn is_container(&self) -> bool {
        self.accepts_children
    }

    pub fn is_text_bearing(&self) -> bool {
        self.requires_delta
    }

    /// Builds a fresh default node of this type.
    pub fn create(&self) -> Node {
        (self.constructor)()
    }
}

impl fmt::Debug for BlockSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlockSpec")
            .field("block_type", &self.block_type)
            .field("accepts_children", &self.accepts_children)
            .field("requires_delta", &self.requires_delta)
            .finish()
    }
}

/// Maps block type tags to their specs.
#[derive(Debug, Default)]
pub struct BlockRegistry {
    specs: BTreeMap<String, BlockSpec>,
}

impl BlockRegistry {
    /// An empty registry. Everything validates permissively.
    pub fn new() -> Self {
        Self::default()
    }

    /// The registry of built-in block types.
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.register(
            BlockSpec::new(types::DOCUMENT, || blocks::document(Vec::new()))
                .accepts_children(true),
        );
        registry.register(
            BlockSpec::new(types::PARAGRAPH, || {
                blocks::paragraph(Default::default())
            })
            .requires_delta(true),
        );
        registry.register(
            BlockSpec::new(types::HEADING, || blocks::heading(1, Default::default()))
                .requires_delta(true)
                .validator(validate_heading),
        );
        registry.register(
            BlockSpec::new(types::QUOTE, || blocks::quote(Default::default()))
                .requires_delta(true),
        );
        registry.register(
            BlockSpec::new(types::BULLETED_LIST, || {
                blocks::bulleted_list(Default::default())
            })
            .requires_delta(true),
        );
        registry.register(
            BlockSpec::new(types::NUMBERED_LIST, || {
                blocks::numbered_list(1, Default::default())
            })
            .requires_delta(true),
        );
        registry.register(
            BlockSpec::new(types::TODO_LIST, || {
                blocks::todo_list(false, Default::default())
            })
            .requires_delta(true)
            .validator(validate_todo),
        );
        registry.register(BlockSpec::new(types::DIVIDER, blocks::divider));
        registry.register(
            BlockSpec::new(types::IMAGE, || blocks::image("", "")).validator(validate_image),
        );
        registry.register(
            BlockSpec::new(types::CODE, || blocks::code_block("", Default::default()))
                .requires_delta(true),
        );
        registry.register(
            BlockSpec::new(types::TABLE, || blocks::table(1, 1))
                .accepts_children(true)
                .validator(validate_table_grid),
        );
        registry.register(
            BlockSpec::new(types::TABLE_CELL, || blocks::table_cell(0, 0))
                .requires_delta(true)
                .validator(validate_table_cell),
        );
        registry
    }

    pub fn register(&mut self, spec: BlockSpec) {
        self.specs.insert(spec.block_type().to_string(), spec);
    }

    pub fn spec(&self, block_type: &str) -> Option<&BlockSpec> {
        self.specs.get(block_type)
    }

    pub fn contains(&self, block_type: &str) -> bool {
        self.specs.contains_key(block_type)
    }

    /// Builds a fresh default node of `block_type`, if registered.
    pub fn create(&self, block_type: &str) -> Option<Node> {
        self.specs.get(block_type).map(BlockSpec::create)
    }

    /// Checks `node` against its type's structural contract and validator.
    /// Unknown types pass.
    pub fn validate(&self, node: &Node) -> Result<(), DocumentError> {
        let Some(spec) = self.specs.get(node.node_type()) else {
            return Ok(());
        };
        if spec.requires_delta && node.delta().is_none() {
            return Err(validation_failed(node, "missing delta"));
        }
        if !spec.requires_delta && node.delta().is_some() {
            return Err(validation_failed(node, "structural block carries a delta"));
        }
        if !spec.accepts_children && !node.children().is_empty() {
            return Err(validation_failed(node, "children not allowed"));
        }
        if let Some(validator) = &spec.validator {
            validator(node)?;
        }
        Ok(())
    }
}

fn validation_failed(node: &Node, reason: impl Into<String>) -> DocumentError {
    DocumentError::ValidationFailed {
        block_type: node.node_type().to_string(),
        reason: reason.into(),
    }
}

fn validate_heading(node: &Node) -> Result<(), DocumentError> {
    match node.attribute(keys::LEVEL).and_then(Value::as_u64) {
        Some(1..=6) => Ok(()),
        _ => Err(validation_failed(node, "level must be an integer in 1..=6")),
    }
}

fn validate_todo(node: &Node) -> Result<(), DocumentError> {
    if node.attribute(keys::CHECKED).map(Value::is_boolean) == Some(true) {
        Ok(())
    } else {
        Err(validation_failed(node, "checked must be a boolean"))
    }
}

fn validate_image(node: &Node) -> Result<(), DocumentError> {
    if node.attribute(keys::URL).map(Value::is_string) == Some(true) {
        Ok(())
    } else {
        Err(validation_failed(node, "url must be a string"))
    }
}

fn validate_table_cell(node: &Node) -> Result<(), DocumentError> {
    let col = node.attribute(keys::COL_POSITION).and_then(Value::as_u64);
    let row = node.attribute(keys::ROW_POSITION).and_then(Value::as_u64);
    if col.is_none() || row.is_none() {
        return Err(validation_failed(
            node,
            "cell requires colPosition and rowPosition",
        ));
    }
    Ok(())
}

/// The table grid invariant: `children.len() == colsLen * rowsLen` and every
/// in-range `(col, row)` covered by exactly one cell.
fn validate_table_grid(node: &Node) -> Result<(), DocumentError> {
    let cols = node
        .attribute(keys::COLS_LEN)
        .and_then(Value::as_u64)
        .ok_or_else(|| grid_violation("table missing colsLen"))? as usize;
    let rows = node
        .attribute(keys::ROWS_LEN)
        .and_then(Value::as_u64)
        .ok_or_else(|| grid_violation("table missing rowsLen"))? as usize;
    if cols == 0 || rows == 0 {
        return Err(grid_violation("table dimensions must be non-zero"));
    }
    if node.children().len() != cols * rows {
        return Err(grid_violation(format!(
            "expected {} cells for {}x{} grid, found {}",
            cols * rows,
            cols,
            rows,
            node.children().len()
        )));
    }
    let mut seen: BTreeSet<(usize, usize)> = BTreeSet::new();
    for cell in node.children() {
        if cell.node_type() != types::TABLE_CELL {
            return Err(grid_violation(format!(
                "table child has type '{}'",
                cell.node_type()
            )));
        }
        let col = cell
            .attribute(keys::COL_POSITION)
            .and_then(Value::as_u64)
            .ok_or_else(|| grid_violation("cell missing colPosition"))? as usize;
        let row = cell
            .attribute(keys::ROW_POSITION)
            .and_then(Value::as_u64)
            .ok_or_else(|| grid_violation("cell missing rowPosition"))? as usize;
        if col >= cols || row >= rows {
            return Err(grid_violation(format!(
                "cell ({col}, {row}) outside {cols}x{rows} grid"
            )));
        }
        if !seen.insert((col, row)) {
            return Err(grid_violation(format!("duplicate cell ({col}, {row})")));
        }
    }
    Ok(())
}

fn grid_violation(reason: impl Into<String>) -> DocumentError {
    DocumentError::TableInvariantViolation(reason.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use blockdoc_delta::Delta;
    use serde_json::json;

    #[test]
    fn unknown_types_validate_permissively() {
        let registry = BlockRegistry::standard();
        let node = Node::new("embedded-widget").with_attribute("anything", json!(42));
        assert!(registry.validate(&node).is_ok());
    }

    #[test]
    fn paragraph_requires_a_delta() {
        let registry = BlockRegistry::standard();
        assert!(matches!(
            registry.validate(&Node::new(types::PARAGRAPH)),
            Err(DocumentError::ValidationFailed { .. })
        ));
        assert!(registry
            .validate(&blocks::paragraph(Delta::new().insert("ok")))
            .is_ok());
    }

    #[test]
    fn divider_rejects_a_delta() {
        let registry = BlockRegistry::standard();
        let bad = Node::new(types::DIVIDER).with_delta(Delta::new().insert("x"));
        assert!(matches!(
            registry.validate(&bad),
            Err(DocumentError::ValidationFailed { .. })
        ));
    }

    #[test]
    fn heading_level_bounds() {
        let registry = BlockRegistry::standard();
        assert!(registry.validate(&blocks::heading(6, Delta::new())).is_ok());
        assert!(registry.validate(&blocks::heading(7, Delta::new())).is_err());
        assert!(registry.validate(&blocks::heading(0, Delta::new())).is_err());
    }

    #[test]
    fn table_grid_coverage_is_enforced() {
        let registry = BlockRegistry::standard();
        let good = blocks::table(2, 2);
        assert!(registry.validate(&good).is_ok());

        let mut short = blocks::table(2, 2);
        short = {
            let mut children = short.children().to_vec();
            children.pop();
            Node::new(types::TABLE)
                .with_attributes(short.attributes().clone())
                .with_children(children)
        };
        assert!(matches!(
            registry.validate(&short),
            Err(DocumentError::TableInvariantViolation(_))
        ));
    }

    #[test]
    fn table_duplicate_cell_is_a_violation() {
        let registry = BlockRegistry::standard();
        let dup = Node::new(types::TABLE)
            .with_attribute(keys::COLS_LEN, json!(2))
            .with_attribute(keys::ROWS_LEN, json!(1))
            .with_children(vec![blocks::table_cell(0, 0), blocks::table_cell(0, 0)]);
        assert!(matches!(
            registry.validate(&dup),
            Err(DocumentError::TableInvariantViolation(_))
        ));
    }

    #[test]
    fn create_builds_default_nodes() {
        let registry = BlockRegistry::standard();
        let node = registry.create(types::TODO_LIST).expect("registered type");
        assert_eq!(node.node_type(), types::TODO_LIST);
        assert_eq!(node.attribute(keys::CHECKED), Some(&json!(false)));
        assert!(registry.create("nope").is_none());
    }
}
