//! Built-in block types: type tags, attribute keys, and node factories.

use blockdoc_delta::Delta;
use serde_json::json;

use crate::Node;

/// Block type tags.
pub mod types {
    pub const DOCUMENT: &str = "document";
    pub const PARAGRAPH: &str = "paragraph";
    pub const HEADING: &str = "heading";
    pub const QUOTE: &str = "quote";
    pub const BULLETED_LIST: &str = "bulleted_list";
    pub const NUMBERED_LIST: &str = "numbered_list";
    pub const TODO_LIST: &str = "todo_list";
    pub const DIVIDER: &str = "divider";
    pub const IMAGE: &str = "image";
    pub const CODE: &str = "code";
    pub const TABLE: &str = "table";
    pub const TABLE_CELL: &str = "table/cell";
}

/// Attribute keys.
pub mod keys {
    /// Serialized-form key holding a text-bearing node's delta.
    pub const DELTA: &str = "delta";
    pub const LEVEL: &str = "level";
    pub const CHECKED: &str = "checked";
    pub const NUMBER: &str = "number";
    pub const URL: &str = "url";
    pub const ALT: &str = "alt";
    pub const LANGUAGE: &str = "language";
    pub const COLS_LEN: &str = "colsLen";
    pub const ROWS_LEN: &str = "rowsLen";
    pub const COL_DEFAULT_WIDTH: &str = "colDefaultWidth";
    pub const ROW_DEFAULT_HEIGHT: &str = "rowDefaultHeight";
    pub const COL_MINIMUM_WIDTH: &str = "colMinimumWidth";
    pub const COL_POSITION: &str = "colPosition";
    pub const ROW_POSITION: &str = "rowPosition";
    pub const WIDTH: &str = "width";
    pub const HEIGHT: &str = "height";
    pub const COL_BACKGROUND: &str = "colBackgroundColor";
    pub const ROW_BACKGROUND: &str = "rowBackgroundColor";
}

pub const DEFAULT_COL_WIDTH: f64 = 160.0;
pub const DEFAULT_ROW_HEIGHT: f64 = 40.0;
pub const MINIMUM_COL_WIDTH: f64 = 40.0;

pub fn document(children: Vec<Node>) -> Node {
    Node::new(types::DOCUMENT).with_children(children)
}

pub fn paragraph(delta: Delta) -> Node {
    Node::new(types::PARAGRAPH).with_delta(delta)
}

pub fn heading(level: u8, delta: Delta) -> Node {
    Node::new(types::HEADING)
        .with_attribute(keys::LEVEL, json!(level))
        .with_delta(delta)
}

pub fn quote(delta: Delta) -> Node {
    Node::new(types::QUOTE).with_delta(delta)
}

pub fn bulleted_list(delta: Delta) -> Node {
    Node::new(types::BULLETED_LIST).with_delta(delta)
}

pub fn numbered_list(number: u64, delta: Delta) -> Node {
    Node::new(types::NUMBERED_LIST)
        .with_attribute(keys::NUMBER, json!(number))
        .with_delta(delta)
}

pub fn todo_list(checked: bool, delta: Delta) -> Node {
    Node::new(types::TODO_LIST)
        .with_attribute(keys::CHECKED, json!(checked))
        .with_delta(delta)
}

pub fn divider() -> Node {
    Node::new(types::DIVIDER)
}

pub fn image(url: &str, alt: &str) -> Node {
    Node::new(types::IMAGE)
        .with_attribute(keys::URL, json!(url))
        .with_attribute(keys::ALT, json!(alt))
}

pub fn code_block(language: &str, delta: Delta) -> Node {
    Node::new(types::CODE)
        .with_attribute(keys::LANGUAGE, json!(language))
        .with_delta(delta)
}

/// An empty cell addressed at `(col, row)` with the default geometry.
pub fn table_cell(col: usize, row: usize) -> Node {
    Node::new(types::TABLE_CELL)
        .with_attribute(keys::COL_POSITION, json!(col as u64))
        .with_attribute(keys::ROW_POSITION, json!(row as u64))
        .with_attribute(keys::WIDTH, json!(DEFAULT_COL_WIDTH))
        .with_attribute(keys::HEIGHT, json!(DEFAULT_ROW_HEIGHT))
        .with_delta(Delta::new())
}

/// A `cols x rows` table with empty cells, stored column-major.
pub fn table(cols: usize, rows: usize) -> Node {
    let mut cells = Vec::with_capacity(cols * rows);
    for col in 0..cols {
        for row in 0..rows {
            cells.push(table_cell(col, row));
        }
    }
    table_from_cells(cols, rows, cells)
}

/// Assembles a table around pre-built cells. The caller owns grid coverage:
/// `cells` must hold one cell per `(col, row)` pair.
pub fn table_from_cells(cols: usize, rows: usize, cells: Vec<Node>) -> Node {
    Node::new(types::TABLE)
        .with_attribute(keys::COLS_LEN, json!(cols as u64))
        .with_attribute(keys::ROWS_LEN, json!(rows as u64))
        .with_attribute(keys::COL_DEFAULT_WIDTH, json!(DEFAULT_COL_WIDTH))
        .with_attribute(keys::ROW_DEFAULT_HEIGHT, json!(DEFAULT_ROW_HEIGHT))
        .with_attribute(keys::COL_MINIMUM_WIDTH, json!(MINIMUM_COL_WIDTH))
        .with_children(cells)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_factory_builds_full_grid() {
        let t = table(2, 3);
        assert_eq!(t.children().len(), 6);
        assert_eq!(t.attribute(keys::COLS_LEN), Some(&json!(2)));
        assert_eq!(t.attribute(keys::ROWS_LEN), Some(&json!(3)));
        // Column-major: the second child is (0, 1).
        let cell = &t.children()[1];
        assert_eq!(cell.attribute(keys::COL_POSITION), Some(&json!(0)));
        assert_eq!(cell.attribute(keys::ROW_POSITION), Some(&json!(1)));
    }

    #[test]
    fn text_bearing_factories_carry_a_delta() {
        assert!(paragraph(Delta::new()).delta().is_some());
        assert!(heading(1, Delta::new()).delta().is_some());
        assert!(table_cell(0, 0).delta().is_some());
        assert!(divider().delta().is_none());
    }
}
