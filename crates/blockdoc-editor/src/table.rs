//! The table engine: grid reads, wrap-around navigation, and structural
//! table edits expressed as single transactions.
//!
//! Cells are located by their `colPosition`/`rowPosition` attributes, never
//! by child index; [`TableView`] builds the `(col, row) -> child index` map
//! up front and every edit it emits renumbers positions so the grid
//! invariant holds when the transaction's post-apply validation runs.

use std::collections::BTreeMap;

use blockdoc_core::blocks::{self, keys};
use blockdoc_core::{Document, DocumentError, Node, Path, Transaction, TransactionBuilder};
use blockdoc_delta::{Attributes, Delta};
use serde_json::{json, Value};

fn attr_usize(node: &Node, key: &str) -> Option<usize> {
    node.attribute(key)?.as_u64().map(|v| v as usize)
}

fn attr_f64(node: &Node, key: &str) -> Option<f64> {
    node.attribute(key)?.as_f64()
}

fn attr_map(key: &str, value: Value) -> Attributes {
    let mut map = Attributes::new();
    map.insert(key.to_string(), value);
    map
}

fn grid_error(message: impl Into<String>) -> DocumentError {
    DocumentError::TableInvariantViolation(message.into())
}

/// A read view over one table node, indexed by grid position.
///
/// The view is a snapshot: transactions it builds address the table as it
/// looked when the view was created, so build and apply them before touching
/// the table again.
pub struct TableView<'a> {
    table: &'a Node,
    path: Path,
    cols: usize,
    rows: usize,
    index: BTreeMap<(usize, usize), usize>,
}

impl<'a> TableView<'a> {
    /// Opens a view over the table at `path`.
    pub fn new(document: &'a Document, path: Path) -> Result<Self, DocumentError> {
        let table = document.node_at_path(&path)?;
        Self::from_node(table, path)
    }

    /// Opens a view over an already-resolved table node.
    pub fn from_node(table: &'a Node, path: Path) -> Result<Self, DocumentError> {
        if table.node_type() != blocks::types::TABLE {
            return Err(grid_error(format!(
                "node at {path} is a {}, not a table",
                table.node_type()
            )));
        }
        let cols = attr_usize(table, keys::COLS_LEN)
            .ok_or_else(|| grid_error("table is missing colsLen"))?;
        let rows = attr_usize(table, keys::ROWS_LEN)
            .ok_or_else(|| grid_error("table is missing rowsLen"))?;
        let mut index = BTreeMap::new();
        for (child_index, cell) in table.children().iter().enumerate() {
            let col = attr_usize(cell, keys::COL_POSITION)
                .ok_or_else(|| grid_error("cell is missing colPosition"))?;
            let row = attr_usize(cell, keys::ROW_POSITION)
                .ok_or_else(|| grid_error("cell is missing rowPosition"))?;
            if col >= cols || row >= rows {
                return Err(grid_error(format!("cell ({col}, {row}) is out of the grid")));
            }
            if index.insert((col, row), child_index).is_some() {
                return Err(grid_error(format!("duplicate cell at ({col}, {row})")));
            }
        }
        if index.len() != cols * rows {
            return Err(grid_error(format!(
                "expected {} cells, found {}",
                cols * rows,
                index.len()
            )));
        }
        Ok(Self {
            table,
            path,
            cols,
            rows,
            index,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn col_default_width(&self) -> f64 {
        attr_f64(self.table, keys::COL_DEFAULT_WIDTH).unwrap_or(blocks::DEFAULT_COL_WIDTH)
    }

    pub fn row_default_height(&self) -> f64 {
        attr_f64(self.table, keys::ROW_DEFAULT_HEIGHT).unwrap_or(blocks::DEFAULT_ROW_HEIGHT)
    }

    pub fn col_minimum_width(&self) -> f64 {
        attr_f64(self.table, keys::COL_MINIMUM_WIDTH).unwrap_or(blocks::MINIMUM_COL_WIDTH)
    }

    fn child_index(&self, col: usize, row: usize) -> Result<usize, DocumentError> {
        self.index
            .get(&(col, row))
            .copied()
            .ok_or_else(|| grid_error(format!("no cell at ({col}, {row})")))
    }

    /// The cell node at `(col, row)`.
    pub fn cell(&self, col: usize, row: usize) -> Result<&'a Node, DocumentError> {
        Ok(&self.table.children()[self.child_index(col, row)?])
    }

    /// The document path of the cell at `(col, row)`.
    pub fn cell_path(&self, col: usize, row: usize) -> Result<Path, DocumentError> {
        Ok(self.path.child(self.child_index(col, row)?))
    }

    /// Wrap-around navigation: a horizontal step past either edge of a row
    /// carries into the adjacent row. `None` when the carry leaves the grid.
    pub fn navigate(
        &self,
        col: usize,
        row: usize,
        col_delta: isize,
        row_delta: isize,
    ) -> Option<(usize, usize)> {
        let cols = self.cols as isize;
        let stepped = col as isize + col_delta;
        let next_col = stepped.rem_euclid(cols) as usize;
        let next_row = row as isize + row_delta + stepped.div_euclid(cols);
        if next_row < 0 || next_row >= self.rows as isize {
            return None;
        }
        Some((next_col, next_row as usize))
    }

    /// Non-wrapping movement; `None` past any edge.
    pub fn step(
        &self,
        col: usize,
        row: usize,
        col_delta: isize,
        row_delta: isize,
    ) -> Option<(usize, usize)> {
        let next_col = col.checked_add_signed(col_delta)?;
        let next_row = row.checked_add_signed(row_delta)?;
        (next_col < self.cols && next_row < self.rows).then_some((next_col, next_row))
    }

    /// Resolves the background color of a cell. Precedence: a caller-supplied
    /// override, then the cell's column-level color, then its row-level color.
    pub fn effective_background(
        &self,
        col: usize,
        row: usize,
        override_color: Option<&str>,
    ) -> Result<Option<String>, DocumentError> {
        if let Some(color) = override_color {
            return Ok(Some(color.to_string()));
        }
        let cell = self.cell(col, row)?;
        for key in [keys::COL_BACKGROUND, keys::ROW_BACKGROUND] {
            if let Some(color) = cell.attribute(key).and_then(Value::as_str) {
                return Ok(Some(color.to_string()));
            }
        }
        Ok(None)
    }

    /// Inserts an empty row so it becomes row `at` (0..=rows).
    pub fn add_row(&self, at: usize) -> Result<Transaction, DocumentError> {
        if at > self.rows {
            return Err(grid_error(format!("row {at} is past the grid")));
        }
        let mut tx = TransactionBuilder::new();
        // Renumber before inserting: the updates address the current child
        // indices, the inserts the final ones.
        for (&(_, row), &child_index) in &self.index {
            if row >= at {
                tx = tx.update_attributes(
                    self.path.child(child_index),
                    attr_map(keys::ROW_POSITION, json!((row + 1) as u64)),
                );
            }
        }
        tx = tx.update_attributes(
            self.path.clone(),
            attr_map(keys::ROWS_LEN, json!((self.rows + 1) as u64)),
        );
        for col in 0..self.cols {
            let width = attr_f64(self.cell(col, 0)?, keys::WIDTH)
                .unwrap_or_else(|| self.col_default_width());
            let cell = blocks::table_cell(col, at)
                .with_attribute(keys::WIDTH, json!(width))
                .with_attribute(keys::HEIGHT, json!(self.row_default_height()));
            tx = tx.insert_node(self.path.child(col * (self.rows + 1) + at), cell);
        }
        Ok(tx.build())
    }

    /// Inserts an empty column so it becomes column `at` (0..=cols).
    pub fn add_col(&self, at: usize) -> Result<Transaction, DocumentError> {
        if at > self.cols {
            return Err(grid_error(format!("column {at} is past the grid")));
        }
        let mut tx = TransactionBuilder::new();
        for (&(col, _), &child_index) in &self.index {
            if col >= at {
                tx = tx.update_attributes(
                    self.path.child(child_index),
                    attr_map(keys::COL_POSITION, json!((col + 1) as u64)),
                );
            }
        }
        tx = tx.update_attributes(
            self.path.clone(),
            attr_map(keys::COLS_LEN, json!((self.cols + 1) as u64)),
        );
        for row in 0..self.rows {
            let height = attr_f64(self.cell(0, row)?, keys::HEIGHT)
                .unwrap_or_else(|| self.row_default_height());
            let cell = blocks::table_cell(at, row)
                .with_attribute(keys::WIDTH, json!(self.col_default_width()))
                .with_attribute(keys::HEIGHT, json!(height));
            tx = tx.insert_node(self.path.child(at * self.rows + row), cell);
        }
        Ok(tx.build())
    }

    /// Removes row `at`. A table keeps at least one row.
    pub fn remove_row(&self, at: usize) -> Result<Transaction, DocumentError> {
        if at >= self.rows {
            return Err(grid_error(format!("row {at} is past the grid")));
        }
        if self.rows == 1 {
            return Err(grid_error("a table keeps at least one row"));
        }
        let mut removed: Vec<usize> = (0..self.cols)
            .map(|col| self.child_index(col, at))
            .collect::<Result<_, _>>()?;
        removed.sort_unstable();
        let mut tx = TransactionBuilder::new();
        for &child_index in removed.iter().rev() {
            tx = tx.delete_node(self.path.child(child_index));
        }
        // Remaining cells below the removed row, addressed post-deletion.
        for (&(_, row), &child_index) in &self.index {
            if row > at {
                let shifted = child_index - removed.iter().filter(|&&d| d < child_index).count();
                tx = tx.update_attributes(
                    self.path.child(shifted),
                    attr_map(keys::ROW_POSITION, json!((row - 1) as u64)),
                );
            }
        }
        tx = tx.update_attributes(
            self.path.clone(),
            attr_map(keys::ROWS_LEN, json!((self.rows - 1) as u64)),
        );
        Ok(tx.build())
    }

    /// Removes column `at`. A table keeps at least one column.
    pub fn remove_col(&self, at: usize) -> Result<Transaction, DocumentError> {
        if at >= self.cols {
            return Err(grid_error(format!("column {at} is past the grid")));
        }
        if self.cols == 1 {
            return Err(grid_error("a table keeps at least one column"));
        }
        let mut removed: Vec<usize> = (0..self.rows)
            .map(|row| self.child_index(at, row))
            .collect::<Result<_, _>>()?;
        removed.sort_unstable();
        let mut tx = TransactionBuilder::new();
        for &child_index in removed.iter().rev() {
            tx = tx.delete_node(self.path.child(child_index));
        }
        for (&(col, _), &child_index) in &self.index {
            if col > at {
                let shifted = child_index - removed.iter().filter(|&&d| d < child_index).count();
                tx = tx.update_attributes(
                    self.path.child(shifted),
                    attr_map(keys::COL_POSITION, json!((col - 1) as u64)),
                );
            }
        }
        tx = tx.update_attributes(
            self.path.clone(),
            attr_map(keys::COLS_LEN, json!((self.cols - 1) as u64)),
        );
        Ok(tx.build())
    }

    /// Inserts a copy of row `at` (content and per-cell attributes) below it.
    pub fn duplicate_row(&self, at: usize) -> Result<Transaction, DocumentError> {
        if at >= self.rows {
            return Err(grid_error(format!("row {at} is past the grid")));
        }
        let mut tx = TransactionBuilder::new();
        for (&(_, row), &child_index) in &self.index {
            if row > at {
                tx = tx.update_attributes(
                    self.path.child(child_index),
                    attr_map(keys::ROW_POSITION, json!((row + 1) as u64)),
                );
            }
        }
        tx = tx.update_attributes(
            self.path.clone(),
            attr_map(keys::ROWS_LEN, json!((self.rows + 1) as u64)),
        );
        for col in 0..self.cols {
            let copy = self
                .cell(col, at)?
                .copy_with(&attr_map(keys::ROW_POSITION, json!((at + 1) as u64)));
            tx = tx.insert_node(self.path.child(col * (self.rows + 1) + at + 1), copy);
        }
        Ok(tx.build())
    }

    /// Inserts a copy of column `at` to its right.
    pub fn duplicate_col(&self, at: usize) -> Result<Transaction, DocumentError> {
        if at >= self.cols {
            return Err(grid_error(format!("column {at} is past the grid")));
        }
        let mut tx = TransactionBuilder::new();
        for (&(col, _), &child_index) in &self.index {
            if col > at {
                tx = tx.update_attributes(
                    self.path.child(child_index),
                    attr_map(keys::COL_POSITION, json!((col + 1) as u64)),
                );
            }
        }
        tx = tx.update_attributes(
            self.path.clone(),
            attr_map(keys::COLS_LEN, json!((self.cols + 1) as u64)),
        );
        for row in 0..self.rows {
            let copy = self
                .cell(at, row)?
                .copy_with(&attr_map(keys::COL_POSITION, json!((at + 1) as u64)));
            tx = tx.insert_node(self.path.child((at + 1) * self.rows + row), copy);
        }
        Ok(tx.build())
    }

    /// Deletes the text content of every cell in row `at`.
    pub fn clear_row(&self, at: usize) -> Result<Transaction, DocumentError> {
        if at >= self.rows {
            return Err(grid_error(format!("row {at} is past the grid")));
        }
        let mut tx = TransactionBuilder::new();
        for col in 0..self.cols {
            let length = self.cell(col, at)?.delta().map_or(0, Delta::length);
            if length > 0 {
                tx = tx.text_edit(self.cell_path(col, at)?, Delta::new().delete(length));
            }
        }
        Ok(tx.build())
    }

    /// Deletes the text content of every cell in column `at`.
    pub fn clear_col(&self, at: usize) -> Result<Transaction, DocumentError> {
        if at >= self.cols {
            return Err(grid_error(format!("column {at} is past the grid")));
        }
        let mut tx = TransactionBuilder::new();
        for row in 0..self.rows {
            let length = self.cell(at, row)?.delta().map_or(0, Delta::length);
            if length > 0 {
                tx = tx.text_edit(self.cell_path(at, row)?, Delta::new().delete(length));
            }
        }
        Ok(tx.build())
    }

    /// Sets the width of every cell in column `col`, clamped to the table's
    /// minimum column width.
    pub fn set_col_width(&self, col: usize, width: f64) -> Result<Transaction, DocumentError> {
        if col >= self.cols {
            return Err(grid_error(format!("column {col} is past the grid")));
        }
        let width = width.max(self.col_minimum_width());
        let mut tx = TransactionBuilder::new();
        for row in 0..self.rows {
            tx = tx.update_attributes(
                self.cell_path(col, row)?,
                attr_map(keys::WIDTH, json!(width)),
            );
        }
        Ok(tx.build())
    }

    /// Sets the height of every cell in row `row`.
    pub fn set_row_height(&self, row: usize, height: f64) -> Result<Transaction, DocumentError> {
        if row >= self.rows {
            return Err(grid_error(format!("row {row} is past the grid")));
        }
        let mut tx = TransactionBuilder::new();
        for col in 0..self.cols {
            tx = tx.update_attributes(
                self.cell_path(col, row)?,
                attr_map(keys::HEIGHT, json!(height)),
            );
        }
        Ok(tx.build())
    }

    /// Sets (or clears, with `None`) the column-level background color of
    /// every cell in column `col`.
    pub fn set_col_background(
        &self,
        col: usize,
        color: Option<&str>,
    ) -> Result<Transaction, DocumentError> {
        if col >= self.cols {
            return Err(grid_error(format!("column {col} is past the grid")));
        }
        let value = color.map_or(Value::Null, |c| json!(c));
        let mut tx = TransactionBuilder::new();
        for row in 0..self.rows {
            tx = tx.update_attributes(
                self.cell_path(col, row)?,
                attr_map(keys::COL_BACKGROUND, value.clone()),
            );
        }
        Ok(tx.build())
    }

    /// Sets (or clears, with `None`) the row-level background color of every
    /// cell in row `row`.
    pub fn set_row_background(
        &self,
        row: usize,
        color: Option<&str>,
    ) -> Result<Transaction, DocumentError> {
        if row >= self.rows {
            return Err(grid_error(format!("row {row} is past the grid")));
        }
        let value = color.map_or(Value::Null, |c| json!(c));
        let mut tx = TransactionBuilder::new();
        for col in 0..self.cols {
            tx = tx.update_attributes(
                self.cell_path(col, row)?,
                attr_map(keys::ROW_BACKGROUND, value.clone()),
            );
        }
        Ok(tx.build())
    }
}

/// Measures rendered cell content. The view layer implements this; tests use
/// a fixed-height stub.
pub trait CellGeometry {
    /// Content height of the cell at `path`, in logical pixels, excluding
    /// padding.
    fn content_height(&self, document: &Document, path: &Path) -> f64;
}

/// Reconciles row heights after edits by draining the document's dirty-path
/// queue.
///
/// A row's height is the maximum of `content height + padding` over its
/// cells; every cell in the row is set to that height in one transaction per
/// table. Re-running with unchanged content applies nothing, so the dirty
/// paths an application marks do not loop.
pub struct RowHeightScheduler {
    padding: f64,
}

impl RowHeightScheduler {
    pub fn new(padding: f64) -> Self {
        Self { padding }
    }

    /// Drains dirty paths and reconciles every row a dirty cell belongs to.
    /// Returns the number of transactions applied.
    pub fn process(
        &self,
        document: &mut Document,
        geometry: &dyn CellGeometry,
    ) -> Result<usize, DocumentError> {
        let mut by_table: BTreeMap<Path, Vec<usize>> = BTreeMap::new();
        for path in document.take_dirty() {
            let Ok(node) = document.node_at_path(&path) else {
                continue;
            };
            if node.node_type() != blocks::types::TABLE_CELL {
                continue;
            }
            let (Some(table_path), Some(row)) = (path.parent(), attr_usize(node, keys::ROW_POSITION))
            else {
                continue;
            };
            by_table.entry(table_path).or_default().push(row);
        }

        let mut applied = 0;
        for (table_path, mut rows) in by_table {
            rows.sort_unstable();
            rows.dedup();
            let tx = {
                let view = TableView::new(document, table_path)?;
                let mut tx = TransactionBuilder::new();
                for &row in &rows {
                    if row >= view.rows() {
                        continue;
                    }
                    let mut target = 0f64;
                    for col in 0..view.cols() {
                        let cell_path = view.cell_path(col, row)?;
                        target = target.max(geometry.content_height(document, &cell_path));
                    }
                    let target = target + self.padding;
                    for col in 0..view.cols() {
                        let current = attr_f64(view.cell(col, row)?, keys::HEIGHT)
                            .unwrap_or_else(|| view.row_default_height());
                        if (current - target).abs() > f64::EPSILON {
                            tx = tx.update_attributes(
                                view.cell_path(col, row)?,
                                attr_map(keys::HEIGHT, json!(target)),
                            );
                        }
                    }
                }
                tx.build()
            };
            if !tx.is_empty() {
                document.apply(tx)?;
                applied += 1;
            }
        }
        Ok(applied)
    }
}
