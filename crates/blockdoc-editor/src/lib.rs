//! Editing behaviors layered over `blockdoc-core`: markdown-style character
//! shortcuts, table key commands, and the table engine (grid edits,
//! wrap-around navigation, row-height reconciliation).
//!
//! Everything here is expressed as transactions for the core document to
//! apply; this crate never mutates a tree directly.

pub mod shortcuts;
pub mod table;

pub use shortcuts::{Key, KeyStroke, ShortcutDispatcher, ShortcutResult};
pub use table::{CellGeometry, RowHeightScheduler, TableView};
