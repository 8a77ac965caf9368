//! Shortcut dispatch: markdown-style character triggers and table key
//! commands.
//!
//! Character shortcuts fire when the text from the start of a paragraph to
//! the caret matches a trigger pattern; the first matching rule wins and the
//! dispatcher returns a transaction converting the block, carrying the text
//! after the caret into the converted block. Key commands cover caret
//! movement and deletion inside table cells.
//!
//! The dispatcher never mutates the document. Callers apply the returned
//! transaction (or swallow the key, for [`ShortcutResult::Suppressed`]).

use blockdoc_core::blocks::{self, keys};
use blockdoc_core::{
    Document, DocumentError, Node, Path, Position, Selection, Transaction, TransactionBuilder,
};
use blockdoc_delta::Delta;
use regex::{Captures, Regex};

use crate::table::TableView;

/// What a shortcut decided about an input event.
#[derive(Debug, Clone, PartialEq)]
pub enum ShortcutResult {
    /// The event maps to this transaction; apply it and consume the event.
    Handled(Transaction),
    /// Consume the event without any document change.
    Suppressed,
    /// Not a shortcut; let the event fall through to normal editing.
    Ignored,
}

/// A key the command shortcuts care about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Enter,
    Tab,
    Backspace,
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyStroke {
    pub key: Key,
    pub shift: bool,
}

impl KeyStroke {
    pub fn plain(key: Key) -> Self {
        Self { key, shift: false }
    }

    pub fn shifted(key: Key) -> Self {
        Self { key, shift: true }
    }
}

/// How a matched character trigger rewrites the current block.
enum Conversion {
    /// A text-bearing replacement absorbing the remainder text.
    Replace(Node),
    /// A structural block; any remainder text stays behind in the original
    /// block with the trigger prefix stripped.
    InsertBefore(Node),
}

struct CharacterRule {
    pattern: Regex,
    build: fn(&Captures<'_>, Delta) -> Conversion,
}

impl CharacterRule {
    fn new(pattern: &str, build: fn(&Captures<'_>, Delta) -> Conversion) -> Self {
        Self {
            // Patterns are compile-time literals.
            pattern: Regex::new(pattern).expect("static trigger pattern"),
            build,
        }
    }
}

fn build_heading(caps: &Captures<'_>, remainder: Delta) -> Conversion {
    Conversion::Replace(blocks::heading(caps[1].len() as u8, remainder))
}

fn build_bulleted(_caps: &Captures<'_>, remainder: Delta) -> Conversion {
    Conversion::Replace(blocks::bulleted_list(remainder))
}

fn build_numbered(caps: &Captures<'_>, remainder: Delta) -> Conversion {
    Conversion::Replace(blocks::numbered_list(caps[1].parse().unwrap_or(1), remainder))
}

fn build_quote(_caps: &Captures<'_>, remainder: Delta) -> Conversion {
    Conversion::Replace(blocks::quote(remainder))
}

fn build_todo(caps: &Captures<'_>, remainder: Delta) -> Conversion {
    Conversion::Replace(blocks::todo_list(&caps[1] == "x", remainder))
}

fn build_code(_caps: &Captures<'_>, remainder: Delta) -> Conversion {
    Conversion::Replace(blocks::code_block("", remainder))
}

fn build_divider(_caps: &Captures<'_>, _remainder: Delta) -> Conversion {
    Conversion::InsertBefore(blocks::divider())
}

fn build_image(caps: &Captures<'_>, _remainder: Delta) -> Conversion {
    Conversion::InsertBefore(blocks::image(&caps[2], &caps[1]))
}

fn build_table(caps: &Captures<'_>, _remainder: Delta) -> Conversion {
    // `|a|b| ` becomes a cols x 2 table with the header texts in row 0.
    let inner = caps[0].trim_end().trim_matches('|');
    let headers: Vec<&str> = inner.split('|').collect();
    let cols = headers.len();
    let mut cells = Vec::with_capacity(cols * 2);
    for (col, header) in headers.iter().enumerate() {
        cells.push(blocks::table_cell(col, 0).with_delta(Delta::new().insert(header.trim())));
        cells.push(blocks::table_cell(col, 1));
    }
    Conversion::InsertBefore(blocks::table_from_cells(cols, 2, cells))
}

/// Matches input events against the built-in shortcut set.
pub struct ShortcutDispatcher {
    rules: Vec<CharacterRule>,
}

impl Default for ShortcutDispatcher {
    fn default() -> Self {
        Self::standard()
    }
}

impl ShortcutDispatcher {
    /// The built-in rule set. Order matters: the first match wins.
    pub fn standard() -> Self {
        Self {
            rules: vec![
                CharacterRule::new(r"^(#{1,6}) $", build_heading),
                CharacterRule::new(r"^\[( |x)\] $", build_todo),
                CharacterRule::new(r"^[-*+] $", build_bulleted),
                CharacterRule::new(r"^(\d+)[.)] $", build_numbered),
                CharacterRule::new(r#"^[>"] $"#, build_quote),
                CharacterRule::new(r"^!\[([^\]]*)\]\(([^)]+)\)$", build_image),
                CharacterRule::new(r"^``` $", build_code),
                CharacterRule::new(r"^(-{3}|\*{3}|_{3})$", build_divider),
                CharacterRule::new(r"^\|(?:[^|]+\|)+ $", build_table),
            ],
        }
    }

    /// Runs the character triggers after an insertion left the caret at
    /// `caret`. Only paragraphs convert; everything else is [`ShortcutResult::Ignored`].
    pub fn on_character(
        &self,
        document: &Document,
        caret: &Position,
    ) -> Result<ShortcutResult, DocumentError> {
        let Some(shifted) = caret.path.next_sibling() else {
            return Ok(ShortcutResult::Ignored);
        };
        let node = document.node_at_path(&caret.path)?;
        if node.node_type() != blocks::types::PARAGRAPH {
            return Ok(ShortcutResult::Ignored);
        }
        let Some(delta) = node.delta() else {
            return Ok(ShortcutResult::Ignored);
        };
        let offset = caret.offset.min(delta.length());
        let prefix: String = delta.document_text().chars().take(offset).collect();
        for rule in &self.rules {
            let Some(caps) = rule.pattern.captures(&prefix) else {
                continue;
            };
            let remainder = delta.slice(offset, delta.length());
            let keeps_remainder = remainder.length() > 0;
            let tx = match (rule.build)(&caps, remainder) {
                Conversion::Replace(block) => replace_block(caret, &shifted, block),
                Conversion::InsertBefore(block) if keeps_remainder => TransactionBuilder::new()
                    .insert_node(caret.path.clone(), block)
                    .text_edit(shifted.clone(), Delta::new().delete(offset))
                    .after_selection(Selection::collapsed(Position::new(shifted.clone(), 0)))
                    .build(),
                Conversion::InsertBefore(block) => replace_block(caret, &shifted, block),
            };
            return Ok(ShortcutResult::Handled(tx));
        }
        Ok(ShortcutResult::Ignored)
    }

    /// Runs the key commands against the document's current selection. All
    /// of them act inside table cells; outside one the event is
    /// [`ShortcutResult::Ignored`].
    pub fn on_key(
        &self,
        document: &Document,
        stroke: KeyStroke,
    ) -> Result<ShortcutResult, DocumentError> {
        let Some(selection) = document.selection() else {
            return Ok(ShortcutResult::Ignored);
        };
        let Some(cell_path) = enclosing_cell(document, &selection.start().path) else {
            return Ok(ShortcutResult::Ignored);
        };
        let cell = document.node_at_path(&cell_path)?;
        let (Some(col), Some(row)) = (
            attr_usize(cell, keys::COL_POSITION),
            attr_usize(cell, keys::ROW_POSITION),
        ) else {
            return Ok(ShortcutResult::Ignored);
        };
        let Some(table_path) = cell_path.parent() else {
            return Ok(ShortcutResult::Ignored);
        };
        let view = TableView::new(document, table_path)?;

        let target = match stroke.key {
            Key::Tab => view.navigate(col, row, if stroke.shift { -1 } else { 1 }, 0),
            Key::Enter => view.step(col, row, 0, 1),
            Key::ArrowLeft => view.step(col, row, -1, 0),
            Key::ArrowRight => view.step(col, row, 1, 0),
            Key::ArrowUp => view.step(col, row, 0, -1),
            Key::ArrowDown => view.step(col, row, 0, 1),
            Key::Backspace => {
                // Swallow backspace in an empty cell so the cell itself
                // survives; a non-empty cell deletes text normally.
                return Ok(if cell.delta().map_or(0, Delta::length) == 0 {
                    ShortcutResult::Suppressed
                } else {
                    ShortcutResult::Ignored
                });
            }
        };
        let Some((next_col, next_row)) = target else {
            return Ok(ShortcutResult::Ignored);
        };
        let tx = TransactionBuilder::new()
            .after_selection(Selection::collapsed(Position::new(
                view.cell_path(next_col, next_row)?,
                0,
            )))
            .build();
        Ok(ShortcutResult::Handled(tx))
    }
}

fn replace_block(caret: &Position, shifted: &Path, block: Node) -> Transaction {
    TransactionBuilder::new()
        .insert_node(caret.path.clone(), block)
        .delete_node(shifted.clone())
        .after_selection(Selection::collapsed(Position::new(caret.path.clone(), 0)))
        .build()
}

/// The deepest table cell on the way to `path`, if any.
fn enclosing_cell(document: &Document, path: &Path) -> Option<Path> {
    let mut node = document.root();
    let mut found = None;
    for (depth, &index) in path.steps().iter().enumerate() {
        node = node.children().get(index)?;
        if node.node_type() == blocks::types::TABLE_CELL {
            found = Some(depth + 1);
        }
    }
    found.map(|depth| Path::new(path.steps()[..depth].to_vec()))
}

fn attr_usize(node: &Node, key: &str) -> Option<usize> {
    node.attribute(key)?.as_u64().map(|v| v as usize)
}
