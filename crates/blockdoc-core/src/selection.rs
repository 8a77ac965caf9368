//! Caret positions and selections.

use crate::Path;

/// A caret location: a node path plus an offset into the node.
///
/// For text-bearing nodes the offset is a delta-unit (codepoint) offset into
/// the node's text; for structural nodes it is a child index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Position {
    pub path: Path,
    pub offset: usize,
}

impl Position {
    pub fn new(path: impl Into<Path>, offset: usize) -> Self {
        Self {
            path: path.into(),
            offset,
        }
    }
}

/// A caret or range over the document, normalized so `start <= end` in
/// document order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Selection {
    start: Position,
    end: Position,
}

impl Selection {
    /// Builds a selection, swapping the endpoints if given backwards.
    pub fn new(a: Position, b: Position) -> Self {
        if a <= b {
            Self { start: a, end: b }
        } else {
            Self { start: b, end: a }
        }
    }

    /// A collapsed selection (caret) at `position`.
    pub fn collapsed(position: Position) -> Self {
        Self {
            start: position.clone(),
            end: position,
        }
    }

    /// A range within a single node.
    pub fn single(path: impl Into<Path>, start_offset: usize, end_offset: usize) -> Self {
        let path = path.into();
        Self::new(
            Position::new(path.clone(), start_offset),
            Position::new(path, end_offset),
        )
    }

    pub fn start(&self) -> &Position {
        &self.start
    }

    pub fn end(&self) -> &Position {
        &self.end
    }

    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }
}
