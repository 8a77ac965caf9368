//! Path addressing for the node tree.
//!
//! A path is the sequence of child indices from the document root to a node.
//! Paths are computed, never stored on nodes; after a structural mutation the
//! affected paths are recomputed by [`Path::transformed`].

use std::cmp::Ordering;
use std::fmt;

/// Sequence of child indices locating a node from the root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Path(Vec<usize>);

impl Path {
    /// The empty path addressing the root node.
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn new(steps: Vec<usize>) -> Self {
        Self(steps)
    }

    pub fn steps(&self) -> &[usize] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// The final child index, if this is not the root path.
    pub fn last(&self) -> Option<usize> {
        self.0.last().copied()
    }

    /// The path of this node's parent; `None` for the root.
    pub fn parent(&self) -> Option<Path> {
        if self.0.is_empty() {
            None
        } else {
            Some(Path(self.0[..self.0.len() - 1].to_vec()))
        }
    }

    /// Extends this path by one child index.
    pub fn child(&self, index: usize) -> Path {
        let mut steps = self.0.clone();
        steps.push(index);
        Path(steps)
    }

    pub fn next_sibling(&self) -> Option<Path> {
        let last = self.last()?;
        let mut steps = self.0.clone();
        *steps.last_mut()? = last + 1;
        Some(Path(steps))
    }

    pub fn previous_sibling(&self) -> Option<Path> {
        let last = self.last()?;
        if last == 0 {
            return None;
        }
        let mut steps = self.0.clone();
        *steps.last_mut()? = last - 1;
        Some(Path(steps))
    }

    /// `true` when `self` strictly contains `other` (equal paths excluded).
    pub fn is_ancestor_of(&self, other: &Path) -> bool {
        other.0.len() > self.0.len() && other.0[..self.0.len()] == self.0[..]
    }

    /// Re-addresses this path after a structural operation at `anchor`.
    ///
    /// Inserting a node at `anchor` (`delta = 1`) shifts every path at the
    /// anchor's level whose index there is at or past the anchor's; deleting
    /// (`delta = -1`) shifts them back. Paths elsewhere are unchanged.
    pub fn transformed(&self, anchor: &Path, delta: isize) -> Path {
        let Some(anchor_last) = anchor.last() else {
            return self.clone();
        };
        let level = anchor.len() - 1;
        if self.0.len() <= level
            || self.0[..level] != anchor.0[..level]
            || self.0[level] < anchor_last
        {
            return self.clone();
        }
        let mut steps = self.0.clone();
        steps[level] = steps[level].saturating_add_signed(delta);
        Path(steps)
    }
}

/// Document order: ancestors sort before their descendants, siblings by
/// index.
impl Ord for Path {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }
}

impl PartialOrd for Path {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "/");
        }
        for step in &self.0 {
            write!(f, "/{step}")?;
        }
        Ok(())
    }
}

impl From<Vec<usize>> for Path {
    fn from(steps: Vec<usize>) -> Self {
        Path(steps)
    }
}

impl<const N: usize> From<[usize; N]> for Path {
    fn from(steps: [usize; N]) -> Self {
        Path(steps.to_vec())
    }
}

impl FromIterator<usize> for Path {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        Path(iter.into_iter().collect())
    }
}
