#![forbid(unsafe_code)]

//! Selection snapshots.
//!
//! A [`Selection`] is a captured caret or range, independent of the live
//! tree. Commands record one before and one after they mutate the document
//! and push them back into the document's live selection on undo/redo.
//!
//! Offsets follow DOM boundary-point rules: inside a text node they count
//! characters, inside an element they count children.

use std::fmt;

use crate::node::NodeId;

/// A boundary point: a node and an offset within it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    pub node: NodeId,
    pub offset: usize,
}

impl Position {
    #[must_use]
    pub const fn new(node: NodeId, offset: usize) -> Self {
        Self { node, offset }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.node, self.offset)
    }
}

/// Caret or range snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Selection {
    /// Nothing selected.
    #[default]
    None,
    /// A collapsed selection.
    Caret(Position),
    /// A non-collapsed selection; `start` precedes `end` in document order.
    Range { start: Position, end: Position },
}

impl Selection {
    /// Collapsed selection at `node`/`offset`.
    #[must_use]
    pub const fn caret(node: NodeId, offset: usize) -> Self {
        Self::Caret(Position::new(node, offset))
    }

    /// Range selection. Collapses to a caret when both ends coincide.
    #[must_use]
    pub fn range(start: Position, end: Position) -> Self {
        if start == end {
            Self::Caret(start)
        } else {
            Self::Range { start, end }
        }
    }

    #[must_use]
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    #[must_use]
    pub fn is_caret(&self) -> bool {
        matches!(self, Self::Caret(_))
    }

    #[must_use]
    pub fn is_range(&self) -> bool {
        matches!(self, Self::Range { .. })
    }

    /// Start boundary (the caret itself for collapsed selections).
    #[must_use]
    pub fn start(&self) -> Option<Position> {
        match *self {
            Self::None => None,
            Self::Caret(pos) => Some(pos),
            Self::Range { start, .. } => Some(start),
        }
    }

    /// End boundary (the caret itself for collapsed selections).
    #[must_use]
    pub fn end(&self) -> Option<Position> {
        match *self {
            Self::None => None,
            Self::Caret(pos) => Some(pos),
            Self::Range { end, .. } => Some(end),
        }
    }

    /// Collapse to the start boundary.
    #[must_use]
    pub fn collapsed_to_start(&self) -> Self {
        self.start().map_or(Self::None, Self::Caret)
    }

    /// Whether either boundary references `node`.
    #[must_use]
    pub fn references(&self, node: NodeId) -> bool {
        self.start().is_some_and(|p| p.node == node) || self.end().is_some_and(|p| p.node == node)
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Caret(pos) => write!(f, "caret({pos})"),
            Self::Range { start, end } => write!(f, "range({start}..{end})"),
        }
    }
}
