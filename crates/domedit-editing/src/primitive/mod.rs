#![forbid(unsafe_code)]

//! Single-step commands over the document primitives.
//!
//! Each command records exactly what it needs to reverse itself: deleted
//! text, the node created by a split, the position a node was moved or
//! removed from. Undo verifies the recorded state still matches the tree
//! before touching it and reports [`EditError::StateDrift`] otherwise.
//!
//! [`EditError::StateDrift`]: crate::EditError::StateDrift

mod text;
mod tree;

pub use text::{DeleteTextCommand, InsertTextCommand, JoinTextNodesCommand, SplitTextNodeCommand};
pub use tree::{AppendNodeCommand, InsertNodeBeforeCommand, RemoveNodeCommand};

use domedit_dom::{Document, NodeId, Selection};

use crate::error::{EditError, EditResult};

/// Caret right after `node` in its parent, or `fallback` when detached.
pub(crate) fn caret_after(doc: &Document, node: NodeId, fallback: Selection) -> EditResult<Selection> {
    Ok(doc
        .position_after(node)?
        .map_or(fallback, Selection::Caret))
}

/// Parent of `node`, which must be attached.
pub(crate) fn attached_parent(doc: &Document, node: NodeId) -> EditResult<NodeId> {
    doc.parent(node)?.ok_or(EditError::DetachedNode(node))
}

/// Fail with [`EditError::StateDrift`] unless `actual == expected`.
pub(crate) fn expect_text(expected: &str, actual: &str) -> EditResult<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(EditError::StateDrift {
            expected: expected.to_string(),
            actual: actual.to_string(),
        })
    }
}
