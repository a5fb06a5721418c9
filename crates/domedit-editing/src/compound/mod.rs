#![forbid(unsafe_code)]

//! Commands built from primitives at apply time.
//!
//! Each of these owns a [`CompositeEditCommand`] and fills it from its
//! starting selection when applied. If any step fails the steps already
//! taken are undone and the command can be applied again from scratch.
//! Undo and redo replay the recorded steps and never rebuild them.

mod delete;
mod input;
mod paste;

pub use delete::{DeleteKeyCommand, DeleteSelectionCommand};
pub use input::{InputNewlineCommand, InputTextCommand};
pub use paste::{PasteHtmlCommand, PasteImageCommand};

use domedit_dom::{Document, NodeId, Position, Selection};

use crate::composite::CompositeEditCommand;
use crate::error::{EditError, EditResult};
use crate::primitive::{AppendNodeCommand, InsertNodeBeforeCommand, SplitTextNodeCommand};

/// Boundary point the next step should edit at.
///
/// A range selection is deleted first so the edit replaces it.
fn collapse_for_edit(composite: &mut CompositeEditCommand, doc: &mut Document) -> EditResult<Position> {
    if composite.base().ending_selection().is_range() {
        let step = DeleteSelectionCommand::new(doc);
        composite.apply_child(doc, step)?;
    }
    composite
        .base()
        .ending_selection()
        .start()
        .ok_or(EditError::NoSelection)
}

/// Insert a detached `node` at `pos`, splitting a text node when `pos` falls
/// strictly inside it. Returns the boundary point right after the node.
fn insert_node_at(
    composite: &mut CompositeEditCommand,
    doc: &mut Document,
    node: NodeId,
    pos: Position,
) -> EditResult<Position> {
    if doc.is_text(pos.node)? {
        let length = doc.text_len(pos.node)?;
        if pos.offset == 0 {
            let step = InsertNodeBeforeCommand::new(doc, node, pos.node);
            composite.apply_child(doc, step)?;
        } else if pos.offset == length {
            match doc.next_sibling(pos.node)? {
                Some(next) => {
                    let step = InsertNodeBeforeCommand::new(doc, node, next);
                    composite.apply_child(doc, step)?;
                }
                None => {
                    let parent = doc
                        .parent(pos.node)?
                        .ok_or(EditError::DetachedNode(pos.node))?;
                    let step = AppendNodeCommand::new(doc, parent, node);
                    composite.apply_child(doc, step)?;
                }
            }
        } else {
            let step = SplitTextNodeCommand::new(doc, pos.node, pos.offset);
            composite.apply_child(doc, step)?;
            let step = InsertNodeBeforeCommand::new(doc, node, pos.node);
            composite.apply_child(doc, step)?;
        }
    } else {
        match doc.children(pos.node)?.get(pos.offset).copied() {
            Some(reference) => {
                let step = InsertNodeBeforeCommand::new(doc, node, reference);
                composite.apply_child(doc, step)?;
            }
            None => {
                let step = AppendNodeCommand::new(doc, pos.node, node);
                composite.apply_child(doc, step)?;
            }
        }
    }
    doc.position_after(node)?
        .ok_or(EditError::DetachedNode(node))
}

/// Caret placed after an inserted node: at the start of a following text
/// node when there is one, otherwise at `after`.
fn caret_following(doc: &Document, node: NodeId, after: Position) -> EditResult<Selection> {
    if let Some(next) = doc.next_sibling(node)? {
        if doc.is_text(next)? {
            return Ok(Selection::caret(next, 0));
        }
    }
    Ok(Selection::Caret(after))
}
