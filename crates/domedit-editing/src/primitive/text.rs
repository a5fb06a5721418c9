#![forbid(unsafe_code)]

//! Character-data commands: insert, delete, split and join.

use domedit_dom::{Document, NodeId, Selection, char_len};

use crate::command::{CommandBase, Step};
use crate::error::{EditError, EditResult};
use crate::primitive::{attached_parent, expect_text};

// ============================================================================
// InsertTextCommand
// ============================================================================

/// Insert a string into a text node at a character offset.
///
/// An applied insert can grow ([`coalesce`](Self::coalesce)) or shrink
/// ([`delete_character`](Self::delete_character)) at its end, which is how
/// consecutive keystrokes end up in one undo step.
#[derive(Debug)]
pub struct InsertTextCommand {
    base: CommandBase,
    node: NodeId,
    offset: usize,
    text: String,
}

impl InsertTextCommand {
    #[must_use]
    pub fn new(doc: &Document, node: NodeId, offset: usize, text: &str) -> Self {
        Self {
            base: CommandBase::new(doc),
            node,
            offset,
            text: text.to_string(),
        }
    }

    #[must_use]
    pub fn node(&self) -> NodeId {
        self.node
    }

    #[must_use]
    pub fn offset(&self) -> usize {
        self.offset
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    fn end_offset(&self) -> usize {
        self.offset + char_len(&self.text)
    }

    /// Append `text` to an applied insert, extending it in the document.
    pub fn coalesce(&mut self, doc: &mut Document, text: &str) -> EditResult<()> {
        self.base.require_applied(self.name(), "coalesce")?;
        self.base.check_document(doc)?;
        doc.insert_text(self.node, self.end_offset(), text)?;
        self.text.push_str(text);
        self.base
            .set_ending_selection(Selection::caret(self.node, self.end_offset()));
        Ok(())
    }

    /// Remove the last inserted character. No-op once the insert is empty.
    pub fn delete_character(&mut self, doc: &mut Document) -> EditResult<()> {
        self.base.require_applied(self.name(), "delete a character")?;
        self.base.check_document(doc)?;
        let Some(last) = self.text.chars().last() else {
            return Ok(());
        };
        let at = self.end_offset() - 1;
        let removed = doc.substring(self.node, at, 1)?;
        expect_text(last.encode_utf8(&mut [0; 4]), &removed)?;
        doc.delete_text(self.node, at, 1)?;
        self.text.pop();
        self.base.set_ending_selection(Selection::caret(self.node, at));
        Ok(())
    }
}

impl Step for InsertTextCommand {
    fn base(&self) -> &CommandBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut CommandBase {
        &mut self.base
    }

    fn do_apply(&mut self, doc: &mut Document) -> EditResult<()> {
        doc.insert_text(self.node, self.offset, &self.text)?;
        self.base
            .set_ending_selection(Selection::caret(self.node, self.end_offset()));
        Ok(())
    }

    fn do_unapply(&mut self, doc: &mut Document) -> EditResult<()> {
        let count = char_len(&self.text);
        let current = doc.substring(self.node, self.offset, count)?;
        expect_text(&self.text, &current)?;
        doc.delete_text(self.node, self.offset, count)?;
        Ok(())
    }

    fn collect_nodes(&self, out: &mut Vec<NodeId>) {
        out.push(self.node);
    }

    fn name(&self) -> &'static str {
        "InsertTextCommand"
    }

    fn description(&self) -> &str {
        "Insert Text"
    }

    fn size_bytes(&self) -> usize {
        std::mem::size_of::<Self>() + self.text.len()
    }
}

// ============================================================================
// DeleteTextCommand
// ============================================================================

/// Delete `count` characters from a text node.
#[derive(Debug)]
pub struct DeleteTextCommand {
    base: CommandBase,
    node: NodeId,
    offset: usize,
    count: usize,
    deleted: String,
}

impl DeleteTextCommand {
    #[must_use]
    pub fn new(doc: &Document, node: NodeId, offset: usize, count: usize) -> Self {
        Self {
            base: CommandBase::new(doc),
            node,
            offset,
            count,
            deleted: String::new(),
        }
    }

    #[must_use]
    pub fn node(&self) -> NodeId {
        self.node
    }

    #[must_use]
    pub fn offset(&self) -> usize {
        self.offset
    }

    #[must_use]
    pub fn count(&self) -> usize {
        self.count
    }

    /// Text removed by the last apply.
    #[must_use]
    pub fn deleted_text(&self) -> &str {
        &self.deleted
    }
}

impl Step for DeleteTextCommand {
    fn base(&self) -> &CommandBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut CommandBase {
        &mut self.base
    }

    fn do_apply(&mut self, doc: &mut Document) -> EditResult<()> {
        self.deleted = doc.delete_text(self.node, self.offset, self.count)?;
        self.base
            .set_ending_selection(Selection::caret(self.node, self.offset));
        Ok(())
    }

    fn do_unapply(&mut self, doc: &mut Document) -> EditResult<()> {
        doc.insert_text(self.node, self.offset, &self.deleted)?;
        Ok(())
    }

    fn do_reapply(&mut self, doc: &mut Document) -> EditResult<()> {
        let current = doc.substring(self.node, self.offset, self.count)?;
        expect_text(&self.deleted, &current)?;
        doc.delete_text(self.node, self.offset, self.count)?;
        Ok(())
    }

    fn collect_nodes(&self, out: &mut Vec<NodeId>) {
        out.push(self.node);
    }

    fn name(&self) -> &'static str {
        "DeleteTextCommand"
    }

    fn description(&self) -> &str {
        "Delete Text"
    }

    fn size_bytes(&self) -> usize {
        std::mem::size_of::<Self>() + self.deleted.len()
    }
}

// ============================================================================
// SplitTextNodeCommand
// ============================================================================

/// Split a text node at a character offset.
///
/// The original node keeps the tail `[offset..]`; a new node holding the
/// head `[..offset]` is inserted right before it. Handles to the original
/// node therefore stay valid for the text after the caret.
#[derive(Debug)]
pub struct SplitTextNodeCommand {
    base: CommandBase,
    node: NodeId,
    offset: usize,
    head: Option<NodeId>,
}

impl SplitTextNodeCommand {
    #[must_use]
    pub fn new(doc: &Document, node: NodeId, offset: usize) -> Self {
        Self {
            base: CommandBase::new(doc),
            node,
            offset,
            head: None,
        }
    }

    /// The node that keeps the text after the split point.
    #[must_use]
    pub fn node(&self) -> NodeId {
        self.node
    }

    #[must_use]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// The node created for the text before the split point, once applied.
    #[must_use]
    pub fn head(&self) -> Option<NodeId> {
        self.head
    }

    fn missing_head(&self) -> EditError {
        EditError::InvalidState {
            command: self.name(),
            operation: "reverse a split that never ran",
            state: self.base.state(),
        }
    }
}

impl Step for SplitTextNodeCommand {
    fn base(&self) -> &CommandBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut CommandBase {
        &mut self.base
    }

    fn do_apply(&mut self, doc: &mut Document) -> EditResult<()> {
        let parent = attached_parent(doc, self.node)?;
        let prefix = doc.substring(self.node, 0, self.offset)?;
        let head = doc.create_text(&prefix);
        if let Err(err) = doc.insert_before(parent, head, Some(self.node)) {
            doc.destroy_node(head)?;
            return Err(err.into());
        }
        doc.delete_text(self.node, 0, self.offset)?;
        self.head = Some(head);
        self.base.set_ending_selection(Selection::caret(self.node, 0));
        Ok(())
    }

    fn do_unapply(&mut self, doc: &mut Document) -> EditResult<()> {
        let head = self.head.ok_or_else(|| self.missing_head())?;
        let prefix = doc.text(head)?.to_string();
        doc.remove_node(head)?;
        doc.insert_text(self.node, 0, &prefix)?;
        Ok(())
    }

    fn do_reapply(&mut self, doc: &mut Document) -> EditResult<()> {
        let head = self.head.ok_or_else(|| self.missing_head())?;
        let parent = attached_parent(doc, self.node)?;
        let prefix = doc.substring(self.node, 0, self.offset)?;
        expect_text(doc.text(head)?, &prefix)?;
        doc.insert_before(parent, head, Some(self.node))?;
        doc.delete_text(self.node, 0, self.offset)?;
        Ok(())
    }

    fn collect_nodes(&self, out: &mut Vec<NodeId>) {
        out.push(self.node);
        out.extend(self.head);
    }

    fn discard_created(&mut self, doc: &mut Document) {
        let Some(head) = self.head else {
            return;
        };
        if doc.contains(head) && matches!(doc.parent(head), Ok(None)) {
            if let Err(err) = doc.destroy_node(head) {
                tracing::warn!(node = %head, error = %err, "could not free split head");
                return;
            }
        }
        self.head = None;
    }

    fn name(&self) -> &'static str {
        "SplitTextNodeCommand"
    }

    fn description(&self) -> &str {
        "Split Text Node"
    }

    fn size_bytes(&self) -> usize {
        std::mem::size_of::<Self>()
    }
}

// ============================================================================
// JoinTextNodesCommand
// ============================================================================

/// Merge two adjacent sibling text nodes.
///
/// The text of `first` is prepended to `second` and `first` is detached.
/// The detached node keeps its data, so undo simply puts it back.
#[derive(Debug)]
pub struct JoinTextNodesCommand {
    base: CommandBase,
    first: NodeId,
    second: NodeId,
    offset: usize,
}

impl JoinTextNodesCommand {
    #[must_use]
    pub fn new(doc: &Document, first: NodeId, second: NodeId) -> Self {
        Self {
            base: CommandBase::new(doc),
            first,
            second,
            offset: 0,
        }
    }

    #[must_use]
    pub fn first(&self) -> NodeId {
        self.first
    }

    /// The surviving node.
    #[must_use]
    pub fn second(&self) -> NodeId {
        self.second
    }

    fn check_adjacent(&self, doc: &Document) -> EditResult<()> {
        if doc.next_sibling(self.first)? == Some(self.second) {
            Ok(())
        } else {
            Err(EditError::NotAdjacent {
                first: self.first,
                second: self.second,
            })
        }
    }
}

impl Step for JoinTextNodesCommand {
    fn base(&self) -> &CommandBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut CommandBase {
        &mut self.base
    }

    fn do_apply(&mut self, doc: &mut Document) -> EditResult<()> {
        self.check_adjacent(doc)?;
        // Both must be text before anything moves.
        doc.text(self.second)?;
        let data = doc.text(self.first)?.to_string();
        doc.remove_node(self.first)?;
        doc.insert_text(self.second, 0, &data)?;
        self.offset = char_len(&data);
        self.base
            .set_ending_selection(Selection::caret(self.second, self.offset));
        Ok(())
    }

    fn do_unapply(&mut self, doc: &mut Document) -> EditResult<()> {
        let parent = attached_parent(doc, self.second)?;
        let prefix = doc.substring(self.second, 0, self.offset)?;
        expect_text(doc.text(self.first)?, &prefix)?;
        doc.insert_before(parent, self.first, Some(self.second))?;
        doc.delete_text(self.second, 0, self.offset)?;
        Ok(())
    }

    fn collect_nodes(&self, out: &mut Vec<NodeId>) {
        out.extend([self.first, self.second]);
    }

    fn name(&self) -> &'static str {
        "JoinTextNodesCommand"
    }

    fn description(&self) -> &str {
        "Join Text Nodes"
    }

    fn size_bytes(&self) -> usize {
        std::mem::size_of::<Self>()
    }
}
