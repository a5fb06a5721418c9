#![forbid(unsafe_code)]

use std::cmp::Ordering;

use domedit_dom::{Document, DomError, NodeId, Position, Selection};

use crate::command::{CommandBase, Step};
use crate::composite::CompositeEditCommand;
use crate::error::{EditError, EditResult};
use crate::primitive::{DeleteTextCommand, RemoveNodeCommand};

// ============================================================================
// DeleteSelectionCommand
// ============================================================================

/// Delete everything inside a range selection.
///
/// The partially selected text at either end is trimmed and every node
/// lying wholly inside the range is removed. The caret ends at the start
/// of the range. A collapsed or missing selection deletes nothing.
#[derive(Debug)]
pub struct DeleteSelectionCommand {
    composite: CompositeEditCommand,
}

impl DeleteSelectionCommand {
    #[must_use]
    pub fn new(doc: &Document) -> Self {
        Self {
            composite: CompositeEditCommand::new(doc, "Delete Selection"),
        }
    }
}

fn delete_range(
    composite: &mut CompositeEditCommand,
    doc: &mut Document,
    start: Position,
    end: Position,
) -> EditResult<()> {
    if start.node == end.node && doc.is_text(start.node)? {
        let count = end.offset.saturating_sub(start.offset);
        if count > 0 {
            let step = DeleteTextCommand::new(doc, start.node, start.offset, count);
            composite.apply_child(doc, step)?;
        }
        return Ok(());
    }

    let contained = doc.contained_nodes(start, end)?;
    if doc.is_text(start.node)? {
        let length = doc.text_len(start.node)?;
        if start.offset < length {
            let step = DeleteTextCommand::new(doc, start.node, start.offset, length - start.offset);
            composite.apply_child(doc, step)?;
        }
    }
    for node in contained {
        let step = RemoveNodeCommand::new(doc, node);
        composite.apply_child(doc, step)?;
    }
    if doc.is_text(end.node)? && end.offset > 0 {
        let step = DeleteTextCommand::new(doc, end.node, 0, end.offset);
        composite.apply_child(doc, step)?;
    }
    Ok(())
}

impl Step for DeleteSelectionCommand {
    fn base(&self) -> &CommandBase {
        self.composite.base()
    }

    fn base_mut(&mut self) -> &mut CommandBase {
        self.composite.base_mut()
    }

    fn do_apply(&mut self, doc: &mut Document) -> EditResult<()> {
        self.composite.build(doc, |composite, doc| {
            let Selection::Range { start, end } = composite.base().starting_selection() else {
                return Ok(());
            };
            let (start, end) = match doc.compare_positions(start, end)? {
                Ordering::Greater => (end, start),
                Ordering::Less | Ordering::Equal => (start, end),
            };
            delete_range(composite, doc, start, end)?;
            composite
                .base_mut()
                .set_ending_selection(Selection::Caret(start));
            Ok(())
        })
    }

    fn do_unapply(&mut self, doc: &mut Document) -> EditResult<()> {
        self.composite.unapply_children(doc)
    }

    fn do_reapply(&mut self, doc: &mut Document) -> EditResult<()> {
        self.composite.reapply_children(doc)
    }

    fn collect_nodes(&self, out: &mut Vec<NodeId>) {
        self.composite.collect_nodes(out);
    }

    fn discard_created(&mut self, doc: &mut Document) {
        self.composite.discard_created(doc);
    }

    fn name(&self) -> &'static str {
        "DeleteSelectionCommand"
    }

    fn description(&self) -> &str {
        "Delete Selection"
    }

    fn size_bytes(&self) -> usize {
        std::mem::size_of::<Self>() + self.composite.children_size()
    }
}

// ============================================================================
// DeleteKeyCommand
// ============================================================================

/// Backspace: delete the selection, or the character or leaf node before
/// the caret.
#[derive(Debug)]
pub struct DeleteKeyCommand {
    composite: CompositeEditCommand,
}

impl DeleteKeyCommand {
    #[must_use]
    pub fn new(doc: &Document) -> Self {
        Self {
            composite: CompositeEditCommand::new(doc, "Delete"),
        }
    }
}

/// Leaf immediately before the caret at `pos`, which is not inside text.
fn leaf_before(doc: &Document, pos: Position) -> EditResult<Option<NodeId>> {
    if doc.is_text(pos.node)? || pos.offset == 0 {
        return Ok(doc.previous_leaf(pos.node)?);
    }
    let children = doc.children(pos.node)?;
    let Some(&child) = children.get(pos.offset - 1) else {
        return Err(DomError::OffsetOutOfBounds {
            offset: pos.offset,
            length: children.len(),
        }
        .into());
    };
    let mut leaf = child;
    while let Some(&last) = doc.children(leaf)?.last() {
        leaf = last;
    }
    Ok(Some(leaf))
}

fn delete_backward(composite: &mut CompositeEditCommand, doc: &mut Document) -> EditResult<()> {
    let selection = composite.base().starting_selection();
    if selection.is_range() {
        let step = DeleteSelectionCommand::new(doc);
        return composite.apply_child(doc, step);
    }
    let pos = selection.start().ok_or(EditError::NoSelection)?;
    let in_text = doc.is_text(pos.node)?;
    if in_text && pos.offset > 0 {
        let step = DeleteTextCommand::new(doc, pos.node, pos.offset - 1, 1);
        return composite.apply_child(doc, step);
    }

    let Some(leaf) = leaf_before(doc, pos)? else {
        tracing::trace!(at = %pos, "nothing before the caret to delete");
        return Ok(());
    };
    if doc.is_text(leaf)? && doc.text_len(leaf)? > 0 {
        let length = doc.text_len(leaf)?;
        let step = DeleteTextCommand::new(doc, leaf, length - 1, 1);
        return composite.apply_child(doc, step);
    }
    let step = RemoveNodeCommand::new(doc, leaf);
    composite.apply_child(doc, step)?;
    if in_text {
        composite.base_mut().set_ending_selection(Selection::Caret(pos));
    }
    Ok(())
}

impl Step for DeleteKeyCommand {
    fn base(&self) -> &CommandBase {
        self.composite.base()
    }

    fn base_mut(&mut self) -> &mut CommandBase {
        self.composite.base_mut()
    }

    fn do_apply(&mut self, doc: &mut Document) -> EditResult<()> {
        self.composite.build(doc, delete_backward)
    }

    fn do_unapply(&mut self, doc: &mut Document) -> EditResult<()> {
        self.composite.unapply_children(doc)
    }

    fn do_reapply(&mut self, doc: &mut Document) -> EditResult<()> {
        self.composite.reapply_children(doc)
    }

    fn collect_nodes(&self, out: &mut Vec<NodeId>) {
        self.composite.collect_nodes(out);
    }

    fn discard_created(&mut self, doc: &mut Document) {
        self.composite.discard_created(doc);
    }

    fn name(&self) -> &'static str {
        "DeleteKeyCommand"
    }

    fn description(&self) -> &str {
        "Delete"
    }

    fn size_bytes(&self) -> usize {
        std::mem::size_of::<Self>() + self.composite.children_size()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::EditCommand;

    /// body > ["abc", p > ["def"], "ghi"]
    fn sample() -> (Document, NodeId, NodeId, NodeId, NodeId) {
        let mut doc = Document::new();
        let root = doc.root();
        let abc = doc.create_text("abc");
        let p = doc.create_element("p");
        let def = doc.create_text("def");
        let ghi = doc.create_text("ghi");
        doc.append_child(root, abc).unwrap();
        doc.append_child(root, p).unwrap();
        doc.append_child(p, def).unwrap();
        doc.append_child(root, ghi).unwrap();
        (doc, abc, p, def, ghi)
    }

    #[test]
    fn test_delete_selection_across_nodes() {
        let (mut doc, abc, p, _, ghi) = sample();
        let root = doc.root();
        let before = doc.snapshot(root).unwrap();
        let range = Selection::range(Position::new(abc, 1), Position::new(ghi, 2));
        doc.set_selection(range);

        let mut cmd = EditCommand::from(DeleteSelectionCommand::new(&doc));
        cmd.apply(&mut doc).unwrap();
        assert_eq!(doc.children(root).unwrap(), &[abc, ghi]);
        assert_eq!(doc.inner_html(root).unwrap(), "ai");
        assert_eq!(doc.selection(), Selection::caret(abc, 1));
        assert!(doc.contains(p));

        cmd.unapply(&mut doc).unwrap();
        assert_eq!(doc.snapshot(root).unwrap(), before);
        assert_eq!(doc.selection(), range);

        cmd.reapply(&mut doc).unwrap();
        assert_eq!(doc.inner_html(root).unwrap(), "ai");
    }

    #[test]
    fn test_delete_selection_within_text() {
        let (mut doc, abc, ..) = sample();
        doc.set_selection(Selection::range(Position::new(abc, 0), Position::new(abc, 2)));
        let mut cmd = EditCommand::from(DeleteSelectionCommand::new(&doc));
        cmd.apply(&mut doc).unwrap();
        assert_eq!(doc.text(abc).unwrap(), "c");
        assert_eq!(doc.selection(), Selection::caret(abc, 0));
    }

    #[test]
    fn test_delete_selection_reversed_range() {
        let (mut doc, _, _, def, ghi) = sample();
        let root = doc.root();
        doc.set_selection(Selection::Range {
            start: Position::new(ghi, 1),
            end: Position::new(def, 1),
        });
        let mut cmd = EditCommand::from(DeleteSelectionCommand::new(&doc));
        cmd.apply(&mut doc).unwrap();
        assert_eq!(doc.inner_html(root).unwrap(), "abc<p>d</p>hi");
        assert_eq!(doc.selection(), Selection::caret(def, 1));
    }

    #[test]
    fn test_delete_selection_with_caret_is_noop() {
        let (mut doc, abc, ..) = sample();
        let root = doc.root();
        doc.set_selection(Selection::caret(abc, 1));
        let mut cmd = EditCommand::from(DeleteSelectionCommand::new(&doc));
        cmd.apply(&mut doc).unwrap();
        assert_eq!(doc.inner_html(root).unwrap(), "abc<p>def</p>ghi");
        assert_eq!(doc.selection(), Selection::caret(abc, 1));
    }

    #[test]
    fn test_backspace_in_text() {
        let (mut doc, abc, ..) = sample();
        doc.set_selection(Selection::caret(abc, 2));
        let mut cmd = EditCommand::from(DeleteKeyCommand::new(&doc));
        cmd.apply(&mut doc).unwrap();
        assert_eq!(doc.text(abc).unwrap(), "ac");
        assert_eq!(doc.selection(), Selection::caret(abc, 1));
        cmd.unapply(&mut doc).unwrap();
        assert_eq!(doc.text(abc).unwrap(), "abc");
        assert_eq!(doc.selection(), Selection::caret(abc, 2));
    }

    #[test]
    fn test_backspace_at_text_start_deletes_previous_leaf_char() {
        let (mut doc, _, _, def, ghi) = sample();
        doc.set_selection(Selection::caret(ghi, 0));
        let mut cmd = EditCommand::from(DeleteKeyCommand::new(&doc));
        cmd.apply(&mut doc).unwrap();
        assert_eq!(doc.text(def).unwrap(), "de");
        assert_eq!(doc.selection(), Selection::caret(def, 2));
    }

    #[test]
    fn test_backspace_removes_line_break() {
        let mut doc = Document::new();
        let root = doc.root();
        let ab = doc.create_text("ab");
        let br = doc.create_element("br");
        let cd = doc.create_text("cd");
        doc.append_child(root, ab).unwrap();
        doc.append_child(root, br).unwrap();
        doc.append_child(root, cd).unwrap();
        doc.set_selection(Selection::caret(cd, 0));

        let mut cmd = EditCommand::from(DeleteKeyCommand::new(&doc));
        cmd.apply(&mut doc).unwrap();
        assert_eq!(doc.children(root).unwrap(), &[ab, cd]);
        assert_eq!(doc.selection(), Selection::caret(cd, 0));

        cmd.unapply(&mut doc).unwrap();
        assert_eq!(doc.children(root).unwrap(), &[ab, br, cd]);
    }

    #[test]
    fn test_backspace_at_element_position() {
        let mut doc = Document::new();
        let root = doc.root();
        let img = doc.create_element("img");
        let x = doc.create_text("x");
        doc.append_child(root, img).unwrap();
        doc.append_child(root, x).unwrap();
        doc.set_selection(Selection::caret(root, 1));

        let mut cmd = EditCommand::from(DeleteKeyCommand::new(&doc));
        cmd.apply(&mut doc).unwrap();
        assert_eq!(doc.children(root).unwrap(), &[x]);
        assert_eq!(doc.selection(), Selection::caret(root, 0));
    }

    #[test]
    fn test_backspace_at_document_start_is_noop() {
        let (mut doc, abc, ..) = sample();
        let root = doc.root();
        doc.set_selection(Selection::caret(abc, 0));
        let mut cmd = EditCommand::from(DeleteKeyCommand::new(&doc));
        cmd.apply(&mut doc).unwrap();
        assert_eq!(doc.inner_html(root).unwrap(), "abc<p>def</p>ghi");
        assert_eq!(doc.selection(), Selection::caret(abc, 0));
    }

    #[test]
    fn test_backspace_deletes_range() {
        let (mut doc, abc, _, _, ghi) = sample();
        let root = doc.root();
        doc.set_selection(Selection::range(Position::new(abc, 2), Position::new(ghi, 1)));
        let mut cmd = EditCommand::from(DeleteKeyCommand::new(&doc));
        cmd.apply(&mut doc).unwrap();
        assert_eq!(doc.inner_html(root).unwrap(), "abhi");
        assert_eq!(doc.selection(), Selection::caret(abc, 2));
    }

    #[test]
    fn test_backspace_without_selection() {
        let (mut doc, ..) = sample();
        let mut cmd = EditCommand::from(DeleteKeyCommand::new(&doc));
        assert_eq!(cmd.apply(&mut doc).unwrap_err(), EditError::NoSelection);
    }
}
