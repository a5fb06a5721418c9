#![forbid(unsafe_code)]

use domedit_dom::{Document, NodeId, Position};

use crate::command::{CommandBase, EditCommand, Step};
use crate::composite::CompositeEditCommand;
use crate::compound::{caret_following, collapse_for_edit, insert_node_at};
use crate::error::{EditError, EditResult};
use crate::primitive::InsertTextCommand;

/// Text position to type at for `pos`: `pos` itself inside a text node,
/// otherwise the end of a preceding or the start of a following text
/// sibling when one touches the boundary.
fn typing_position(doc: &Document, pos: Position) -> EditResult<Option<Position>> {
    if doc.is_text(pos.node)? {
        return Ok(Some(pos));
    }
    let children = doc.children(pos.node)?;
    if let Some(&before) = pos.offset.checked_sub(1).and_then(|i| children.get(i)) {
        if doc.is_text(before)? {
            return Ok(Some(Position::new(before, doc.text_len(before)?)));
        }
    }
    if let Some(&after) = children.get(pos.offset) {
        if doc.is_text(after)? {
            return Ok(Some(Position::new(after, 0)));
        }
    }
    Ok(None)
}

// ============================================================================
// InputTextCommand
// ============================================================================

/// Type text at the selection, replacing a range selection.
///
/// The last step is always the [`InsertTextCommand`] that holds the typed
/// text, so later keystrokes can extend or shrink it in place.
#[derive(Debug)]
pub struct InputTextCommand {
    composite: CompositeEditCommand,
    text: String,
}

impl InputTextCommand {
    #[must_use]
    pub fn new(doc: &Document, text: &str) -> Self {
        Self {
            composite: CompositeEditCommand::new(doc, "Input Text"),
            text: text.to_string(),
        }
    }

    /// Everything typed into this command so far.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// True when the only step is the text insertion itself, i.e. no
    /// selection was deleted and no text node was created.
    #[must_use]
    pub fn is_pure_insertion(&self) -> bool {
        self.composite.len() == 1
    }

    fn last_insert(&mut self) -> EditResult<&mut InsertTextCommand> {
        let state = self.composite.base().state();
        match self.composite.last_child_mut() {
            Some(EditCommand::InsertText(insert)) => Ok(insert),
            _ => Err(EditError::InvalidState {
                command: "InputTextCommand",
                operation: "extend typed text",
                state,
            }),
        }
    }

    /// Type more text right after what this command already inserted.
    pub fn coalesce(&mut self, doc: &mut Document, text: &str) -> EditResult<()> {
        self.composite
            .base()
            .require_applied("InputTextCommand", "coalesce")?;
        let insert = self.last_insert()?;
        insert.coalesce(doc, text)?;
        let ending = insert.base().ending_selection();
        self.text.push_str(text);
        self.composite.base_mut().set_ending_selection(ending);
        Ok(())
    }

    /// Remove the last typed character. No-op once nothing is left.
    pub fn delete_character(&mut self, doc: &mut Document) -> EditResult<()> {
        self.composite
            .base()
            .require_applied("InputTextCommand", "delete a character")?;
        if self.text.is_empty() {
            return Ok(());
        }
        let insert = self.last_insert()?;
        insert.delete_character(doc)?;
        let ending = insert.base().ending_selection();
        self.text.pop();
        self.composite.base_mut().set_ending_selection(ending);
        Ok(())
    }
}

impl Step for InputTextCommand {
    fn base(&self) -> &CommandBase {
        self.composite.base()
    }

    fn base_mut(&mut self) -> &mut CommandBase {
        self.composite.base_mut()
    }

    fn do_apply(&mut self, doc: &mut Document) -> EditResult<()> {
        let text = &self.text;
        self.composite.build(doc, |composite, doc| {
            let pos = collapse_for_edit(composite, doc)?;
            let at = match typing_position(doc, pos)? {
                Some(at) => at,
                None => {
                    let node = composite.create_text(doc, "");
                    insert_node_at(composite, doc, node, pos)?;
                    Position::new(node, 0)
                }
            };
            let step = InsertTextCommand::new(doc, at.node, at.offset, text);
            composite.apply_child(doc, step)
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
        "InputTextCommand"
    }

    fn description(&self) -> &str {
        "Input Text"
    }

    fn size_bytes(&self) -> usize {
        std::mem::size_of::<Self>() + self.text.len() + self.composite.children_size()
    }
}

// ============================================================================
// InputNewlineCommand
// ============================================================================

/// Insert a line break (`<br>`) at the selection, splitting the text node
/// the caret is in.
#[derive(Debug)]
pub struct InputNewlineCommand {
    composite: CompositeEditCommand,
}

impl InputNewlineCommand {
    #[must_use]
    pub fn new(doc: &Document) -> Self {
        Self {
            composite: CompositeEditCommand::new(doc, "Input Newline"),
        }
    }
}

impl Step for InputNewlineCommand {
    fn base(&self) -> &CommandBase {
        self.composite.base()
    }

    fn base_mut(&mut self) -> &mut CommandBase {
        self.composite.base_mut()
    }

    fn do_apply(&mut self, doc: &mut Document) -> EditResult<()> {
        self.composite.build(doc, |composite, doc| {
            let pos = collapse_for_edit(composite, doc)?;
            let br = composite.create_element(doc, "br", Vec::new());
            let after = insert_node_at(composite, doc, br, pos)?;
            let ending = caret_following(doc, br, after)?;
            composite.base_mut().set_ending_selection(ending);
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
        "InputNewlineCommand"
    }

    fn description(&self) -> &str {
        "Input Newline"
    }

    fn size_bytes(&self) -> usize {
        std::mem::size_of::<Self>() + self.composite.children_size()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domedit_dom::{NodeId, Selection};

    fn doc_with_text(data: &str, caret: usize) -> (Document, NodeId) {
        let mut doc = Document::new();
        let root = doc.root();
        let text = doc.create_text(data);
        doc.append_child(root, text).unwrap();
        doc.set_selection(Selection::caret(text, caret));
        (doc, text)
    }

    #[test]
    fn test_input_text_at_caret() {
        let (mut doc, text) = doc_with_text("abc", 2);
        let mut cmd = EditCommand::from(InputTextCommand::new(&doc, "x"));
        cmd.apply(&mut doc).unwrap();
        assert_eq!(doc.text(text).unwrap(), "abxc");
        assert_eq!(doc.selection(), Selection::caret(text, 3));

        cmd.unapply(&mut doc).unwrap();
        assert_eq!(doc.text(text).unwrap(), "abc");
        assert_eq!(doc.selection(), Selection::caret(text, 2));
    }

    #[test]
    fn test_input_text_replaces_range() {
        let (mut doc, text) = doc_with_text("abcdef", 0);
        let range = Selection::range(Position::new(text, 1), Position::new(text, 4));
        doc.set_selection(range);
        let mut cmd = EditCommand::from(InputTextCommand::new(&doc, "x"));
        cmd.apply(&mut doc).unwrap();
        assert_eq!(doc.text(text).unwrap(), "axef");
        assert_eq!(doc.selection(), Selection::caret(text, 2));

        cmd.unapply(&mut doc).unwrap();
        assert_eq!(doc.text(text).unwrap(), "abcdef");
        assert_eq!(doc.selection(), range);

        cmd.reapply(&mut doc).unwrap();
        assert_eq!(doc.text(text).unwrap(), "axef");
    }

    #[test]
    fn test_input_text_into_empty_element_creates_text() {
        let mut doc = Document::new();
        let root = doc.root();
        doc.set_selection(Selection::caret(root, 0));
        let mut cmd = EditCommand::from(InputTextCommand::new(&doc, "hi"));
        cmd.apply(&mut doc).unwrap();
        assert_eq!(doc.inner_html(root).unwrap(), "hi");
        let text = doc.children(root).unwrap()[0];
        assert_eq!(doc.selection(), Selection::caret(text, 2));

        cmd.unapply(&mut doc).unwrap();
        assert!(doc.children(root).unwrap().is_empty());
        cmd.reapply(&mut doc).unwrap();
        assert_eq!(doc.inner_html(root).unwrap(), "hi");
    }

    #[test]
    fn test_input_text_joins_adjacent_text_sibling() {
        let mut doc = Document::new();
        let root = doc.root();
        let text = doc.create_text("ab");
        let br = doc.create_element("br");
        doc.append_child(root, text).unwrap();
        doc.append_child(root, br).unwrap();
        doc.set_selection(Selection::caret(root, 1));

        let mut cmd = EditCommand::from(InputTextCommand::new(&doc, "c"));
        cmd.apply(&mut doc).unwrap();
        assert_eq!(doc.children(root).unwrap(), &[text, br]);
        assert_eq!(doc.text(text).unwrap(), "abc");
        let EditCommand::InputText(input) = &cmd else {
            unreachable!()
        };
        assert!(input.is_pure_insertion());
    }

    #[test]
    fn test_input_text_without_selection_fails_cleanly() {
        let (mut doc, text) = doc_with_text("abc", 0);
        doc.set_selection(Selection::None);
        let mut cmd = EditCommand::from(InputTextCommand::new(&doc, "x"));
        assert_eq!(cmd.apply(&mut doc).unwrap_err(), EditError::NoSelection);
        assert_eq!(doc.text(text).unwrap(), "abc");
    }

    #[test]
    fn test_coalesce_and_delete_character() {
        let (mut doc, text) = doc_with_text("", 0);
        let mut cmd = EditCommand::from(InputTextCommand::new(&doc, "a"));
        cmd.apply(&mut doc).unwrap();
        let EditCommand::InputText(input) = &mut cmd else {
            unreachable!()
        };
        input.coalesce(&mut doc, "b").unwrap();
        input.coalesce(&mut doc, "c").unwrap();
        assert_eq!(input.text(), "abc");
        assert_eq!(doc.text(text).unwrap(), "abc");
        assert_eq!(input.base().ending_selection(), Selection::caret(text, 3));

        input.delete_character(&mut doc).unwrap();
        assert_eq!(input.text(), "ab");
        assert_eq!(input.base().ending_selection(), Selection::caret(text, 2));

        cmd.unapply(&mut doc).unwrap();
        assert_eq!(doc.text(text).unwrap(), "");
    }

    #[test]
    fn test_coalesce_requires_applied() {
        let (mut doc, _) = doc_with_text("", 0);
        let mut input = InputTextCommand::new(&doc, "a");
        assert!(matches!(
            input.coalesce(&mut doc, "b").unwrap_err(),
            EditError::InvalidState { .. }
        ));
    }

    #[test]
    fn test_newline_splits_text() {
        let (mut doc, text) = doc_with_text("helloworld", 5);
        let root = doc.root();
        let before = doc.snapshot(root).unwrap();
        let mut cmd = EditCommand::from(InputNewlineCommand::new(&doc));
        cmd.apply(&mut doc).unwrap();
        assert_eq!(doc.inner_html(root).unwrap(), "hello<br>world");
        assert_eq!(doc.selection(), Selection::caret(text, 0));

        cmd.unapply(&mut doc).unwrap();
        assert_eq!(doc.snapshot(root).unwrap(), before);
        assert_eq!(doc.children(root).unwrap(), &[text]);
        assert_eq!(doc.selection(), Selection::caret(text, 5));
    }

    #[test]
    fn test_newline_at_end_appends() {
        let (mut doc, text) = doc_with_text("hi", 2);
        let root = doc.root();
        let mut cmd = EditCommand::from(InputNewlineCommand::new(&doc));
        cmd.apply(&mut doc).unwrap();
        assert_eq!(doc.inner_html(root).unwrap(), "hi<br>");
        assert_eq!(doc.children(root).unwrap()[0], text);
        assert_eq!(doc.selection(), Selection::caret(root, 2));
    }

    #[test]
    fn test_newline_at_start_inserts_before() {
        let (mut doc, text) = doc_with_text("hi", 0);
        let root = doc.root();
        let mut cmd = EditCommand::from(InputNewlineCommand::new(&doc));
        cmd.apply(&mut doc).unwrap();
        assert_eq!(doc.inner_html(root).unwrap(), "<br>hi");
        assert_eq!(doc.selection(), Selection::caret(text, 0));
    }
}
