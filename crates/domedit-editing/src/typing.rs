#![forbid(unsafe_code)]

//! Coalesced typing.
//!
//! A [`TypingCommand`] is a composite that keeps growing while it is *open*:
//! consecutive keystrokes extend it in place instead of creating new undo
//! steps. Typed characters are folded into the trailing
//! [`InputTextCommand`](crate::InputTextCommand) when there is one, and
//! backspace first eats characters typed in this command before deleting
//! older content.
//!
//! # Invariants
//!
//! 1. Only an applied, open typing command accepts keystrokes.
//! 2. Closing is one-way: a closed typing command never reopens.
//! 3. An open typing command cannot be reapplied; close it before undo so
//!    redo replays a fixed set of steps.
//! 4. After every keystroke the live selection is the command's ending
//!    selection, unless the command is itself a composite step.

use domedit_dom::{Document, NodeId, Selection};

use crate::command::{CommandBase, EditCommand, Step};
use crate::composite::CompositeEditCommand;
use crate::compound::{DeleteKeyCommand, InputNewlineCommand, InputTextCommand};
use crate::error::{EditError, EditResult};

/// One undo step covering a run of keystrokes.
#[derive(Debug)]
pub struct TypingCommand {
    composite: CompositeEditCommand,
    open: bool,
}

enum Backspace {
    Shrunk(Selection),
    Emptied,
    NothingTyped,
}

impl TypingCommand {
    /// A new, open typing command bound to `doc`.
    #[must_use]
    pub fn new(doc: &Document) -> Self {
        Self {
            composite: CompositeEditCommand::new(doc, "Typing"),
            open: true,
        }
    }

    /// Whether further keystrokes may extend this command.
    #[must_use]
    pub fn open_for_more_typing(&self) -> bool {
        self.open
    }

    /// Stop accepting keystrokes.
    pub fn close_typing(&mut self) {
        if self.open {
            tracing::trace!(steps = self.composite.len(), "closing typing command");
        }
        self.open = false;
    }

    /// Steps recorded so far.
    #[must_use]
    pub fn children(&self) -> &[EditCommand] {
        self.composite.children()
    }

    fn check_extendable(&self, doc: &Document) -> EditResult<()> {
        if !self.open {
            return Err(EditError::TypingClosed);
        }
        let base = self.composite.base();
        base.check_document(doc)?;
        base.require_applied("TypingCommand", "accept typing")
    }

    fn typing_added(&self, doc: &mut Document) {
        let base = self.composite.base();
        if !base.is_composite_step() {
            doc.set_selection(base.ending_selection());
        }
    }

    /// Type `text`, folding it into the previous typed run when possible.
    pub fn insert_text(&mut self, doc: &mut Document, text: &str) -> EditResult<()> {
        self.check_extendable(doc)?;
        let coalesced = match self.composite.last_child_mut() {
            Some(EditCommand::InputText(input)) => {
                input.coalesce(doc, text)?;
                Some(input.base().ending_selection())
            }
            _ => None,
        };
        match coalesced {
            Some(ending) => self.composite.base_mut().set_ending_selection(ending),
            None => {
                let step = InputTextCommand::new(doc, text);
                self.composite.apply_child(doc, step)?;
            }
        }
        self.typing_added(doc);
        Ok(())
    }

    /// Insert a line break.
    pub fn insert_newline(&mut self, doc: &mut Document) -> EditResult<()> {
        self.check_extendable(doc)?;
        let step = InputNewlineCommand::new(doc);
        self.composite.apply_child(doc, step)?;
        self.typing_added(doc);
        Ok(())
    }

    /// Backspace.
    ///
    /// Removes the last character typed into this command if there is one.
    /// A typed run emptied this way is dropped entirely. Otherwise a
    /// [`DeleteKeyCommand`] deletes backwards from the selection.
    pub fn delete_key_pressed(&mut self, doc: &mut Document) -> EditResult<()> {
        self.check_extendable(doc)?;
        let outcome = match self.composite.last_child_mut() {
            Some(EditCommand::InputText(input)) => {
                if input.text().is_empty() {
                    Backspace::NothingTyped
                } else {
                    input.delete_character(doc)?;
                    if input.text().is_empty() && input.is_pure_insertion() {
                        Backspace::Emptied
                    } else {
                        Backspace::Shrunk(input.base().ending_selection())
                    }
                }
            }
            _ => Backspace::NothingTyped,
        };

        match outcome {
            Backspace::Shrunk(ending) => self.composite.base_mut().set_ending_selection(ending),
            Backspace::Emptied => {
                if let Some(child) = self.composite.last_child_mut() {
                    child.unapply(doc)?;
                }
                if let Some(child) = self.composite.pop_child() {
                    self.composite
                        .base_mut()
                        .set_ending_selection(child.starting_selection());
                }
            }
            Backspace::NothingTyped => {
                let step = DeleteKeyCommand::new(doc);
                self.composite.apply_child(doc, step)?;
            }
        }
        self.typing_added(doc);
        Ok(())
    }
}

impl Step for TypingCommand {
    fn base(&self) -> &CommandBase {
        self.composite.base()
    }

    fn base_mut(&mut self) -> &mut CommandBase {
        self.composite.base_mut()
    }

    fn do_apply(&mut self, doc: &mut Document) -> EditResult<()> {
        self.composite.build(doc, |_, _| Ok(()))
    }

    fn do_unapply(&mut self, doc: &mut Document) -> EditResult<()> {
        self.composite.unapply_children(doc)
    }

    fn do_reapply(&mut self, doc: &mut Document) -> EditResult<()> {
        if self.open {
            return Err(EditError::OpenTypingCommand);
        }
        self.composite.reapply_children(doc)
    }

    fn collect_nodes(&self, out: &mut Vec<NodeId>) {
        self.composite.collect_nodes(out);
    }

    fn discard_created(&mut self, doc: &mut Document) {
        self.composite.discard_created(doc);
    }

    fn name(&self) -> &'static str {
        "TypingCommand"
    }

    fn description(&self) -> &str {
        "Typing"
    }

    fn size_bytes(&self) -> usize {
        std::mem::size_of::<Self>() + self.composite.children_size()
    }
}
