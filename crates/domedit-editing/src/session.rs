#![forbid(unsafe_code)]

//! The editing host: one document, its history and the last edit command.
//!
//! [`EditingSession`] is what commands report to after they run. Applying
//! a command through the session records it for undo and makes it the
//! *last edit command*, which is where keystrokes go while it is an open
//! typing command.
//!
//! # Invariants
//!
//! 1. The last edit command, when there is one, is the newest undo entry.
//! 2. Undo, redo, a selection change and any newly applied command end the
//!    current typing run: the next keystroke starts a new typing command.
//! 3. A command whose apply fails is not recorded.

use domedit_dom::{Document, Selection};
use web_time::Instant;

use crate::command::{EMPTY_COMMAND, EditCommand};
use crate::config::EditingConfig;
use crate::dispatch::{self, Keystroke, TypingWindow};
use crate::error::EditResult;
use crate::history::UndoStack;
use crate::typing::TypingCommand;

/// A document being edited, with undo history.
#[derive(Debug)]
pub struct EditingSession {
    document: Document,
    history: UndoStack,
    config: EditingConfig,
    /// Whether the newest undo entry is the last edit command.
    last_edit_is_top: bool,
    typing_window: TypingWindow,
}

impl Default for EditingSession {
    fn default() -> Self {
        Self::new(Document::new())
    }
}

impl EditingSession {
    #[must_use]
    pub fn new(document: Document) -> Self {
        Self::with_config(document, EditingConfig::default())
    }

    #[must_use]
    pub fn with_config(document: Document, config: EditingConfig) -> Self {
        tracing::debug!(document = %document.id(), ?config, "editing session created");
        Self {
            document,
            history: UndoStack::new(config.history.clone()),
            config,
            last_edit_is_top: false,
            typing_window: TypingWindow::default(),
        }
    }

    /// The edited document.
    #[must_use]
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Direct access to the document.
    ///
    /// Ends the current typing run. Edits made through this reference are
    /// not recorded, and undoing commands that touched the same nodes may
    /// then fail with a state drift error. Detached nodes that recorded
    /// commands reference are freed when those commands leave the history.
    pub fn document_mut(&mut self) -> &mut Document {
        self.close_typing();
        &mut self.document
    }

    /// Give up the history and take the document.
    #[must_use]
    pub fn into_document(self) -> Document {
        self.document
    }

    #[must_use]
    pub fn config(&self) -> &EditingConfig {
        &self.config
    }

    /// Recorded undo and redo history.
    #[must_use]
    pub fn history(&self) -> &UndoStack {
        &self.history
    }

    /// Live selection of the document.
    #[must_use]
    pub fn selection(&self) -> Selection {
        self.document.selection()
    }

    /// Move the selection, ending the current typing run.
    pub fn set_selection(&mut self, selection: Selection) {
        self.close_typing();
        self.document.set_selection(selection);
    }

    // ========================================================================
    // Commands
    // ========================================================================

    /// Apply `command` and record it as the last edit command.
    ///
    /// The empty command is accepted and ignored.
    pub fn apply(&mut self, command: impl Into<EditCommand>) -> EditResult<()> {
        let mut command = command.into();
        if command.is_empty() {
            return Ok(());
        }
        command.apply(&mut self.document)?;
        self.register_applied(command);
        Ok(())
    }

    /// Undo the newest recorded command.
    ///
    /// Returns its description, or `None` when there is nothing to undo.
    pub fn undo(&mut self) -> Option<EditResult<String>> {
        self.end_last_edit();
        self.history.undo(&mut self.document)
    }

    /// Redo the newest undone command.
    pub fn redo(&mut self) -> Option<EditResult<String>> {
        self.end_last_edit();
        self.history.redo(&mut self.document)
    }

    /// Whether [`undo`](Self::undo) has anything to reverse.
    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    /// Whether [`redo`](Self::redo) has anything to reapply.
    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Drop all undo and redo history, freeing detached nodes only the
    /// history kept alive.
    pub fn clear_history(&mut self) {
        self.end_last_edit();
        self.history.clear(&mut self.document);
    }

    /// The last edit command, or the empty command when there is none.
    #[must_use]
    pub fn last_edit_command(&self) -> &EditCommand {
        if !self.last_edit_is_top {
            return &EMPTY_COMMAND;
        }
        self.history.last().unwrap_or(&EMPTY_COMMAND)
    }

    // ========================================================================
    // Typing
    // ========================================================================

    /// Type `text` at the selection.
    pub fn insert_text(&mut self, text: &str) -> EditResult<()> {
        dispatch::insert_text(self, text)
    }

    /// Insert a line break at the selection.
    pub fn insert_newline(&mut self) -> EditResult<()> {
        dispatch::insert_newline(self)
    }

    /// Backspace.
    pub fn delete_key_pressed(&mut self) -> EditResult<()> {
        dispatch::delete_key_pressed(self)
    }

    /// End the current typing run, if any.
    pub fn close_typing(&mut self) {
        if self.last_edit_is_top {
            if let Some(command) = self.history.last_mut() {
                dispatch::close_typing(command);
            }
        }
        self.typing_window.reset();
    }

    /// Whether the next keystroke would extend the last edit command.
    #[must_use]
    pub fn is_typing_open(&self) -> bool {
        dispatch::is_open_for_more_typing_command(self.last_edit_command())
    }

    // ========================================================================
    // Dispatch plumbing
    // ========================================================================

    fn end_last_edit(&mut self) {
        self.close_typing();
        self.last_edit_is_top = false;
    }

    pub(crate) fn register_applied(&mut self, command: EditCommand) {
        self.close_typing();
        tracing::debug!(command = command.name(), "registered edit");
        self.history.push(command, &mut self.document);
        self.last_edit_is_top = true;
    }

    pub(crate) fn open_typing_parts(&mut self) -> Option<(&mut TypingCommand, &mut Document)> {
        if !self.last_edit_is_top {
            return None;
        }
        let typing = self.history.last_mut()?.as_typing_mut()?;
        if !typing.open_for_more_typing() {
            return None;
        }
        Some((typing, &mut self.document))
    }

    pub(crate) fn document_for_edit(&mut self) -> &mut Document {
        &mut self.document
    }

    pub(crate) fn typing_window_expired(&self, now: Instant, keystroke: Keystroke<'_>) -> bool {
        self.is_typing_open()
            && self
                .typing_window
                .should_close(&self.config.typing, now, keystroke)
    }

    pub(crate) fn typing_added(&mut self, now: Instant, keystroke: Keystroke<'_>) {
        self.history.refresh_last(&mut self.document);
        self.typing_window.record(now, keystroke);
    }
}
