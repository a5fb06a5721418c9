#![forbid(unsafe_code)]

//! The edit command handle and its shared apply/unapply/reapply protocol.
//!
//! [`EditCommand`] is a closed set of command kinds. Every kind except
//! [`EditCommand::Empty`] carries a [`CommandBase`] holding the owning
//! document, the starting and ending selections, the composite-step flag
//! and the lifecycle state.
//!
//! # Lifecycle
//!
//! ```text
//! NotApplied --apply--> Applied --unapply--> Unapplied --reapply--> Applied
//! ```
//!
//! Calling an operation from the wrong state fails with
//! [`EditError::InvalidState`] and leaves the document untouched.
//!
//! # Invariants
//!
//! 1. `unapply` after a successful `apply` restores the tree (structure and
//!    character data) of the command's document exactly.
//! 2. `reapply` after `unapply` reproduces the post-apply tree.
//! 3. A command that is not a composite step moves the live selection to
//!    its ending selection after `apply`/`reapply` and to its starting
//!    selection after `unapply`. Composite steps never touch it.
//! 4. The empty command ignores every mutator and answers every accessor
//!    with a neutral default.
//!
//! # Failure Modes
//!
//! - A failed operation leaves the command in the state it was in.
//! - Commands used against a document other than their own fail with
//!   [`EditError::WrongDocument`].

use std::fmt;

use domedit_dom::{Document, DocumentId, NodeId, Selection};

use crate::composite::CompositeEditCommand;
use crate::compound::{
    DeleteKeyCommand, DeleteSelectionCommand, InputNewlineCommand, InputTextCommand,
    PasteHtmlCommand, PasteImageCommand,
};
use crate::error::{EditError, EditResult};
use crate::primitive::{
    AppendNodeCommand, DeleteTextCommand, InsertNodeBeforeCommand, InsertTextCommand,
    JoinTextNodesCommand, RemoveNodeCommand, SplitTextNodeCommand,
};
use crate::typing::TypingCommand;

// ============================================================================
// Identity and state
// ============================================================================

/// Numeric kind identifier of a command. `None` (0) is reserved for the
/// empty command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum CommandId {
    #[default]
    None = 0,
    AppendNode = 1,
    Composite = 2,
    DeleteKey = 3,
    DeleteSelection = 4,
    DeleteText = 5,
    InputNewline = 6,
    InputText = 7,
    InsertNodeBefore = 8,
    InsertText = 9,
    JoinTextNodes = 10,
    PasteHtml = 11,
    PasteImage = 12,
    RemoveNode = 13,
    SplitTextNode = 14,
    Typing = 15,
}

impl CommandId {
    /// Raw numeric value.
    #[must_use]
    pub const fn raw(self) -> u8 {
        self as u8
    }
}

/// Where a command sits in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CommandState {
    #[default]
    NotApplied,
    Applied,
    Unapplied,
}

impl fmt::Display for CommandState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::NotApplied => "not applied",
            Self::Applied => "applied",
            Self::Unapplied => "unapplied",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operation {
    Apply,
    Unapply,
    Reapply,
}

impl Operation {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Apply => "apply",
            Self::Unapply => "unapply",
            Self::Reapply => "reapply",
        }
    }

    const fn required_state(self) -> CommandState {
        match self {
            Self::Apply => CommandState::NotApplied,
            Self::Unapply => CommandState::Applied,
            Self::Reapply => CommandState::Unapplied,
        }
    }

    const fn resulting_state(self) -> CommandState {
        match self {
            Self::Apply | Self::Reapply => CommandState::Applied,
            Self::Unapply => CommandState::Unapplied,
        }
    }
}

// ============================================================================
// CommandBase
// ============================================================================

/// State shared by every non-empty command.
#[derive(Debug, Clone)]
pub struct CommandBase {
    document: DocumentId,
    state: CommandState,
    composite_step: bool,
    starting_selection: Selection,
    ending_selection: Selection,
}

impl CommandBase {
    /// Bind to `doc`, capturing its live selection as both the starting and
    /// the ending selection.
    #[must_use]
    pub fn new(doc: &Document) -> Self {
        Self {
            document: doc.id(),
            state: CommandState::NotApplied,
            composite_step: false,
            starting_selection: doc.selection(),
            ending_selection: doc.selection(),
        }
    }

    /// Id of the document the command edits.
    #[must_use]
    pub fn document(&self) -> DocumentId {
        self.document
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> CommandState {
        self.state
    }

    /// Whether the command runs inside a composite and leaves the live
    /// selection alone.
    #[must_use]
    pub fn is_composite_step(&self) -> bool {
        self.composite_step
    }

    /// Selection restored by unapply.
    #[must_use]
    pub fn starting_selection(&self) -> Selection {
        self.starting_selection
    }

    /// Selection left behind by apply and reapply.
    #[must_use]
    pub fn ending_selection(&self) -> Selection {
        self.ending_selection
    }

    pub(crate) fn set_starting_selection(&mut self, selection: Selection) {
        self.starting_selection = selection;
    }

    pub(crate) fn set_ending_selection(&mut self, selection: Selection) {
        self.ending_selection = selection;
    }

    pub(crate) fn set_state(&mut self, state: CommandState) {
        self.state = state;
    }

    pub(crate) fn check_document(&self, doc: &Document) -> EditResult<()> {
        if self.document == doc.id() {
            Ok(())
        } else {
            Err(EditError::WrongDocument {
                expected: self.document,
                actual: doc.id(),
            })
        }
    }

    /// Fail unless the command is applied. Used by operations that extend
    /// an applied command in place.
    pub(crate) fn require_applied(&self, command: &'static str, operation: &'static str) -> EditResult<()> {
        if self.state == CommandState::Applied {
            Ok(())
        } else {
            Err(EditError::InvalidState {
                command,
                operation,
                state: self.state,
            })
        }
    }
}

// ============================================================================
// Per-kind behaviour
// ============================================================================

/// What each concrete command supplies to the shared protocol.
pub(crate) trait Step {
    fn base(&self) -> &CommandBase;

    fn base_mut(&mut self) -> &mut CommandBase;

    /// Perform the edit. On error the document must be unchanged.
    fn do_apply(&mut self, doc: &mut Document) -> EditResult<()>;

    /// Reverse a successful apply or reapply.
    fn do_unapply(&mut self, doc: &mut Document) -> EditResult<()>;

    /// Redo the edit after an unapply.
    fn do_reapply(&mut self, doc: &mut Document) -> EditResult<()> {
        self.do_apply(doc)
    }

    /// Push every node this command references onto `out`.
    fn collect_nodes(&self, out: &mut Vec<NodeId>);

    /// Free nodes the command created that a rollback left detached.
    fn discard_created(&mut self, _doc: &mut Document) {}

    /// Forget a rolled-back apply so the command can be applied afresh.
    fn reset(&mut self) {
        self.base_mut().set_state(CommandState::NotApplied);
    }

    fn name(&self) -> &'static str;

    fn description(&self) -> &str;

    fn size_bytes(&self) -> usize;
}

fn run(step: &mut dyn Step, doc: &mut Document, operation: Operation) -> EditResult<()> {
    let base = step.base();
    base.check_document(doc)?;
    if base.state != operation.required_state() {
        return Err(EditError::InvalidState {
            command: step.name(),
            operation: operation.as_str(),
            state: base.state,
        });
    }

    match operation {
        Operation::Apply => step.do_apply(doc)?,
        Operation::Unapply => step.do_unapply(doc)?,
        Operation::Reapply => step.do_reapply(doc)?,
    }

    let name = step.name();
    let base = step.base_mut();
    base.state = operation.resulting_state();
    if !base.composite_step {
        let selection = match operation {
            Operation::Unapply => base.starting_selection,
            Operation::Apply | Operation::Reapply => base.ending_selection,
        };
        doc.set_selection(selection);
    }
    tracing::debug!(
        command = name,
        operation = operation.as_str(),
        document = %doc.id(),
        composite_step = base.composite_step,
        "edit command"
    );
    Ok(())
}

// ============================================================================
// EditCommand
// ============================================================================

/// Handle to any edit command, or to no command at all.
#[derive(Debug, Default)]
pub enum EditCommand {
    /// The null command. Mutators are no-ops and accessors return defaults.
    #[default]
    Empty,
    AppendNode(AppendNodeCommand),
    Composite(CompositeEditCommand),
    DeleteKey(DeleteKeyCommand),
    DeleteSelection(DeleteSelectionCommand),
    DeleteText(DeleteTextCommand),
    InputNewline(InputNewlineCommand),
    InputText(InputTextCommand),
    InsertNodeBefore(InsertNodeBeforeCommand),
    InsertText(InsertTextCommand),
    JoinTextNodes(JoinTextNodesCommand),
    PasteHtml(PasteHtmlCommand),
    PasteImage(PasteImageCommand),
    RemoveNode(RemoveNodeCommand),
    SplitTextNode(SplitTextNodeCommand),
    Typing(TypingCommand),
}

/// Shared empty command for accessors that hand out a reference.
pub(crate) static EMPTY_COMMAND: EditCommand = EditCommand::Empty;

impl EditCommand {
    /// The null command.
    #[must_use]
    pub const fn empty() -> Self {
        Self::Empty
    }

    /// Whether this is the null command.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Kind identifier; [`CommandId::None`] for the empty command.
    #[must_use]
    pub fn command_id(&self) -> CommandId {
        match self {
            Self::Empty => CommandId::None,
            Self::AppendNode(_) => CommandId::AppendNode,
            Self::Composite(_) => CommandId::Composite,
            Self::DeleteKey(_) => CommandId::DeleteKey,
            Self::DeleteSelection(_) => CommandId::DeleteSelection,
            Self::DeleteText(_) => CommandId::DeleteText,
            Self::InputNewline(_) => CommandId::InputNewline,
            Self::InputText(_) => CommandId::InputText,
            Self::InsertNodeBefore(_) => CommandId::InsertNodeBefore,
            Self::InsertText(_) => CommandId::InsertText,
            Self::JoinTextNodes(_) => CommandId::JoinTextNodes,
            Self::PasteHtml(_) => CommandId::PasteHtml,
            Self::PasteImage(_) => CommandId::PasteImage,
            Self::RemoveNode(_) => CommandId::RemoveNode,
            Self::SplitTextNode(_) => CommandId::SplitTextNode,
            Self::Typing(_) => CommandId::Typing,
        }
    }

    fn step(&self) -> Option<&dyn Step> {
        match self {
            Self::Empty => None,
            Self::AppendNode(c) => Some(c),
            Self::Composite(c) => Some(c),
            Self::DeleteKey(c) => Some(c),
            Self::DeleteSelection(c) => Some(c),
            Self::DeleteText(c) => Some(c),
            Self::InputNewline(c) => Some(c),
            Self::InputText(c) => Some(c),
            Self::InsertNodeBefore(c) => Some(c),
            Self::InsertText(c) => Some(c),
            Self::JoinTextNodes(c) => Some(c),
            Self::PasteHtml(c) => Some(c),
            Self::PasteImage(c) => Some(c),
            Self::RemoveNode(c) => Some(c),
            Self::SplitTextNode(c) => Some(c),
            Self::Typing(c) => Some(c),
        }
    }

    fn step_mut(&mut self) -> Option<&mut dyn Step> {
        match self {
            Self::Empty => None,
            Self::AppendNode(c) => Some(c),
            Self::Composite(c) => Some(c),
            Self::DeleteKey(c) => Some(c),
            Self::DeleteSelection(c) => Some(c),
            Self::DeleteText(c) => Some(c),
            Self::InputNewline(c) => Some(c),
            Self::InputText(c) => Some(c),
            Self::InsertNodeBefore(c) => Some(c),
            Self::InsertText(c) => Some(c),
            Self::JoinTextNodes(c) => Some(c),
            Self::PasteHtml(c) => Some(c),
            Self::PasteImage(c) => Some(c),
            Self::RemoveNode(c) => Some(c),
            Self::SplitTextNode(c) => Some(c),
            Self::Typing(c) => Some(c),
        }
    }

    // --- protocol ---------------------------------------------------------

    /// Perform the command. No-op for the empty command.
    pub fn apply(&mut self, doc: &mut Document) -> EditResult<()> {
        match self.step_mut() {
            Some(step) => run(step, doc, Operation::Apply),
            None => Ok(()),
        }
    }

    /// Reverse the command. No-op for the empty command.
    pub fn unapply(&mut self, doc: &mut Document) -> EditResult<()> {
        match self.step_mut() {
            Some(step) => run(step, doc, Operation::Unapply),
            None => Ok(()),
        }
    }

    /// Redo the command after an unapply. No-op for the empty command.
    pub fn reapply(&mut self, doc: &mut Document) -> EditResult<()> {
        match self.step_mut() {
            Some(step) => run(step, doc, Operation::Reapply),
            None => Ok(()),
        }
    }

    /// Undo a successful `apply` that is being abandoned, returning the
    /// command to the not-applied state. Nodes the apply created are freed.
    pub(crate) fn roll_back_apply(&mut self, doc: &mut Document) -> EditResult<()> {
        self.unapply(doc)?;
        self.discard_created(doc);
        self.reset();
        Ok(())
    }

    pub(crate) fn discard_created(&mut self, doc: &mut Document) {
        if let Some(step) = self.step_mut() {
            step.discard_created(doc);
        }
    }

    /// Every node the command references, children and recorded
    /// selections included. May contain duplicates.
    #[must_use]
    pub fn referenced_nodes(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.collect_nodes(&mut out);
        out
    }

    pub(crate) fn collect_nodes(&self, out: &mut Vec<NodeId>) {
        let Some(step) = self.step() else {
            return;
        };
        step.collect_nodes(out);
        let base = step.base();
        for selection in [base.starting_selection(), base.ending_selection()] {
            out.extend(selection.start().map(|pos| pos.node));
            out.extend(selection.end().map(|pos| pos.node));
        }
    }

    pub(crate) fn reset(&mut self) {
        if let Some(step) = self.step_mut() {
            step.reset();
        }
    }

    // --- accessors --------------------------------------------------------

    /// Owning document, or `None` for the empty command.
    #[must_use]
    pub fn document_id(&self) -> Option<DocumentId> {
        self.step().map(|s| s.base().document())
    }

    /// Lifecycle state; always not-applied for the empty command.
    #[must_use]
    pub fn state(&self) -> CommandState {
        self.step().map_or(CommandState::NotApplied, |s| s.base().state())
    }

    #[must_use]
    pub fn is_composite_step(&self) -> bool {
        self.step().is_some_and(|s| s.base().is_composite_step())
    }

    /// Mark the command as a step of a composite. Ignored by the empty command.
    pub fn set_is_composite_step(&mut self, flag: bool) {
        if let Some(step) = self.step_mut() {
            step.base_mut().composite_step = flag;
        }
    }

    #[must_use]
    pub fn starting_selection(&self) -> Selection {
        self.step()
            .map_or(Selection::None, |s| s.base().starting_selection())
    }

    #[must_use]
    pub fn ending_selection(&self) -> Selection {
        self.step()
            .map_or(Selection::None, |s| s.base().ending_selection())
    }

    pub fn set_starting_selection(&mut self, selection: Selection) {
        if let Some(step) = self.step_mut() {
            step.base_mut().set_starting_selection(selection);
        }
    }

    pub fn set_ending_selection(&mut self, selection: Selection) {
        if let Some(step) = self.step_mut() {
            step.base_mut().set_ending_selection(selection);
        }
    }

    /// The live selection of `doc`, or `None` for the empty command.
    #[must_use]
    pub fn current_selection(&self, doc: &Document) -> Selection {
        if self.is_empty() {
            Selection::None
        } else {
            doc.selection()
        }
    }

    /// Set the live selection of `doc` to the starting selection.
    pub fn move_to_starting_selection(&self, doc: &mut Document) {
        if let Some(step) = self.step() {
            doc.set_selection(step.base().starting_selection());
        }
    }

    /// Set the live selection of `doc` to the ending selection.
    pub fn move_to_ending_selection(&self, doc: &mut Document) {
        if let Some(step) = self.step() {
            doc.set_selection(step.base().ending_selection());
        }
    }

    /// Type name of the command, for logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.step().map_or("EmptyCommand", |s| s.name())
    }

    /// Human-readable description for undo menus.
    #[must_use]
    pub fn description(&self) -> &str {
        self.step().map_or("", |s| s.description())
    }

    /// Approximate heap and inline size, used for history budgets.
    #[must_use]
    pub fn size_bytes(&self) -> usize {
        self.step().map_or(0, |s| s.size_bytes())
    }

    // --- downcasts --------------------------------------------------------

    #[must_use]
    pub fn as_typing(&self) -> Option<&TypingCommand> {
        match self {
            Self::Typing(typing) => Some(typing),
            _ => None,
        }
    }

    pub fn as_typing_mut(&mut self) -> Option<&mut TypingCommand> {
        match self {
            Self::Typing(typing) => Some(typing),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_composite(&self) -> Option<&CompositeEditCommand> {
        match self {
            Self::Composite(composite) => Some(composite),
            _ => None,
        }
    }

    pub fn as_composite_mut(&mut self) -> Option<&mut CompositeEditCommand> {
        match self {
            Self::Composite(composite) => Some(composite),
            _ => None,
        }
    }
}

macro_rules! impl_from_command {
    ($($variant:ident => $ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for EditCommand {
                fn from(command: $ty) -> Self {
                    Self::$variant(command)
                }
            }
        )*
    };
}

impl_from_command! {
    AppendNode => AppendNodeCommand,
    Composite => CompositeEditCommand,
    DeleteKey => DeleteKeyCommand,
    DeleteSelection => DeleteSelectionCommand,
    DeleteText => DeleteTextCommand,
    InputNewline => InputNewlineCommand,
    InputText => InputTextCommand,
    InsertNodeBefore => InsertNodeBeforeCommand,
    InsertText => InsertTextCommand,
    JoinTextNodes => JoinTextNodesCommand,
    PasteHtml => PasteHtmlCommand,
    PasteImage => PasteImageCommand,
    RemoveNode => RemoveNodeCommand,
    SplitTextNode => SplitTextNodeCommand,
    Typing => TypingCommand,
}
