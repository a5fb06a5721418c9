#![forbid(unsafe_code)]

//! Undoable editing commands over a `domedit-dom` document.
//!
//! # Overview
//!
//! - [`EditCommand`] - handle to any command, including the empty command
//! - primitives - [`InsertTextCommand`], [`DeleteTextCommand`],
//!   [`SplitTextNodeCommand`], [`JoinTextNodesCommand`],
//!   [`InsertNodeBeforeCommand`], [`AppendNodeCommand`], [`RemoveNodeCommand`]
//! - [`CompositeEditCommand`] - ordered, all-or-nothing groups
//! - compound commands built at apply time - typing, newline, backspace,
//!   selection deletion, HTML and image paste
//! - [`TypingCommand`] - coalesces keystrokes into one undo step
//! - [`UndoStack`] and [`EditingSession`] - history and last-edit tracking
//!
//! # Example
//!
//! ```
//! use domedit_dom::{Document, Selection};
//! use domedit_editing::EditingSession;
//!
//! let mut doc = Document::new();
//! let root = doc.root();
//! doc.set_selection(Selection::caret(root, 0));
//!
//! let mut session = EditingSession::new(doc);
//! session.insert_text("hel").unwrap();
//! session.insert_text("lo").unwrap();
//! assert_eq!(session.document().inner_html(root).unwrap(), "hello");
//!
//! // Both keystrokes were one typing command.
//! session.undo().unwrap().unwrap();
//! assert_eq!(session.document().inner_html(root).unwrap(), "");
//! ```

pub mod command;
pub mod composite;
pub mod compound;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod history;
pub mod primitive;
pub mod session;
pub mod typing;

pub use command::{CommandBase, CommandId, CommandState, EditCommand};
pub use composite::CompositeEditCommand;
pub use compound::{
    DeleteKeyCommand, DeleteSelectionCommand, InputNewlineCommand, InputTextCommand,
    PasteHtmlCommand, PasteImageCommand,
};
pub use config::{EditingConfig, HistoryConfig, TypingConfig};
pub use dispatch::{
    close_typing, delete_key_pressed, insert_newline, insert_text,
    is_open_for_more_typing_command,
};
pub use error::{ConfigError, EditError, EditResult};
pub use history::UndoStack;
pub use primitive::{
    AppendNodeCommand, DeleteTextCommand, InsertNodeBeforeCommand, InsertTextCommand,
    JoinTextNodesCommand, RemoveNodeCommand, SplitTextNodeCommand,
};
pub use session::EditingSession;
pub use typing::TypingCommand;
