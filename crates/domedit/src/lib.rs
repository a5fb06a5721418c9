#![forbid(unsafe_code)]

//! domedit public facade crate.
//!
//! Re-exports the document model and the editing commands, and offers a
//! prelude for day-to-day use.
//!
//! ```
//! use domedit::prelude::*;
//!
//! let mut doc = Document::new();
//! let root = doc.root();
//! let text = doc.create_text("helloworld");
//! doc.append_child(root, text)?;
//! doc.set_selection(Selection::caret(text, 5));
//!
//! let mut session = EditingSession::new(doc);
//! session.insert_newline()?;
//! assert_eq!(session.document().inner_html(root)?, "hello<br>world");
//! # Ok::<(), domedit::Error>(())
//! ```

// --- Document re-exports ---------------------------------------------------

pub use domedit_dom::{
    Document, DocumentId, DomError, NodeId, NodeKind, NodeSnapshot, Position, Selection,
};

// --- Editing re-exports ----------------------------------------------------

pub use domedit_editing::{
    AppendNodeCommand, CommandId, CommandState, CompositeEditCommand, ConfigError,
    DeleteKeyCommand, DeleteSelectionCommand, DeleteTextCommand, EditCommand, EditError,
    EditingConfig, EditingSession, HistoryConfig, InputNewlineCommand, InputTextCommand,
    InsertNodeBeforeCommand, InsertTextCommand, JoinTextNodesCommand, PasteHtmlCommand,
    PasteImageCommand, RemoveNodeCommand, SplitTextNodeCommand, TypingCommand, TypingConfig,
    UndoStack,
};

// --- Errors ---------------------------------------------------------------

/// Top-level error type for domedit users.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Dom(#[from] DomError),
    #[error(transparent)]
    Edit(#[from] EditError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Standard result type for domedit APIs.
pub type Result<T> = std::result::Result<T, Error>;

pub mod prelude {
    pub use crate::{
        Document, EditCommand, EditingSession, Error, NodeId, Position, Result, Selection,
    };

    pub use domedit_editing::dispatch;
}

pub use domedit_dom as dom;
pub use domedit_editing as editing;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_errors_convert() {
        let doc = Document::new();
        let err: Error = DomError::NotText(doc.root()).into();
        assert!(matches!(err, Error::Dom(_)));
        let err: Error = EditError::NoSelection.into();
        assert_eq!(err.to_string(), "no selection to edit at");
    }

    #[test]
    fn test_question_mark_through_facade() {
        fn run() -> Result<String> {
            let mut doc = Document::new();
            let root = doc.root();
            doc.set_selection(Selection::caret(root, 0));
            let mut session = EditingSession::new(doc);
            session.insert_text("ok")?;
            Ok(session.document().inner_html(root)?)
        }
        assert_eq!(run().unwrap(), "ok");
    }
}
