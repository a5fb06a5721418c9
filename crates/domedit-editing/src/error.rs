#![forbid(unsafe_code)]

use domedit_dom::{DocumentId, DomError, NodeId};
use thiserror::Error;

use crate::command::CommandState;

/// Result of applying, unapplying or reapplying a command.
pub type EditResult<T> = std::result::Result<T, EditError>;

/// Errors raised by edit commands and the editing session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    #[error(transparent)]
    Dom(#[from] DomError),

    #[error("{command} cannot {operation} while {state}")]
    InvalidState {
        command: &'static str,
        operation: &'static str,
        state: CommandState,
    },

    #[error("command belongs to {expected}, not {actual}")]
    WrongDocument {
        expected: DocumentId,
        actual: DocumentId,
    },

    #[error("no selection to edit at")]
    NoSelection,

    #[error("node {0} is not attached to a parent")]
    DetachedNode(NodeId),

    #[error("nodes {first} and {second} are not adjacent siblings")]
    NotAdjacent { first: NodeId, second: NodeId },

    #[error("state drift: expected '{expected}', got '{actual}'")]
    StateDrift { expected: String, actual: String },

    #[error("typing command is closed")]
    TypingClosed,

    #[error("typing command must be closed before it is reapplied")]
    OpenTypingCommand,
}

/// Errors that can occur when loading an editing configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "config")]
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[cfg(feature = "config")]
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("validation errors: {}", .0.join("; "))]
    Validation(Vec<String>),
}
