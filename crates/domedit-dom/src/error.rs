#![forbid(unsafe_code)]

use thiserror::Error;

use crate::node::NodeId;

/// Result alias for tree primitives.
pub type DomResult<T> = std::result::Result<T, DomError>;

/// Errors raised by document tree primitives.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomError {
    #[error("node {0} no longer exists")]
    StaleNode(NodeId),

    #[error("node {0} is not a text node")]
    NotText(NodeId),

    #[error("node {0} cannot have children")]
    NotContainer(NodeId),

    #[error("node {child} is not a child of {parent}")]
    NotAChild { parent: NodeId, child: NodeId },

    #[error("offset {offset} out of bounds (length {length})")]
    OffsetOutOfBounds { offset: usize, length: usize },

    #[error("inserting {child} under {parent} would create a cycle")]
    HierarchyRequest { parent: NodeId, child: NodeId },

    #[error("nodes {0} and {1} are not in the same tree")]
    Disconnected(NodeId, NodeId),
}
