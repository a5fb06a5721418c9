#![forbid(unsafe_code)]

//! Identity-free structural snapshots.
//!
//! Two trees are structurally equal when their snapshots compare equal:
//! same node kinds, same character data, same attributes, same child
//! order. Node handles are not part of the comparison, so a subtree that
//! was split and rejoined through a fresh node still matches.

use crate::document::Document;
use crate::error::DomResult;
use crate::node::{NodeId, NodeKind};

/// Owned copy of a subtree without node identities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeSnapshot {
    pub kind: NodeKind,
    pub children: Vec<NodeSnapshot>,
}

impl Document {
    /// Capture the structure of `node`'s subtree.
    pub fn snapshot(&self, node: NodeId) -> DomResult<NodeSnapshot> {
        let children = self
            .children(node)?
            .iter()
            .map(|&child| self.snapshot(child))
            .collect::<DomResult<Vec<_>>>()?;
        Ok(NodeSnapshot {
            kind: self.kind(node)?.clone(),
            children,
        })
    }
}
