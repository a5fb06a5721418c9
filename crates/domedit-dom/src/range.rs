#![forbid(unsafe_code)]

//! Boundary-point arithmetic over the document tree.
//!
//! Positions are compared through their *tree key*: the child-index path
//! from the tree root to the position's node, followed by the offset. Two
//! keys compare lexicographically, with a proper prefix ordering first,
//! which matches DOM boundary-point order for both text and element
//! positions.

use std::cmp::Ordering;

use crate::document::Document;
use crate::error::{DomError, DomResult};
use crate::node::NodeId;
use crate::selection::Position;

/// Work item for the containment walk. The walk keeps one child-index
/// path that `Enter` extends and `Leave` shortens.
enum Walk {
    Children(NodeId),
    Enter(NodeId, usize),
    Leave,
    Emit(NodeId),
}

impl Document {
    /// Tree root of `node` and the child-index path leading to it.
    fn tree_path(&self, node: NodeId) -> DomResult<(NodeId, Vec<usize>)> {
        let mut path = Vec::new();
        let mut current = node;
        while let Some(parent) = self.parent(current)? {
            path.push(self.index_in_parent(current)?.unwrap_or_default());
            current = parent;
        }
        path.reverse();
        Ok((current, path))
    }

    fn tree_key(&self, pos: Position) -> DomResult<(NodeId, Vec<usize>)> {
        let (root, mut key) = self.tree_path(pos.node)?;
        key.push(pos.offset);
        Ok((root, key))
    }

    /// Order two boundary points in document order.
    pub fn compare_positions(&self, a: Position, b: Position) -> DomResult<Ordering> {
        let (root_a, key_a) = self.tree_key(a)?;
        let (root_b, key_b) = self.tree_key(b)?;
        if root_a != root_b {
            return Err(DomError::Disconnected(a.node, b.node));
        }
        Ok(key_a.cmp(&key_b))
    }

    /// Boundary point immediately before `node` in its parent.
    pub fn position_before(&self, node: NodeId) -> DomResult<Option<Position>> {
        let Some(parent) = self.parent(node)? else {
            return Ok(None);
        };
        let index = self.index_in_parent(node)?.unwrap_or_default();
        Ok(Some(Position::new(parent, index)))
    }

    /// Boundary point immediately after `node` in its parent.
    pub fn position_after(&self, node: NodeId) -> DomResult<Option<Position>> {
        Ok(self
            .position_before(node)?
            .map(|pos| Position::new(pos.node, pos.offset + 1)))
    }

    /// Top-most nodes lying entirely between `start` and `end`, in document order.
    ///
    /// A node is contained when the boundary before it is at or after
    /// `start` and the boundary after it is at or before `end`. Descendants
    /// of a contained node are not reported separately.
    pub fn contained_nodes(&self, start: Position, end: Position) -> DomResult<Vec<NodeId>> {
        let (root, start_key) = self.tree_key(start)?;
        let (end_root, end_key) = self.tree_key(end)?;
        if root != end_root {
            return Err(DomError::Disconnected(start.node, end.node));
        }
        let mut out = Vec::new();
        if start_key >= end_key {
            return Ok(out);
        }
        self.collect_contained(root, &start_key, &end_key, &mut out)?;
        Ok(out)
    }

    fn collect_contained(
        &self,
        root: NodeId,
        start_key: &[usize],
        end_key: &[usize],
        out: &mut Vec<NodeId>,
    ) -> DomResult<()> {
        let mut path: Vec<usize> = Vec::new();
        let mut pending = vec![Walk::Children(root)];
        while let Some(item) = pending.pop() {
            let node = match item {
                Walk::Emit(node) => {
                    out.push(node);
                    continue;
                }
                Walk::Leave => {
                    path.pop();
                    continue;
                }
                Walk::Enter(node, index) => {
                    path.push(index);
                    pending.push(Walk::Leave);
                    node
                }
                Walk::Children(node) => node,
            };

            let depth = path.len();
            path.push(0);
            let mut next = Vec::new();
            for (index, &child) in self.children(node)?.iter().enumerate() {
                // Boundary before the child.
                path[depth] = index;
                let before_ok = path.as_slice() >= start_key;
                let entirely_after = path.as_slice() >= end_key;
                // Boundary after the child.
                path[depth] = index + 1;
                let after_ok = path.as_slice() <= end_key;
                let entirely_before = path.as_slice() <= start_key;

                if before_ok && after_ok {
                    next.push(Walk::Emit(child));
                } else if !entirely_before && !entirely_after {
                    next.push(Walk::Enter(child, index));
                }
            }
            path.pop();
            pending.extend(next.into_iter().rev());
        }
        Ok(())
    }

    /// Nearest childless node preceding `node` in document order.
    pub fn previous_leaf(&self, node: NodeId) -> DomResult<Option<NodeId>> {
        let mut current = node;
        loop {
            if let Some(mut prev) = self.previous_sibling(current)? {
                while let Some(&last) = self.children(prev)?.last() {
                    prev = last;
                }
                return Ok(Some(prev));
            }
            match self.parent(current)? {
                Some(parent) => current = parent,
                None => return Ok(None),
            }
        }
    }

    /// Pre-order list of `node` and all of its descendants.
    pub fn descendants(&self, node: NodeId) -> DomResult<Vec<NodeId>> {
        let mut out = Vec::new();
        let mut pending = vec![node];
        while let Some(current) = pending.pop() {
            out.push(current);
            pending.extend(self.children(current)?.iter().rev());
        }
        Ok(out)
    }
}
