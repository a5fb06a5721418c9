#![forbid(unsafe_code)]

//! Arena-backed document tree.
//!
//! The [`Document`] owns every node. Tree primitives are atomic: each either
//! applies completely and is immediately observable, or fails without
//! touching the tree.
//!
//! # Invariants
//!
//! - A node has at most one parent and appears exactly once in that
//!   parent's child list.
//! - Text nodes never have children.
//! - The root is never detached or destroyed.
//! - Detached nodes stay alive until [`Document::destroy_node`]; edit
//!   commands rely on this to re-insert nodes they removed.

use crate::error::{DomError, DomResult};
use crate::node::{DocumentId, NodeData, NodeId, NodeKind, Slot, byte_offset, char_len};
use crate::selection::Selection;

/// Tag used for the root element of a new document.
pub const ROOT_TAG: &str = "body";

/// A mutable node tree plus its live selection.
///
/// Cloning copies the tree with every [`NodeId`] intact but gives the copy
/// a fresh [`DocumentId`], so commands bound to the original are rejected
/// by the copy.
#[derive(Debug)]
pub struct Document {
    id: DocumentId,
    slots: Vec<Slot>,
    free: Vec<u32>,
    root: NodeId,
    selection: Selection,
}

impl Clone for Document {
    fn clone(&self) -> Self {
        Self {
            id: DocumentId::next(),
            slots: self.slots.clone(),
            free: self.free.clone(),
            root: self.root,
            selection: self.selection,
        }
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create an empty document with a `<body>` root.
    #[must_use]
    pub fn new() -> Self {
        let mut doc = Self {
            id: DocumentId::next(),
            slots: Vec::new(),
            free: Vec::new(),
            root: NodeId::new(0, 0),
            selection: Selection::None,
        };
        doc.root = doc.alloc(NodeKind::element(ROOT_TAG));
        doc
    }

    /// Process-unique identity of this document.
    #[must_use]
    pub fn id(&self) -> DocumentId {
        self.id
    }

    #[must_use]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Current live selection.
    #[must_use]
    pub fn selection(&self) -> Selection {
        self.selection
    }

    pub fn set_selection(&mut self, selection: Selection) {
        self.selection = selection;
    }

    /// Number of live nodes, attached or not.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.slots.iter().filter(|s| s.data.is_some()).count()
    }

    // ========================================================================
    // Allocation
    // ========================================================================

    fn alloc(&mut self, kind: NodeKind) -> NodeId {
        let data = Some(NodeData::new(kind));
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.data = data;
            return NodeId::new(index, slot.generation);
        }
        let index = u32::try_from(self.slots.len()).unwrap_or(u32::MAX);
        self.slots.push(Slot {
            generation: 0,
            data,
        });
        NodeId::new(index, 0)
    }

    /// Create a detached element.
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.alloc(NodeKind::element(tag))
    }

    /// Create a detached element with attributes.
    pub fn create_element_with_attributes(
        &mut self,
        tag: &str,
        attributes: Vec<(String, String)>,
    ) -> NodeId {
        self.alloc(NodeKind::Element {
            tag: tag.to_ascii_lowercase(),
            attributes,
        })
    }

    /// Create a detached text node.
    pub fn create_text(&mut self, data: &str) -> NodeId {
        self.alloc(NodeKind::text(data))
    }

    /// Detach `node` and free it together with its subtree.
    ///
    /// Every outstanding handle into the subtree becomes stale.
    pub fn destroy_node(&mut self, node: NodeId) -> DomResult<()> {
        if node == self.root {
            return Err(DomError::HierarchyRequest {
                parent: node,
                child: node,
            });
        }
        self.remove_node(node)?;
        let mut pending = vec![node];
        while let Some(current) = pending.pop() {
            let slot = &mut self.slots[current.index() as usize];
            if let Some(data) = slot.data.take() {
                pending.extend(data.children);
            }
            slot.generation = slot.generation.wrapping_add(1);
            self.free.push(current.index());
        }
        tracing::trace!(document = %self.id, node = %node, "destroyed subtree");
        Ok(())
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Whether `node` refers to a live node.
    #[must_use]
    pub fn contains(&self, node: NodeId) -> bool {
        self.data(node).is_ok()
    }

    fn data(&self, node: NodeId) -> DomResult<&NodeData> {
        self.slots
            .get(node.index() as usize)
            .filter(|slot| slot.generation == node.generation())
            .and_then(|slot| slot.data.as_ref())
            .ok_or(DomError::StaleNode(node))
    }

    fn data_mut(&mut self, node: NodeId) -> DomResult<&mut NodeData> {
        self.slots
            .get_mut(node.index() as usize)
            .filter(|slot| slot.generation == node.generation())
            .and_then(|slot| slot.data.as_mut())
            .ok_or(DomError::StaleNode(node))
    }

    pub fn kind(&self, node: NodeId) -> DomResult<&NodeKind> {
        Ok(&self.data(node)?.kind)
    }

    pub fn is_text(&self, node: NodeId) -> DomResult<bool> {
        Ok(self.kind(node)?.is_text())
    }

    /// Character data of a text node.
    pub fn text(&self, node: NodeId) -> DomResult<&str> {
        match self.kind(node)? {
            NodeKind::Text(data) => Ok(data),
            NodeKind::Element { .. } => Err(DomError::NotText(node)),
        }
    }

    /// Length of a text node in characters.
    pub fn text_len(&self, node: NodeId) -> DomResult<usize> {
        Ok(char_len(self.text(node)?))
    }

    /// Boundary-point length: characters for text, children for elements.
    pub fn node_len(&self, node: NodeId) -> DomResult<usize> {
        let data = self.data(node)?;
        Ok(match &data.kind {
            NodeKind::Text(text) => char_len(text),
            NodeKind::Element { .. } => data.children.len(),
        })
    }

    /// `count` characters of a text node starting at `offset`.
    pub fn substring(&self, node: NodeId, offset: usize, count: usize) -> DomResult<String> {
        let text = self.text(node)?;
        let (start, end) = char_span(text, offset, count)?;
        Ok(text[start..end].to_string())
    }

    pub fn parent(&self, node: NodeId) -> DomResult<Option<NodeId>> {
        Ok(self.data(node)?.parent)
    }

    pub fn children(&self, node: NodeId) -> DomResult<&[NodeId]> {
        Ok(&self.data(node)?.children)
    }

    /// Position of `node` in its parent's child list.
    pub fn index_in_parent(&self, node: NodeId) -> DomResult<Option<usize>> {
        let Some(parent) = self.parent(node)? else {
            return Ok(None);
        };
        let index = self
            .children(parent)?
            .iter()
            .position(|&c| c == node)
            .ok_or(DomError::NotAChild {
                parent,
                child: node,
            })?;
        Ok(Some(index))
    }

    pub fn next_sibling(&self, node: NodeId) -> DomResult<Option<NodeId>> {
        let Some(parent) = self.parent(node)? else {
            return Ok(None);
        };
        let index = self.index_in_parent(node)?.unwrap_or_default();
        Ok(self.children(parent)?.get(index + 1).copied())
    }

    pub fn previous_sibling(&self, node: NodeId) -> DomResult<Option<NodeId>> {
        let Some(parent) = self.parent(node)? else {
            return Ok(None);
        };
        let index = self.index_in_parent(node)?.unwrap_or_default();
        Ok(index
            .checked_sub(1)
            .and_then(|i| self.children(parent).ok()?.get(i).copied()))
    }

    /// Whether `ancestor` is `node` or one of its ancestors.
    pub fn is_inclusive_ancestor(&self, ancestor: NodeId, node: NodeId) -> DomResult<bool> {
        let mut current = Some(node);
        while let Some(n) = current {
            if n == ancestor {
                return Ok(true);
            }
            current = self.parent(n)?;
        }
        Ok(false)
    }

    /// Whether `node` is attached under the root.
    #[must_use]
    pub fn is_connected(&self, node: NodeId) -> bool {
        self.is_inclusive_ancestor(self.root, node)
            .unwrap_or(false)
    }

    // ========================================================================
    // Tree primitives
    // ========================================================================

    /// Insert `child` into `parent` before `reference` (append when `None`).
    ///
    /// An attached `child` is moved. Fails without side effects if the
    /// insertion would create a cycle or `reference` is not a child of
    /// `parent`.
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> DomResult<()> {
        if self.kind(parent)?.is_text() {
            return Err(DomError::NotContainer(parent));
        }
        self.data(child)?;
        if self.is_inclusive_ancestor(child, parent)? {
            return Err(DomError::HierarchyRequest { parent, child });
        }
        let reference = match reference {
            Some(r) if r == child => self.next_sibling(child)?,
            other => other,
        };
        if let Some(r) = reference {
            if self.parent(r)? != Some(parent) {
                return Err(DomError::NotAChild { parent, child: r });
            }
        }

        self.remove_node(child)?;
        let index = match reference {
            Some(r) => self
                .children(parent)?
                .iter()
                .position(|&c| c == r)
                .ok_or(DomError::NotAChild { parent, child: r })?,
            None => self.children(parent)?.len(),
        };
        self.data_mut(parent)?.children.insert(index, child);
        self.data_mut(child)?.parent = Some(parent);
        Ok(())
    }

    /// Append `child` as the last child of `parent`.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> DomResult<()> {
        self.insert_before(parent, child, None)
    }

    /// Detach `node` from its parent. Detached nodes are left untouched.
    pub fn remove_node(&mut self, node: NodeId) -> DomResult<()> {
        if node == self.root {
            return Err(DomError::HierarchyRequest {
                parent: node,
                child: node,
            });
        }
        let Some(parent) = self.parent(node)? else {
            return Ok(());
        };
        let siblings = &mut self.data_mut(parent)?.children;
        let index = siblings
            .iter()
            .position(|&c| c == node)
            .ok_or(DomError::NotAChild {
                parent,
                child: node,
            })?;
        siblings.remove(index);
        self.data_mut(node)?.parent = None;
        Ok(())
    }

    /// Insert `data` into a text node at character `offset`.
    pub fn insert_text(&mut self, node: NodeId, offset: usize, data: &str) -> DomResult<()> {
        let text = self.text_mut(node)?;
        let length = char_len(text);
        let byte = byte_offset(text, offset).ok_or(DomError::OffsetOutOfBounds { offset, length })?;
        text.insert_str(byte, data);
        Ok(())
    }

    /// Delete `count` characters from a text node at `offset`, returning them.
    pub fn delete_text(&mut self, node: NodeId, offset: usize, count: usize) -> DomResult<String> {
        let text = self.text_mut(node)?;
        let (start, end) = char_span(text, offset, count)?;
        Ok(text.drain(start..end).collect())
    }

    fn text_mut(&mut self, node: NodeId) -> DomResult<&mut String> {
        match &mut self.data_mut(node)?.kind {
            NodeKind::Text(data) => Ok(data),
            NodeKind::Element { .. } => Err(DomError::NotText(node)),
        }
    }
}

/// Byte span of `count` characters at `offset`.
fn char_span(text: &str, offset: usize, count: usize) -> DomResult<(usize, usize)> {
    let length = char_len(text);
    let end_offset = offset.saturating_add(count);
    let out_of_bounds = DomError::OffsetOutOfBounds {
        offset: end_offset,
        length,
    };
    if end_offset > length {
        return Err(out_of_bounds);
    }
    let start = byte_offset(text, offset).ok_or(out_of_bounds.clone())?;
    let end = byte_offset(text, end_offset).ok_or(out_of_bounds)?;
    Ok((start, end))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc_with_text(data: &str) -> (Document, NodeId) {
        let mut doc = Document::new();
        let text = doc.create_text(data);
        let root = doc.root();
        doc.append_child(root, text).unwrap();
        (doc, text)
    }

    #[test]
    fn test_new_document_has_body_root() {
        let doc = Document::new();
        assert_eq!(doc.kind(doc.root()).unwrap().tag(), Some("body"));
        assert_eq!(doc.node_count(), 1);
        assert!(doc.selection().is_none());
    }

    #[test]
    fn test_append_and_siblings() {
        let mut doc = Document::new();
        let root = doc.root();
        let a = doc.create_text("a");
        let b = doc.create_element("b");
        doc.append_child(root, a).unwrap();
        doc.append_child(root, b).unwrap();
        assert_eq!(doc.children(root).unwrap(), &[a, b]);
        assert_eq!(doc.next_sibling(a).unwrap(), Some(b));
        assert_eq!(doc.previous_sibling(b).unwrap(), Some(a));
        assert_eq!(doc.previous_sibling(a).unwrap(), None);
        assert_eq!(doc.index_in_parent(b).unwrap(), Some(1));
    }

    #[test]
    fn test_insert_before_moves_attached_node() {
        let mut doc = Document::new();
        let root = doc.root();
        let a = doc.create_element("p");
        let b = doc.create_element("p");
        doc.append_child(root, a).unwrap();
        doc.append_child(root, b).unwrap();
        doc.insert_before(root, b, Some(a)).unwrap();
        assert_eq!(doc.children(root).unwrap(), &[b, a]);
    }

    #[test]
    fn test_insert_before_self_reference() {
        let mut doc = Document::new();
        let root = doc.root();
        let a = doc.create_element("p");
        let b = doc.create_element("p");
        doc.append_child(root, a).unwrap();
        doc.append_child(root, b).unwrap();
        doc.insert_before(root, a, Some(a)).unwrap();
        assert_eq!(doc.children(root).unwrap(), &[a, b]);
    }

    #[test]
    fn test_insert_rejects_cycle() {
        let mut doc = Document::new();
        let root = doc.root();
        let outer = doc.create_element("div");
        let inner = doc.create_element("div");
        doc.append_child(root, outer).unwrap();
        doc.append_child(outer, inner).unwrap();
        let err = doc.append_child(inner, outer).unwrap_err();
        assert_eq!(
            err,
            DomError::HierarchyRequest {
                parent: inner,
                child: outer
            }
        );
        assert_eq!(doc.parent(outer).unwrap(), Some(root));
    }

    #[test]
    fn test_text_cannot_have_children() {
        let (mut doc, text) = doc_with_text("x");
        let el = doc.create_element("i");
        assert_eq!(
            doc.append_child(text, el).unwrap_err(),
            DomError::NotContainer(text)
        );
    }

    #[test]
    fn test_reference_must_be_child() {
        let mut doc = Document::new();
        let root = doc.root();
        let stray = doc.create_element("p");
        let node = doc.create_element("p");
        let err = doc.insert_before(root, node, Some(stray)).unwrap_err();
        assert_eq!(
            err,
            DomError::NotAChild {
                parent: root,
                child: stray
            }
        );
        assert_eq!(doc.parent(node).unwrap(), None);
    }

    #[test]
    fn test_remove_detaches_but_keeps_node() {
        let (mut doc, text) = doc_with_text("hello");
        doc.remove_node(text).unwrap();
        assert!(doc.contains(text));
        assert!(!doc.is_connected(text));
        assert_eq!(doc.text(text).unwrap(), "hello");
        // Removing again is a no-op.
        doc.remove_node(text).unwrap();
    }

    #[test]
    fn test_root_cannot_be_removed() {
        let mut doc = Document::new();
        let root = doc.root();
        assert!(doc.remove_node(root).is_err());
        assert!(doc.destroy_node(root).is_err());
    }

    #[test]
    fn test_text_editing_primitives() {
        let (mut doc, text) = doc_with_text("helloworld");
        doc.insert_text(text, 5, ", ").unwrap();
        assert_eq!(doc.text(text).unwrap(), "hello, world");
        let removed = doc.delete_text(text, 5, 2).unwrap();
        assert_eq!(removed, ", ");
        assert_eq!(doc.text(text).unwrap(), "helloworld");
        assert_eq!(doc.substring(text, 5, 5).unwrap(), "world");
    }

    #[test]
    fn test_text_offsets_are_characters() {
        let (mut doc, text) = doc_with_text("añb");
        doc.insert_text(text, 2, "—").unwrap();
        assert_eq!(doc.text(text).unwrap(), "añ—b");
        assert_eq!(doc.text_len(text).unwrap(), 4);
        assert_eq!(doc.delete_text(text, 1, 2).unwrap(), "ñ—");
    }

    #[test]
    fn test_text_offset_out_of_bounds() {
        let (mut doc, text) = doc_with_text("abc");
        assert_eq!(
            doc.insert_text(text, 4, "x").unwrap_err(),
            DomError::OffsetOutOfBounds {
                offset: 4,
                length: 3
            }
        );
        assert!(doc.delete_text(text, 2, 2).is_err());
        assert_eq!(doc.text(text).unwrap(), "abc");
    }

    #[test]
    fn test_destroy_makes_handles_stale() {
        let mut doc = Document::new();
        let root = doc.root();
        let div = doc.create_element("div");
        let text = doc.create_text("t");
        doc.append_child(root, div).unwrap();
        doc.append_child(div, text).unwrap();
        doc.destroy_node(div).unwrap();

        assert_eq!(doc.kind(text).unwrap_err(), DomError::StaleNode(text));
        assert!(doc.children(root).unwrap().is_empty());

        // Slot reuse issues a new generation.
        assert!(!doc.contains(text));
        let reused = doc.create_text("new");
        assert_ne!(reused, text);
        assert_ne!(reused, div);
        assert!(!doc.contains(text));
    }

    #[test]
    fn test_clone_gets_fresh_id_and_same_nodes() {
        let mut doc = Document::new();
        let root = doc.root();
        let text = doc.create_text("abc");
        doc.append_child(root, text).unwrap();
        doc.set_selection(Selection::caret(text, 1));

        let mut copy = doc.clone();
        assert_ne!(copy.id(), doc.id());
        assert_eq!(copy.root(), root);
        assert_eq!(copy.text(text).unwrap(), "abc");
        assert_eq!(copy.selection(), doc.selection());

        copy.insert_text(text, 3, "d").unwrap();
        assert_eq!(doc.text(text).unwrap(), "abc");
    }
}
