#![forbid(unsafe_code)]

//! Node handles and node payloads.
//!
//! Nodes live in a [`Document`](crate::Document) arena and are addressed by
//! [`NodeId`], a slot index paired with a generation counter. Destroying a
//! node bumps its slot generation, so every handle still pointing at the
//! old occupant is detected as stale instead of silently aliasing whatever
//! node reuses the slot.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Stable handle to a node inside a document arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

impl NodeId {
    pub(crate) const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Slot index in the arena.
    #[must_use]
    pub const fn index(self) -> u32 {
        self.index
    }

    /// Generation of the slot when this handle was issued.
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}v{}", self.index, self.generation)
    }
}

/// Process-unique document identity.
///
/// Commands remember the document they were created against and refuse to
/// run against any other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentId(u64);

static NEXT_DOCUMENT_ID: AtomicU64 = AtomicU64::new(1);

impl DocumentId {
    pub(crate) fn next() -> Self {
        Self(NEXT_DOCUMENT_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "doc{}", self.0)
    }
}

/// Payload of a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// An element with a lowercase tag name and ordered attributes.
    Element {
        tag: String,
        attributes: Vec<(String, String)>,
    },
    /// A character data node.
    Text(String),
}

impl NodeKind {
    /// Create an element payload without attributes.
    #[must_use]
    pub fn element(tag: impl Into<String>) -> Self {
        Self::Element {
            tag: tag.into().to_ascii_lowercase(),
            attributes: Vec::new(),
        }
    }

    /// Create a text payload.
    #[must_use]
    pub fn text(data: impl Into<String>) -> Self {
        Self::Text(data.into())
    }

    #[must_use]
    pub fn is_text(&self) -> bool {
        matches!(self, Self::Text(_))
    }

    /// Tag name for elements, `None` for text.
    #[must_use]
    pub fn tag(&self) -> Option<&str> {
        match self {
            Self::Element { tag, .. } => Some(tag),
            Self::Text(_) => None,
        }
    }

    /// Attribute value by name (elements only).
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        match self {
            Self::Element { attributes, .. } => attributes
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.as_str()),
            Self::Text(_) => None,
        }
    }
}

/// Arena record for one live node.
#[derive(Debug, Clone)]
pub(crate) struct NodeData {
    pub(crate) kind: NodeKind,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
}

impl NodeData {
    pub(crate) fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            parent: None,
            children: Vec::new(),
        }
    }
}

/// Arena slot: the current generation and its occupant, if any.
#[derive(Debug, Clone)]
pub(crate) struct Slot {
    pub(crate) generation: u32,
    pub(crate) data: Option<NodeData>,
}

/// Number of Unicode scalar values in `s`.
#[must_use]
pub fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Byte offset of the `char_offset`-th scalar value, or `None` past the end.
#[must_use]
pub fn byte_offset(s: &str, char_offset: usize) -> Option<usize> {
    if char_offset == 0 {
        return Some(0);
    }
    match s.char_indices().nth(char_offset) {
        Some((byte, _)) => Some(byte),
        None if char_len(s) == char_offset => Some(s.len()),
        None => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_ids_are_unique() {
        let a = DocumentId::next();
        let b = DocumentId::next();
        assert_ne!(a, b);
        assert!(b.raw() > a.raw());
    }

    #[test]
    fn test_element_tag_is_lowercased() {
        let kind = NodeKind::element("BR");
        assert_eq!(kind.tag(), Some("br"));
        assert!(!kind.is_text());
    }

    #[test]
    fn test_attribute_lookup() {
        let kind = NodeKind::Element {
            tag: "img".into(),
            attributes: vec![("src".into(), "a.png".into())],
        };
        assert_eq!(kind.attribute("src"), Some("a.png"));
        assert_eq!(kind.attribute("alt"), None);
        assert_eq!(NodeKind::text("x").attribute("src"), None);
    }

    #[test]
    fn test_byte_offset_multibyte() {
        let s = "héllo";
        assert_eq!(byte_offset(s, 0), Some(0));
        assert_eq!(byte_offset(s, 2), Some(3));
        assert_eq!(byte_offset(s, 5), Some(s.len()));
        assert_eq!(byte_offset(s, 6), None);
        assert_eq!(char_len(s), 5);
    }

    #[test]
    fn test_node_id_display() {
        let id = NodeId::new(3, 7);
        assert_eq!(id.to_string(), "#3v7");
    }
}
