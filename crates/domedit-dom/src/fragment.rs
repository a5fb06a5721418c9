#![forbid(unsafe_code)]

//! HTML fragment parsing and serialization.
//!
//! Parsing goes through html5ever (via kuchiki) in the `<body>` context, so
//! paste input gets the same implied end tags, raw-text handling and error
//! recovery a browser applies. The parsed tree is then copied into the
//! arena as detached nodes. Comments, doctypes and processing instructions
//! are dropped.

use html_escape::{encode_double_quoted_attribute, encode_text};
use html5ever::{LocalName, Namespace, QualName};
use kuchiki::NodeRef;
use kuchiki::traits::*;

use crate::document::Document;
use crate::error::DomResult;
use crate::node::{NodeId, NodeKind};

/// Elements serialized without an end tag and never given children.
pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// Elements whose text children are serialized without escaping.
pub const RAW_TEXT_ELEMENTS: &[&str] = &[
    "iframe", "noembed", "noframes", "noscript", "plaintext", "script", "style", "xmp",
];

const HTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

#[must_use]
pub fn is_void_element(tag: &str) -> bool {
    VOID_ELEMENTS.contains(&tag)
}

#[must_use]
pub fn is_raw_text_element(tag: &str) -> bool {
    RAW_TEXT_ELEMENTS.contains(&tag)
}

/// Parse `html` as the children of a `<body>` element.
fn parse_body_fragment(html: &str) -> NodeRef {
    let context = QualName::new(
        None,
        Namespace::from(HTML_NAMESPACE),
        LocalName::from("body"),
    );
    let parsed = kuchiki::parse_fragment(context, Vec::new()).one(html);
    // Fragment parsing wraps the result in a synthetic <html> element.
    parsed
        .children()
        .find(|child| child.as_element().is_some())
        .unwrap_or(parsed)
}

fn element_attributes(element: &kuchiki::ElementData) -> Vec<(String, String)> {
    element
        .attributes
        .borrow()
        .map
        .iter()
        .map(|(name, attribute)| {
            let name = match &attribute.prefix {
                Some(prefix) => format!("{}:{}", &**prefix, &*name.local),
                None => name.local.to_string(),
            };
            (name, attribute.value.clone())
        })
        .collect()
}

/// Walk work item for the serializer.
enum Emit {
    Node { node: NodeId, raw: bool },
    EndTag(NodeId),
}

impl Document {
    /// Parse `html` into detached nodes, returning the top-level ones in order.
    ///
    /// Parsing never fails on malformed markup; it recovers the way a
    /// browser does. On a tree error every node created so far is freed.
    pub fn parse_fragment(&mut self, html: &str) -> DomResult<Vec<NodeId>> {
        let container = parse_body_fragment(html);
        let mut top: Vec<NodeId> = Vec::new();
        let mut pending: Vec<(NodeRef, Option<NodeId>)> =
            container.children().rev().map(|child| (child, None)).collect();

        while let Some((source, parent)) = pending.pop() {
            let node = if let Some(element) = source.as_element() {
                let attributes = element_attributes(element);
                self.create_element_with_attributes(&element.name.local, attributes)
            } else if let Some(text) = source.as_text() {
                self.create_text(&text.borrow())
            } else {
                continue;
            };

            match parent {
                Some(parent) => {
                    if let Err(err) = self.append_child(parent, node) {
                        top.push(node);
                        self.discard_parsed(&top);
                        return Err(err);
                    }
                }
                None => top.push(node),
            }

            if source.as_element().is_some() {
                pending.extend(source.children().rev().map(|child| (child, Some(node))));
            }
        }

        tracing::trace!(document = %self.id(), nodes = top.len(), "parsed fragment");
        Ok(top)
    }

    fn discard_parsed(&mut self, nodes: &[NodeId]) {
        for &node in nodes {
            if let Err(err) = self.destroy_node(node) {
                tracing::warn!(document = %self.id(), node = %node, error = %err, "could not free parsed node");
            }
        }
    }

    // ========================================================================
    // Serialization
    // ========================================================================

    /// Serialize `node` and its subtree.
    pub fn to_html(&self, node: NodeId) -> DomResult<String> {
        let mut out = String::new();
        self.write_html(node, false, &mut out)?;
        Ok(out)
    }

    /// Serialize the children of `node`.
    pub fn inner_html(&self, node: NodeId) -> DomResult<String> {
        let raw = self.kind(node)?.tag().is_some_and(is_raw_text_element);
        let mut out = String::new();
        for &child in self.children(node)? {
            self.write_html(child, raw, &mut out)?;
        }
        Ok(out)
    }

    fn write_html(&self, node: NodeId, raw: bool, out: &mut String) -> DomResult<()> {
        let mut pending = vec![Emit::Node { node, raw }];
        while let Some(item) = pending.pop() {
            let (node, raw) = match item {
                Emit::EndTag(node) => {
                    if let Some(tag) = self.kind(node)?.tag() {
                        out.push_str("</");
                        out.push_str(tag);
                        out.push('>');
                    }
                    continue;
                }
                Emit::Node { node, raw } => (node, raw),
            };
            match self.kind(node)? {
                NodeKind::Text(data) if raw => out.push_str(data),
                NodeKind::Text(data) => out.push_str(&encode_text(data)),
                NodeKind::Element { tag, attributes } => {
                    out.push('<');
                    out.push_str(tag);
                    for (name, value) in attributes {
                        out.push(' ');
                        out.push_str(name);
                        out.push_str("=\"");
                        out.push_str(&encode_double_quoted_attribute(value));
                        out.push('"');
                    }
                    out.push('>');
                    if is_void_element(tag) {
                        continue;
                    }
                    let raw = is_raw_text_element(tag);
                    pending.push(Emit::EndTag(node));
                    pending.extend(
                        self.children(node)?
                            .iter()
                            .rev()
                            .map(|&child| Emit::Node { node: child, raw }),
                    );
                }
            }
        }
        Ok(())
    }

    /// Concatenated character data of `node` and its descendants.
    pub fn text_content(&self, node: NodeId) -> DomResult<String> {
        let mut out = String::new();
        for n in self.descendants(node)? {
            if let NodeKind::Text(data) = self.kind(n)? {
                out.push_str(data);
            }
        }
        Ok(out)
    }
}
