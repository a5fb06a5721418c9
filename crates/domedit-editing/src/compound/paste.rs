#![forbid(unsafe_code)]

use domedit_dom::{Document, NodeId, Position, Selection};

use crate::command::{CommandBase, Step};
use crate::composite::CompositeEditCommand;
use crate::compound::{caret_following, collapse_for_edit, insert_node_at};
use crate::error::EditResult;

/// Caret after the last pasted node: inside it at the end when it is text.
fn caret_after_paste(doc: &Document, last: NodeId, after: Position) -> EditResult<Selection> {
    if doc.is_text(last)? {
        Ok(Selection::caret(last, doc.text_len(last)?))
    } else {
        caret_following(doc, last, after)
    }
}

// ============================================================================
// PasteHtmlCommand
// ============================================================================

/// Paste an HTML fragment at the selection, replacing a range selection.
#[derive(Debug)]
pub struct PasteHtmlCommand {
    composite: CompositeEditCommand,
    html: String,
}

impl PasteHtmlCommand {
    #[must_use]
    pub fn new(doc: &Document, html: &str) -> Self {
        Self {
            composite: CompositeEditCommand::new(doc, "Paste"),
            html: html.to_string(),
        }
    }

    #[must_use]
    pub fn html(&self) -> &str {
        &self.html
    }
}

impl Step for PasteHtmlCommand {
    fn base(&self) -> &CommandBase {
        self.composite.base()
    }

    fn base_mut(&mut self) -> &mut CommandBase {
        self.composite.base_mut()
    }

    fn do_apply(&mut self, doc: &mut Document) -> EditResult<()> {
        let html = &self.html;
        self.composite.build(doc, |composite, doc| {
            let nodes = doc.parse_fragment(html)?;
            composite.adopt(&nodes);
            let mut at = collapse_for_edit(composite, doc)?;
            for &node in &nodes {
                at = insert_node_at(composite, doc, node, at)?;
            }
            if let Some(&last) = nodes.last() {
                let ending = caret_after_paste(doc, last, at)?;
                composite.base_mut().set_ending_selection(ending);
            }
            tracing::debug!(nodes = nodes.len(), "pasted fragment");
            Ok(())
        })
    }

    fn do_unapply(&mut self, doc: &mut Document) -> EditResult<()> {
        self.composite.unapply_children(doc)
    }

    fn do_reapply(&mut self, doc: &mut Document) -> EditResult<()> {
        self.composite.reapply_children(doc)
    }

    fn collect_nodes(&self, out: &mut Vec<NodeId>) {
        self.composite.collect_nodes(out);
    }

    fn discard_created(&mut self, doc: &mut Document) {
        self.composite.discard_created(doc);
    }

    fn name(&self) -> &'static str {
        "PasteHtmlCommand"
    }

    fn description(&self) -> &str {
        "Paste"
    }

    fn size_bytes(&self) -> usize {
        std::mem::size_of::<Self>() + self.html.len() + self.composite.children_size()
    }
}

// ============================================================================
// PasteImageCommand
// ============================================================================

/// Insert an `<img src=...>` at the selection.
#[derive(Debug)]
pub struct PasteImageCommand {
    composite: CompositeEditCommand,
    src: String,
}

impl PasteImageCommand {
    #[must_use]
    pub fn new(doc: &Document, src: &str) -> Self {
        Self {
            composite: CompositeEditCommand::new(doc, "Paste Image"),
            src: src.to_string(),
        }
    }

    #[must_use]
    pub fn src(&self) -> &str {
        &self.src
    }
}

impl Step for PasteImageCommand {
    fn base(&self) -> &CommandBase {
        self.composite.base()
    }

    fn base_mut(&mut self) -> &mut CommandBase {
        self.composite.base_mut()
    }

    fn do_apply(&mut self, doc: &mut Document) -> EditResult<()> {
        let src = &self.src;
        self.composite.build(doc, |composite, doc| {
            let at = collapse_for_edit(composite, doc)?;
            let img = composite.create_element(doc, "img", vec![("src".to_string(), src.clone())]);
            let after = insert_node_at(composite, doc, img, at)?;
            let ending = caret_following(doc, img, after)?;
            composite.base_mut().set_ending_selection(ending);
            Ok(())
        })
    }

    fn do_unapply(&mut self, doc: &mut Document) -> EditResult<()> {
        self.composite.unapply_children(doc)
    }

    fn do_reapply(&mut self, doc: &mut Document) -> EditResult<()> {
        self.composite.reapply_children(doc)
    }

    fn collect_nodes(&self, out: &mut Vec<NodeId>) {
        self.composite.collect_nodes(out);
    }

    fn discard_created(&mut self, doc: &mut Document) {
        self.composite.discard_created(doc);
    }

    fn name(&self) -> &'static str {
        "PasteImageCommand"
    }

    fn description(&self) -> &str {
        "Paste Image"
    }

    fn size_bytes(&self) -> usize {
        std::mem::size_of::<Self>() + self.src.len() + self.composite.children_size()
    }
}
