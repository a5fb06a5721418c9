#![forbid(unsafe_code)]

//! Ordered groups of edit commands that apply and undo as one.
//!
//! A [`CompositeEditCommand`] owns its children. Each child is marked as a
//! composite step and its starting selection is seeded from the
//! composite's running ending selection, so later children see the caret
//! earlier children left behind.
//!
//! # Invariants
//!
//! 1. Children apply front to back and unapply back to front.
//! 2. After a successful apply the composite's ending selection is the
//!    ending selection of its last child (or its starting selection when it
//!    has none).
//! 3. Apply is all-or-nothing: if child *k* fails, children `0..k` are
//!    rolled back in reverse before the error is returned.
//! 4. Nodes created while building are owned by the composite until they
//!    are attached. A failed build frees every one still detached.

use domedit_dom::{Document, NodeId};

use crate::command::{CommandBase, CommandState, EditCommand, Step};
use crate::error::EditResult;

/// A sequence of child commands treated as one undo step.
#[derive(Debug)]
pub struct CompositeEditCommand {
    base: CommandBase,
    description: String,
    children: Vec<EditCommand>,
    /// Nodes allocated by the current build.
    created: Vec<NodeId>,
}

impl CompositeEditCommand {
    /// Create an empty composite bound to `doc`.
    #[must_use]
    pub fn new(doc: &Document, description: impl Into<String>) -> Self {
        Self {
            base: CommandBase::new(doc),
            description: description.into(),
            children: Vec::new(),
            created: Vec::new(),
        }
    }

    /// Queue a child to run when the composite is applied.
    pub fn push(&mut self, child: impl Into<EditCommand>) {
        self.children.push(child.into());
    }

    /// Builder-style [`push`](Self::push).
    #[must_use]
    pub fn with(mut self, child: impl Into<EditCommand>) -> Self {
        self.push(child);
        self
    }

    /// Apply `child` immediately as the next step and append it.
    ///
    /// The child is marked as a composite step and starts from the
    /// composite's current ending selection. On failure the child is
    /// dropped and the composite is unchanged.
    pub fn apply_child(
        &mut self,
        doc: &mut Document,
        child: impl Into<EditCommand>,
    ) -> EditResult<()> {
        let mut child = child.into();
        child.set_is_composite_step(true);
        child.set_starting_selection(self.base.ending_selection());
        child.apply(doc)?;
        self.base.set_ending_selection(child.ending_selection());
        self.children.push(child);
        Ok(())
    }

    /// Children in application order.
    #[must_use]
    pub fn children(&self) -> &[EditCommand] {
        &self.children
    }

    /// Number of children.
    #[must_use]
    pub fn len(&self) -> usize {
        self.children.len()
    }

    /// Whether the composite has no children.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// The most recently added child.
    #[must_use]
    pub fn last_child(&self) -> Option<&EditCommand> {
        self.children.last()
    }

    pub(crate) fn last_child_mut(&mut self) -> Option<&mut EditCommand> {
        self.children.last_mut()
    }

    pub(crate) fn pop_child(&mut self) -> Option<EditCommand> {
        self.children.pop()
    }

    pub(crate) fn base(&self) -> &CommandBase {
        &self.base
    }

    pub(crate) fn base_mut(&mut self) -> &mut CommandBase {
        &mut self.base
    }

    /// Create a detached text node owned by the current build.
    pub(crate) fn create_text(&mut self, doc: &mut Document, data: &str) -> NodeId {
        let node = doc.create_text(data);
        self.created.push(node);
        node
    }

    /// Create a detached element owned by the current build.
    pub(crate) fn create_element(
        &mut self,
        doc: &mut Document,
        tag: &str,
        attributes: Vec<(String, String)>,
    ) -> NodeId {
        let node = doc.create_element_with_attributes(tag, attributes);
        self.created.push(node);
        node
    }

    /// Take ownership of detached nodes allocated elsewhere, such as the
    /// result of fragment parsing.
    pub(crate) fn adopt(&mut self, nodes: &[NodeId]) {
        self.created.extend_from_slice(nodes);
    }

    /// Free created nodes that are still detached and forget the rest.
    fn release_created(&mut self, doc: &mut Document) {
        for node in self.created.drain(..) {
            if !doc.contains(node) || !matches!(doc.parent(node), Ok(None)) {
                continue;
            }
            if let Err(err) = doc.destroy_node(node) {
                tracing::warn!(node = %node, error = %err, "could not free created node");
            }
        }
    }

    pub(crate) fn collect_nodes(&self, out: &mut Vec<NodeId>) {
        out.extend_from_slice(&self.created);
        for child in &self.children {
            child.collect_nodes(out);
        }
    }

    pub(crate) fn discard_created(&mut self, doc: &mut Document) {
        for child in &mut self.children {
            child.discard_created(doc);
        }
        self.release_created(doc);
    }

    /// Run `build` with a clean child list, undoing whatever it managed to
    /// apply if it fails.
    pub(crate) fn build<F>(&mut self, doc: &mut Document, build: F) -> EditResult<()>
    where
        F: FnOnce(&mut Self, &mut Document) -> EditResult<()>,
    {
        self.children.clear();
        self.created.clear();
        self.base.set_ending_selection(self.base.starting_selection());
        let result = build(self, doc);
        if let Err(err) = &result {
            tracing::debug!(
                description = %self.description,
                applied = self.children.len(),
                error = %err,
                "rolling back partial composite"
            );
            self.roll_back(doc, self.children.len(), true);
            self.release_created(doc);
            self.children.clear();
            self.base.set_ending_selection(self.base.starting_selection());
        }
        result
    }

    /// Apply queued children in order, rolling back on failure.
    fn apply_children(&mut self, doc: &mut Document) -> EditResult<()> {
        self.base.set_ending_selection(self.base.starting_selection());
        for index in 0..self.children.len() {
            let seed = self.base.ending_selection();
            let child = &mut self.children[index];
            child.set_is_composite_step(true);
            child.set_starting_selection(seed);
            if let Err(err) = child.apply(doc) {
                self.roll_back(doc, index, true);
                self.base.set_ending_selection(self.base.starting_selection());
                return Err(err);
            }
            self.base.set_ending_selection(child.ending_selection());
        }
        Ok(())
    }

    /// Unapply every child in reverse order.
    pub(crate) fn unapply_children(&mut self, doc: &mut Document) -> EditResult<()> {
        for child in self.children.iter_mut().rev() {
            child.unapply(doc)?;
        }
        Ok(())
    }

    /// Reapply every child in order, unapplying the reapplied prefix again
    /// if one fails.
    pub(crate) fn reapply_children(&mut self, doc: &mut Document) -> EditResult<()> {
        for index in 0..self.children.len() {
            if let Err(err) = self.children[index].reapply(doc) {
                self.roll_back(doc, index, false);
                return Err(err);
            }
        }
        Ok(())
    }

    /// Undo the first `count` children in reverse. With `reset` they return
    /// to the not-applied state, otherwise they stay unapplied.
    fn roll_back(&mut self, doc: &mut Document, count: usize, reset: bool) {
        for child in self.children[..count].iter_mut().rev() {
            let result = if reset {
                child.roll_back_apply(doc)
            } else {
                child.unapply(doc)
            };
            if let Err(err) = result {
                tracing::warn!(command = child.name(), error = %err, "rollback step failed");
            }
        }
    }

    pub(crate) fn children_size(&self) -> usize {
        self.children.iter().map(EditCommand::size_bytes).sum()
    }
}

impl Step for CompositeEditCommand {
    fn base(&self) -> &CommandBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut CommandBase {
        &mut self.base
    }

    fn do_apply(&mut self, doc: &mut Document) -> EditResult<()> {
        self.apply_children(doc)
    }

    fn do_unapply(&mut self, doc: &mut Document) -> EditResult<()> {
        self.unapply_children(doc)
    }

    fn do_reapply(&mut self, doc: &mut Document) -> EditResult<()> {
        self.reapply_children(doc)
    }

    fn collect_nodes(&self, out: &mut Vec<NodeId>) {
        CompositeEditCommand::collect_nodes(self, out);
    }

    fn discard_created(&mut self, doc: &mut Document) {
        CompositeEditCommand::discard_created(self, doc);
    }

    fn reset(&mut self) {
        self.base.set_state(CommandState::NotApplied);
        for child in &mut self.children {
            child.reset();
        }
    }

    fn name(&self) -> &'static str {
        "CompositeEditCommand"
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn size_bytes(&self) -> usize {
        std::mem::size_of::<Self>()
            + self.description.len()
            + self.created.len() * std::mem::size_of::<NodeId>()
            + self.children_size()
    }
}
