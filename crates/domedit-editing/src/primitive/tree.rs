#![forbid(unsafe_code)]

//! Structural commands: insert before, append, remove.

use domedit_dom::{Document, NodeId, Selection};

use crate::command::{CommandBase, Step};
use crate::error::{EditError, EditResult};
use crate::primitive::{attached_parent, caret_after};

/// Where a node sat before a command moved it: parent and next sibling.
type Slot = Option<(NodeId, Option<NodeId>)>;

fn current_slot(doc: &Document, node: NodeId) -> EditResult<Slot> {
    Ok(match doc.parent(node)? {
        Some(parent) => Some((parent, doc.next_sibling(node)?)),
        None => None,
    })
}

fn collect_slot(slot: Slot, out: &mut Vec<NodeId>) {
    if let Some((parent, next)) = slot {
        out.push(parent);
        out.extend(next);
    }
}

fn restore_slot(doc: &mut Document, node: NodeId, slot: Slot) -> EditResult<()> {
    match slot {
        Some((parent, next)) => doc.insert_before(parent, node, next)?,
        None => doc.remove_node(node)?,
    }
    Ok(())
}

// ============================================================================
// InsertNodeBeforeCommand
// ============================================================================

/// Insert a node immediately before a reference child.
#[derive(Debug)]
pub struct InsertNodeBeforeCommand {
    base: CommandBase,
    insert_child: NodeId,
    ref_child: NodeId,
    previous: Slot,
}

impl InsertNodeBeforeCommand {
    #[must_use]
    pub fn new(doc: &Document, insert_child: NodeId, ref_child: NodeId) -> Self {
        Self {
            base: CommandBase::new(doc),
            insert_child,
            ref_child,
            previous: None,
        }
    }

    #[must_use]
    pub fn insert_child(&self) -> NodeId {
        self.insert_child
    }

    #[must_use]
    pub fn ref_child(&self) -> NodeId {
        self.ref_child
    }
}

impl Step for InsertNodeBeforeCommand {
    fn base(&self) -> &CommandBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut CommandBase {
        &mut self.base
    }

    fn do_apply(&mut self, doc: &mut Document) -> EditResult<()> {
        let parent = attached_parent(doc, self.ref_child)?;
        let previous = current_slot(doc, self.insert_child)?;
        doc.insert_before(parent, self.insert_child, Some(self.ref_child))?;
        self.previous = previous;
        let ending = caret_after(doc, self.insert_child, self.base.starting_selection())?;
        self.base.set_ending_selection(ending);
        Ok(())
    }

    fn do_unapply(&mut self, doc: &mut Document) -> EditResult<()> {
        restore_slot(doc, self.insert_child, self.previous)
    }

    fn collect_nodes(&self, out: &mut Vec<NodeId>) {
        out.extend([self.insert_child, self.ref_child]);
        collect_slot(self.previous, out);
    }

    fn name(&self) -> &'static str {
        "InsertNodeBeforeCommand"
    }

    fn description(&self) -> &str {
        "Insert Node"
    }

    fn size_bytes(&self) -> usize {
        std::mem::size_of::<Self>()
    }
}

// ============================================================================
// AppendNodeCommand
// ============================================================================

/// Append a node as the last child of a parent.
#[derive(Debug)]
pub struct AppendNodeCommand {
    base: CommandBase,
    parent: NodeId,
    child: NodeId,
    previous: Slot,
}

impl AppendNodeCommand {
    #[must_use]
    pub fn new(doc: &Document, parent: NodeId, child: NodeId) -> Self {
        Self {
            base: CommandBase::new(doc),
            parent,
            child,
            previous: None,
        }
    }

    #[must_use]
    pub fn parent(&self) -> NodeId {
        self.parent
    }

    #[must_use]
    pub fn child(&self) -> NodeId {
        self.child
    }
}

impl Step for AppendNodeCommand {
    fn base(&self) -> &CommandBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut CommandBase {
        &mut self.base
    }

    fn do_apply(&mut self, doc: &mut Document) -> EditResult<()> {
        let previous = current_slot(doc, self.child)?;
        doc.append_child(self.parent, self.child)?;
        self.previous = previous;
        let ending = caret_after(doc, self.child, self.base.starting_selection())?;
        self.base.set_ending_selection(ending);
        Ok(())
    }

    fn do_unapply(&mut self, doc: &mut Document) -> EditResult<()> {
        restore_slot(doc, self.child, self.previous)
    }

    fn collect_nodes(&self, out: &mut Vec<NodeId>) {
        out.extend([self.parent, self.child]);
        collect_slot(self.previous, out);
    }

    fn name(&self) -> &'static str {
        "AppendNodeCommand"
    }

    fn description(&self) -> &str {
        "Append Node"
    }

    fn size_bytes(&self) -> usize {
        std::mem::size_of::<Self>()
    }
}

// ============================================================================
// RemoveNodeCommand
// ============================================================================

/// Detach a node from its parent. The node and its subtree stay alive so
/// undo can reinsert them.
#[derive(Debug)]
pub struct RemoveNodeCommand {
    base: CommandBase,
    node: NodeId,
    previous: Slot,
}

impl RemoveNodeCommand {
    #[must_use]
    pub fn new(doc: &Document, node: NodeId) -> Self {
        Self {
            base: CommandBase::new(doc),
            node,
            previous: None,
        }
    }

    #[must_use]
    pub fn node(&self) -> NodeId {
        self.node
    }
}

impl Step for RemoveNodeCommand {
    fn base(&self) -> &CommandBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut CommandBase {
        &mut self.base
    }

    fn do_apply(&mut self, doc: &mut Document) -> EditResult<()> {
        let parent = attached_parent(doc, self.node)?;
        let index = doc.index_in_parent(self.node)?.unwrap_or_default();
        let next = doc.next_sibling(self.node)?;
        doc.remove_node(self.node)?;
        self.previous = Some((parent, next));
        self.base.set_ending_selection(Selection::caret(parent, index));
        Ok(())
    }

    fn do_unapply(&mut self, doc: &mut Document) -> EditResult<()> {
        if self.previous.is_none() {
            return Err(EditError::DetachedNode(self.node));
        }
        restore_slot(doc, self.node, self.previous)
    }

    fn collect_nodes(&self, out: &mut Vec<NodeId>) {
        out.push(self.node);
        collect_slot(self.previous, out);
    }

    fn name(&self) -> &'static str {
        "RemoveNodeCommand"
    }

    fn description(&self) -> &str {
        "Remove Node"
    }

    fn size_bytes(&self) -> usize {
        std::mem::size_of::<Self>()
    }
}
