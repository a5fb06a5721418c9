#![forbid(unsafe_code)]

//! Undo/redo history of applied edit commands.
//!
//! [`UndoStack`] keeps dual stacks of commands that have already been
//! applied to a document:
//!
//! - **Depth limit**: at most `max_depth` commands are kept for undo
//! - **Memory limit**: total `size_bytes()` stays under `max_bytes`
//! - **Branching**: pushing a new command clears the redo stack
//!
//! # Invariants
//!
//! 1. `total_bytes` equals the sum of the cached sizes of every entry.
//! 2. `undo_stack.len() <= max(config.max_depth, 1)` after any operation.
//! 3. The newest undo entry is never evicted, even when it alone exceeds
//!    the memory budget.
//! 4. The redo stack is cleared whenever a new command is pushed.
//!
//! ```text
//! push(c3)          undo()            push(c4)
//! undo: [c1 c2 c3]  undo: [c1 c2]     undo: [c1 c2 c4]
//! redo: []          redo: [c3]        redo: []
//! ```
//!
//! Commands can grow after they are pushed (open typing). Callers report
//! that with [`UndoStack::refresh_last`] so the budget stays accurate.
//!
//! # Node ownership
//!
//! Undone insertions and applied removals leave nodes detached but alive so
//! the command can put them back. Once such a command leaves the history
//! (redo branch cleared, oldest entry evicted, history cleared) its
//! detached nodes are freed, unless a retained entry still references the
//! node or something inside it. Callers must not keep handles to detached
//! nodes they passed to commands in the history.

use std::collections::{HashSet, VecDeque};
use std::fmt;

use domedit_dom::{Document, NodeId};

use crate::command::EditCommand;
use crate::config::HistoryConfig;
use crate::error::EditResult;

struct Entry {
    command: EditCommand,
    size: usize,
}

impl Entry {
    fn new(command: EditCommand) -> Self {
        let size = command.size_bytes();
        Self { command, size }
    }
}

/// Undo and redo stacks with depth and memory budgets.
pub struct UndoStack {
    /// Commands available for undo (newest at back).
    undo_stack: VecDeque<Entry>,
    /// Commands available for redo (newest at back).
    redo_stack: VecDeque<Entry>,
    config: HistoryConfig,
    total_bytes: usize,
}

impl fmt::Debug for UndoStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UndoStack")
            .field("undo_depth", &self.undo_stack.len())
            .field("redo_depth", &self.redo_stack.len())
            .field("total_bytes", &self.total_bytes)
            .field("config", &self.config)
            .finish()
    }
}

impl Default for UndoStack {
    fn default() -> Self {
        Self::new(HistoryConfig::default())
    }
}

impl UndoStack {
    /// Empty history with the given budgets.
    #[must_use]
    pub fn new(config: HistoryConfig) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: VecDeque::new(),
            config,
            total_bytes: 0,
        }
    }

    // ========================================================================
    // Core Operations
    // ========================================================================

    /// Record a command already applied to `doc`.
    ///
    /// Empty commands are ignored. Clears the redo stack and enforces
    /// limits, freeing nodes only the dropped commands held.
    pub fn push(&mut self, command: EditCommand, doc: &mut Document) {
        if command.is_empty() {
            return;
        }
        let mut dropped = self.clear_redo();
        let entry = Entry::new(command);
        self.total_bytes += entry.size;
        self.undo_stack.push_back(entry);
        dropped.extend(self.enforce_limits());
        self.release(dropped, doc);
    }

    /// Unapply the newest command and move it to the redo stack.
    ///
    /// An open typing command is closed first so it can be redone later.
    ///
    /// # Returns
    ///
    /// - `Some(Ok(description))` if undo succeeded
    /// - `Some(Err(error))` if undo failed (command stays on the undo stack)
    /// - `None` if there is nothing to undo
    pub fn undo(&mut self, doc: &mut Document) -> Option<EditResult<String>> {
        let mut entry = self.undo_stack.pop_back()?;
        if let Some(typing) = entry.command.as_typing_mut() {
            typing.close_typing();
        }
        let description = entry.command.description().to_string();
        match entry.command.unapply(doc) {
            Ok(()) => {
                tracing::debug!(command = entry.command.name(), "undo");
                self.redo_stack.push_back(entry);
                Some(Ok(description))
            }
            Err(err) => {
                tracing::warn!(command = entry.command.name(), error = %err, "undo failed");
                self.undo_stack.push_back(entry);
                Some(Err(err))
            }
        }
    }

    /// Reapply the newest undone command and move it back to the undo stack.
    ///
    /// Same return convention as [`undo`](Self::undo).
    pub fn redo(&mut self, doc: &mut Document) -> Option<EditResult<String>> {
        let mut entry = self.redo_stack.pop_back()?;
        let description = entry.command.description().to_string();
        match entry.command.reapply(doc) {
            Ok(()) => {
                tracing::debug!(command = entry.command.name(), "redo");
                self.undo_stack.push_back(entry);
                Some(Ok(description))
            }
            Err(err) => {
                tracing::warn!(command = entry.command.name(), error = %err, "redo failed");
                self.redo_stack.push_back(entry);
                Some(Err(err))
            }
        }
    }

    /// Whether there is a command to undo.
    #[must_use]
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Whether there is a command to redo.
    #[must_use]
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// The newest command available for undo.
    #[must_use]
    pub fn last(&self) -> Option<&EditCommand> {
        self.undo_stack.back().map(|e| &e.command)
    }

    /// Mutable access to the newest command. Call
    /// [`refresh_last`](Self::refresh_last) after growing it.
    pub fn last_mut(&mut self) -> Option<&mut EditCommand> {
        self.undo_stack.back_mut().map(|e| &mut e.command)
    }

    /// Re-measure the newest command after it changed in place.
    pub fn refresh_last(&mut self, doc: &mut Document) {
        if let Some(entry) = self.undo_stack.back_mut() {
            let size = entry.command.size_bytes();
            self.total_bytes = self.total_bytes - entry.size + size;
            entry.size = size;
        }
        let dropped = self.enforce_limits();
        self.release(dropped, doc);
    }

    // ========================================================================
    // Info
    // ========================================================================

    /// Number of commands available for undo.
    #[must_use]
    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    /// Number of commands available for redo.
    #[must_use]
    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }

    /// Descriptions of undoable commands, most recent first.
    pub fn undo_descriptions(&self, limit: usize) -> Vec<&str> {
        self.undo_stack
            .iter()
            .rev()
            .take(limit)
            .map(|e| e.command.description())
            .collect()
    }

    /// Descriptions of redoable commands, most recent first.
    pub fn redo_descriptions(&self, limit: usize) -> Vec<&str> {
        self.redo_stack
            .iter()
            .rev()
            .take(limit)
            .map(|e| e.command.description())
            .collect()
    }

    /// Description of the command [`undo`](Self::undo) would reverse.
    #[must_use]
    pub fn next_undo_description(&self) -> Option<&str> {
        self.undo_stack.back().map(|e| e.command.description())
    }

    /// Description of the command [`redo`](Self::redo) would reapply.
    #[must_use]
    pub fn next_redo_description(&self) -> Option<&str> {
        self.redo_stack.back().map(|e| e.command.description())
    }

    /// Total bytes accounted to recorded commands.
    #[must_use]
    pub fn memory_usage(&self) -> usize {
        self.total_bytes
    }

    /// Depth and memory budgets in effect.
    #[must_use]
    pub fn config(&self) -> &HistoryConfig {
        &self.config
    }

    // ========================================================================
    // Maintenance
    // ========================================================================

    /// Forget all history, freeing nodes only it kept alive.
    pub fn clear(&mut self, doc: &mut Document) {
        let dropped = self
            .undo_stack
            .drain(..)
            .chain(self.redo_stack.drain(..))
            .map(|entry| entry.command)
            .collect();
        self.total_bytes = 0;
        self.release(dropped, doc);
    }

    fn clear_redo(&mut self) -> Vec<EditCommand> {
        let mut dropped = Vec::with_capacity(self.redo_stack.len());
        for entry in self.redo_stack.drain(..) {
            self.total_bytes = self.total_bytes.saturating_sub(entry.size);
            dropped.push(entry.command);
        }
        dropped
    }

    fn evict_front(stack: &mut VecDeque<Entry>, total_bytes: &mut usize) -> Option<EditCommand> {
        let entry = stack.pop_front()?;
        tracing::trace!(command = entry.command.name(), bytes = entry.size, "evicted");
        *total_bytes = total_bytes.saturating_sub(entry.size);
        Some(entry.command)
    }

    /// Evict oldest commands until depth and memory limits hold.
    fn enforce_limits(&mut self) -> Vec<EditCommand> {
        let mut dropped = Vec::new();
        let max_depth = self.config.max_depth.max(1);
        while self.undo_stack.len() > max_depth {
            dropped.extend(Self::evict_front(&mut self.undo_stack, &mut self.total_bytes));
        }

        if self.config.max_bytes > 0 {
            while self.total_bytes > self.config.max_bytes {
                // Speculative redo history goes first.
                if let Some(command) = Self::evict_front(&mut self.redo_stack, &mut self.total_bytes) {
                    dropped.push(command);
                    continue;
                }
                if self.undo_stack.len() <= 1 {
                    break;
                }
                dropped.extend(Self::evict_front(&mut self.undo_stack, &mut self.total_bytes));
            }
        }
        dropped
    }

    /// Free detached nodes referenced by `dropped` that no retained entry
    /// needs, either directly or through a descendant.
    fn release(&self, dropped: Vec<EditCommand>, doc: &mut Document) {
        if dropped.is_empty() {
            return;
        }
        let mut candidates = Vec::new();
        for command in &dropped {
            command.collect_nodes(&mut candidates);
        }
        drop(dropped);

        let mut retained = Vec::new();
        for entry in self.undo_stack.iter().chain(&self.redo_stack) {
            entry.command.collect_nodes(&mut retained);
        }
        let retained: HashSet<NodeId> = retained.into_iter().collect();

        let root = doc.root();
        let mut freed = 0usize;
        for node in candidates {
            if node == root || !matches!(doc.parent(node), Ok(None)) {
                continue;
            }
            let Ok(subtree) = doc.descendants(node) else {
                continue;
            };
            if subtree.iter().any(|n| retained.contains(n)) {
                continue;
            }
            match doc.destroy_node(node) {
                Ok(()) => freed += 1,
                Err(err) => tracing::warn!(node = %node, error = %err, "could not free detached node"),
            }
        }
        if freed > 0 {
            tracing::trace!(document = %doc.id(), subtrees = freed, "released detached nodes");
        }
    }
}
