//! Undo/redo history.
//!
//! Two stacks of boxed commands. Pushing a new command clears the redo
//! stack — a fresh action invalidates anything previously undone. Every
//! stack mutation fires a size-changed event for host UI (enabling or
//! disabling undo buttons).

use crate::commands::{Command, EditorState};
use crate::events::{EventChannel, HistoryEvent};

/// Default cap on undo depth; the oldest entries fall off first.
pub const DEFAULT_MAX_DEPTH: usize = 200;

pub struct UndoRedoHistory {
    undo_stack: Vec<Box<dyn Command>>,
    redo_stack: Vec<Box<dyn Command>>,
    max_depth: usize,
    pub events: EventChannel<HistoryEvent>,
}

impl UndoRedoHistory {
    pub fn new() -> Self {
        Self::with_max_depth(DEFAULT_MAX_DEPTH)
    }

    pub fn with_max_depth(max_depth: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_depth: max_depth.max(1),
            events: EventChannel::new(),
        }
    }

    /// Record a command. With `apply = true` the command is applied
    /// first; `apply = false` records a command whose effects are
    /// already on the state (live-preview gestures).
    pub fn push(&mut self, mut command: Box<dyn Command>, state: &mut EditorState, apply: bool) {
        if apply {
            command.apply(state);
        }
        self.undo_stack.push(command);
        if self.undo_stack.len() > self.max_depth {
            self.undo_stack.remove(0);
        }
        self.redo_stack.clear();
        self.notify();
    }

    /// Undo the most recent command. No-op on an empty stack.
    pub fn undo(&mut self, state: &mut EditorState) -> Option<String> {
        let mut command = self.undo_stack.pop()?;
        command.unapply(state);
        let description = command.description();
        self.redo_stack.push(command);
        self.notify();
        Some(description)
    }

    /// Redo the most recently undone command. No-op on an empty stack.
    pub fn redo(&mut self, state: &mut EditorState) -> Option<String> {
        let mut command = self.redo_stack.pop()?;
        command.apply(state);
        let description = command.description();
        self.undo_stack.push(command);
        self.notify();
        Some(description)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo_stack.len()
    }

    fn notify(&mut self) {
        let event = HistoryEvent::StackSizeChanged {
            undo_len: self.undo_stack.len(),
            redo_len: self.redo_stack.len(),
        };
        self.events.emit(&event);
    }
}

impl Default for UndoRedoHistory {
    fn default() -> Self {
        Self::new()
    }
}
