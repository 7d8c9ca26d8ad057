//! Typed event channels.
//!
//! A minimal subscribe/emit channel replacing string-keyed pub-sub:
//! consumers hold a `SubscriptionId` and can revoke it, so no dangling
//! listener can outlive its interest.

/// Handle identifying one subscription; pass back to `unsubscribe`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionId(u64);

pub struct EventChannel<T> {
    subscribers: Vec<(SubscriptionId, Box<dyn FnMut(&T)>)>,
    next_id: u64,
}

impl<T> EventChannel<T> {
    pub fn new() -> Self {
        Self { subscribers: Vec::new(), next_id: 0 }
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&T) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscribers.push((id, Box::new(listener)));
        id
    }

    /// Returns `false` if the subscription was already gone.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sub_id, _)| *sub_id != id);
        self.subscribers.len() != before
    }

    pub fn emit(&mut self, event: &T) {
        for (_, listener) in &mut self.subscribers {
            listener(event);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

impl<T> Default for EventChannel<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Notifications about tool state, consumed by host UI chrome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolEvent {
    Enabled(crate::tools::ToolKind),
    Disabled(crate::tools::ToolKind),
    /// A tool property (color, thickness) changed.
    Updated(crate::tools::ToolKind),
}

/// Notifications about the undo/redo stacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryEvent {
    StackSizeChanged { undo_len: usize, redo_len: usize },
}
