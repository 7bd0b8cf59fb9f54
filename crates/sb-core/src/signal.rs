//! Synchronous notification lists
//!
//! A [`Signal`] holds the callbacks subscribed to one kind of event. Emitting
//! runs every callback on the calling thread, in subscription order, before
//! `emit` returns.

use std::fmt;

/// Callback invoked with each emitted event
pub type Callback<E> = Box<dyn FnMut(&E)>;

/// Handle returned by [`Signal::subscribe`], used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Ordered list of subscribed callbacks
pub struct Signal<E> {
    listeners: Vec<(SubscriptionId, Callback<E>)>,
    next_id: u64,
}

impl<E> Default for Signal<E> {
    fn default() -> Self {
        Self {
            listeners: Vec::new(),
            next_id: 0,
        }
    }
}

impl<E> fmt::Debug for Signal<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl<E> Signal<E> {
    /// Create a signal with no listeners
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback
    pub fn subscribe(&mut self, callback: impl FnMut(&E) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, Box::new(callback)));
        id
    }

    /// Remove a callback, returns false if it was not registered
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener, _)| *listener != id);
        self.listeners.len() != before
    }

    /// Run every callback with the event
    pub fn emit(&mut self, event: &E) {
        for (_, callback) in &mut self.listeners {
            callback(event);
        }
    }

    /// Number of registered callbacks
    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    /// Check if no callbacks are registered
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}
