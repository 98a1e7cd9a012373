//! One-shot event listener registrations.
//!
//! Callers register callbacks keyed by notification type. When a matching
//! notification is ingested, every matching callback fires once (in
//! registration order) and the registration is removed. Registrations with
//! no matching notification persist until process teardown — there is no
//! expiry.

use std::fmt;
use std::sync::Arc;

/// Zero-argument callback invoked when a matching notification arrives.
pub type EventCallback = Box<dyn Fn() + Send + Sync>;

/// A single one-shot listener registration.
pub struct EventListener {
    /// Caller-supplied identifier. Uniqueness is the caller's
    /// responsibility; duplicate ids are removed together when either fires.
    pub id: String,
    /// Notification type to match against.
    pub event_type: String,
    /// Callback fired on the first matching notification.
    pub callback: EventCallback,
}

impl EventListener {
    /// Create a registration from a callback closure.
    pub fn new(
        id: impl Into<String>,
        event_type: impl Into<String>,
        callback: impl Fn() + Send + Sync + 'static,
    ) -> Self {
        Self {
            id: id.into(),
            event_type: event_type.into(),
            callback: Box::new(callback),
        }
    }
}

impl fmt::Debug for EventListener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventListener")
            .field("id", &self.id)
            .field("event_type", &self.event_type)
            .finish_non_exhaustive()
    }
}

/// Ordered set of pending listener registrations.
///
/// Entries are held behind `Arc` so the store can hand out a fire set to
/// invoke without holding its state lock.
#[derive(Debug, Default)]
pub struct ListenerRegistry {
    entries: Vec<Arc<EventListener>>,
}

impl ListenerRegistry {
    /// Create an empty registry.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Append registrations, preserving order.
    pub fn add(&mut self, listeners: Vec<EventListener>) {
        self.entries.extend(listeners.into_iter().map(Arc::new));
    }

    /// All registrations whose type matches, in registration order.
    #[must_use]
    pub fn matching(&self, event_type: &str) -> Vec<Arc<EventListener>> {
        self.entries
            .iter()
            .filter(|l| l.event_type == event_type)
            .cloned()
            .collect()
    }

    /// Remove every registration whose id is in `ids`.
    pub fn remove_ids(&mut self, ids: &[&str]) {
        self.entries.retain(|l| !ids.contains(&l.id.as_str()));
    }

    /// Number of pending registrations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
