//! The telemetry store: ingestion, bounded histories, listener fan-out.
//!
//! [`TelemetryStore`] is an explicit context object — constructed once,
//! shared via `Arc`, and injected into collaborators. All mutation funnels
//! through a handful of operations, each committing its state transition
//! under a single write lock so subscribers never observe a partial update.

use chrono::Utc;
use metrics::counter;
use parking_lot::RwLock;
use serde_json::{Map, Value};
use tokio::sync::watch;
use tracing::debug;

use simtap_core::{Notification, OperationSample, SocketMessage};

use crate::history::BoundedHistory;
use crate::listeners::{EventListener, ListenerRegistry};

/// Maximum retained socket messages.
pub const MESSAGE_HISTORY_CAP: usize = 1001;

/// Maximum retained samples in the per-operation run buffer.
pub const RUN_BUFFER_CAP: usize = 600;

/// Mutable state behind the store's lock.
struct StoreState {
    all_messages: BoundedHistory<SocketMessage>,
    current_run: BoundedHistory<OperationSample>,
    last_message: Option<SocketMessage>,
    listeners: ListenerRegistry,
    socket_open: bool,
}

/// Client-side telemetry state shared between the connection manager and
/// consumers.
///
/// Histories are bounded: the message history holds at most
/// [`MESSAGE_HISTORY_CAP`] entries and the run buffer at most
/// [`RUN_BUFFER_CAP`], each evicting its oldest entry on overflow. The run
/// buffer covers only the current contiguous run of one operation — it is
/// reset whenever a sample for a different operation id arrives.
pub struct TelemetryStore {
    state: RwLock<StoreState>,
    updates: watch::Sender<u64>,
}

impl TelemetryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        let (updates, _) = watch::channel(0);
        Self {
            state: RwLock::new(StoreState {
                all_messages: BoundedHistory::new(MESSAGE_HISTORY_CAP),
                current_run: BoundedHistory::new(RUN_BUFFER_CAP),
                last_message: None,
                listeners: ListenerRegistry::new(),
                socket_open: false,
            }),
            updates,
        }
    }

    // ─── Ingestion ───────────────────────────────────────────────────────

    /// Ingest a decoded notification.
    ///
    /// Derives the next [`OperationSample`] against the run-buffer tail,
    /// fires every listener registered for the notification's type (in
    /// registration order, before their removal is committed), then commits
    /// message history, last message, run buffer, and listener removal as
    /// one atomic transition.
    pub fn add_message(&self, notification: Notification) {
        let timestamp = Utc::now();

        // Phase one: derive the sample and collect the fire set without
        // holding the write lock, so callbacks may re-enter the store.
        let (sample, continues_run, fired) = {
            let state = self.state.read();
            let prev = state.current_run.back();
            let sample = OperationSample::derive(prev, &notification.content, timestamp);
            let continues_run = prev.is_some_and(|p| sample.continues(p));
            let fired = state.listeners.matching(&notification.kind);
            (sample, continues_run, fired)
        };

        for listener in &fired {
            (listener.callback)();
        }
        if !fired.is_empty() {
            debug!(
                kind = %notification.kind,
                count = fired.len(),
                "fired one-shot listeners"
            );
            counter!("simtap_listeners_fired_total").increment(fired.len() as u64);
        }

        let message = SocketMessage::Notification {
            data: notification,
            timestamp,
        };

        // Phase two: commit everything in one transition.
        {
            let mut state = self.state.write();
            state.all_messages.push(message.clone());
            state.last_message = Some(message);
            if continues_run {
                state.current_run.push(sample);
            } else {
                state.current_run.reset_to(sample);
            }
            if !fired.is_empty() {
                let ids: Vec<&str> = fired.iter().map(|l| l.id.as_str()).collect();
                state.listeners.remove_ids(&ids);
            }
        }

        counter!("simtap_messages_total", "kind" => "notification").increment(1);
        self.notify();
    }

    /// Record a frame that did not decode as a notification.
    ///
    /// Unknown frames bypass sample derivation and listener matching; they
    /// are appended to the message history only.
    pub fn record_unknown(&self, data: Map<String, Value>) {
        let message = SocketMessage::Unknown {
            data,
            timestamp: Utc::now(),
        };
        self.state.write().all_messages.push(message);
        counter!("simtap_messages_total", "kind" => "unknown").increment(1);
        self.notify();
    }

    // ─── Listener registry ───────────────────────────────────────────────

    /// Register one-shot listeners.
    ///
    /// Each registration fires on the next notification whose type matches
    /// and is removed afterward. No id deduplication is performed.
    pub fn add_event_listeners(&self, listeners: Vec<EventListener>) {
        self.state.write().listeners.add(listeners);
        self.notify();
    }

    // ─── Connection state ────────────────────────────────────────────────

    /// Set the live-connection flag. Used by the connection manager's open
    /// and close handlers; public for symmetry and testability.
    pub fn set_socket_open(&self, open: bool) {
        self.state.write().socket_open = open;
        self.notify();
    }

    // ─── Readers ─────────────────────────────────────────────────────────

    /// The most recently ingested notification message.
    #[must_use]
    pub fn last_message(&self) -> Option<SocketMessage> {
        self.state.read().last_message.clone()
    }

    /// Snapshot of the retained message history, oldest first.
    #[must_use]
    pub fn messages(&self) -> Vec<SocketMessage> {
        self.state.read().all_messages.snapshot()
    }

    /// Snapshot of the current operation's run buffer, oldest first.
    #[must_use]
    pub fn simulation_data(&self) -> Vec<OperationSample> {
        self.state.read().current_run.snapshot()
    }

    /// Whether the socket is currently open.
    #[must_use]
    pub fn is_socket_open(&self) -> bool {
        self.state.read().socket_open
    }

    /// Number of pending listener registrations.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.state.read().listeners.len()
    }

    /// Subscribe to store changes.
    ///
    /// The receiver's value bumps on every committed state transition;
    /// consumers await `changed()` and then read whichever snapshots they
    /// need.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.updates.subscribe()
    }

    fn notify(&self) {
        self.updates.send_modify(|rev| *rev = rev.wrapping_add(1));
    }
}

impl Default for TelemetryStore {
    fn default() -> Self {
        Self::new()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use assert_matches::assert_matches;
    use parking_lot::Mutex;
    use simtap_core::NotificationContent;

    fn notification(kind: &str, id: &str, rx: u64, tx: u64, mrx: u64, mtx: u64) -> Notification {
        Notification {
            kind: kind.into(),
            content: NotificationContent {
                id: id.into(),
                rx,
                tx,
                msgs_rx: mrx,
                msgs_tx: mtx,
                extra: Map::new(),
            },
        }
    }

    fn status(id: &str, rx: u64, tx: u64, mrx: u64, mtx: u64) -> Notification {
        notification("SIMULATION_STATUS", id, rx, tx, mrx, mtx)
    }

    #[test]
    fn first_message_populates_everything() {
        let store = TelemetryStore::new();
        store.add_message(status("op1", 100, 50, 10, 5));

        assert_eq!(store.messages().len(), 1);
        assert!(store.last_message().is_some());
        let data = store.simulation_data();
        assert_eq!(data.len(), 1);
        assert_eq!(data[0].rx, 100);
        assert_eq!(data[0].operation_id, "op1");
    }

    #[test]
    fn consecutive_samples_yield_deltas() {
        let store = TelemetryStore::new();
        store.add_message(status("op1", 100, 50, 10, 5));
        store.add_message(status("op1", 130, 50, 12, 5));

        let data = store.simulation_data();
        assert_eq!(data.len(), 2);
        assert_eq!(data[1].rx, 30);
        assert_eq!(data[1].tx, 0);
        assert_eq!(data[1].msgs_rx, 2);
        assert_eq!(data[1].msgs_tx, 0);
    }

    #[test]
    fn operation_switch_resets_run_buffer() {
        let store = TelemetryStore::new();
        store.add_message(status("op1", 100, 50, 10, 5));
        store.add_message(status("op1", 130, 50, 12, 5));
        store.add_message(status("op2", 40, 30, 4, 3));

        let data = store.simulation_data();
        assert_eq!(data.len(), 1);
        assert_eq!(data[0].operation_id, "op2");
        // First sample of the new run carries raw values
        assert_eq!(data[0].rx, 40);
        assert_eq!(data[0].msgs_tx, 3);
        // Message history is unaffected by the reset
        assert_eq!(store.messages().len(), 3);
    }

    #[test]
    fn counter_regression_is_clamped() {
        let store = TelemetryStore::new();
        store.add_message(status("op1", 100, 50, 10, 5));
        store.add_message(status("op1", 40, 50, 10, 5));

        let data = store.simulation_data();
        assert_eq!(data[1].rx, 0);
    }

    #[test]
    fn run_buffer_caps_at_limit() {
        let store = TelemetryStore::new();
        for i in 0..(RUN_BUFFER_CAP as u64 + 5) {
            store.add_message(status("op1", i, 0, 0, 0));
        }
        let data = store.simulation_data();
        assert_eq!(data.len(), RUN_BUFFER_CAP);
        // Oldest five evicted: buffer starts at the sixth sample
        assert_eq!(data[0].raw_data.rx, 5);
    }

    #[test]
    fn message_history_caps_at_limit() {
        let store = TelemetryStore::new();
        for i in 0..(MESSAGE_HISTORY_CAP as u64 + 4) {
            store.add_message(status("op1", i, 0, 0, 0));
        }
        let messages = store.messages();
        assert_eq!(messages.len(), MESSAGE_HISTORY_CAP);
        let first = messages[0].as_notification().unwrap();
        assert_eq!(first.content.rx, 4);
    }

    #[test]
    fn last_message_tracks_newest() {
        let store = TelemetryStore::new();
        store.add_message(status("op1", 1, 0, 0, 0));
        store.add_message(status("op1", 2, 0, 0, 0));
        let last = store.last_message().unwrap();
        assert_eq!(last.as_notification().unwrap().content.rx, 2);
    }

    #[test]
    fn unknown_frames_only_touch_message_history() {
        let store = TelemetryStore::new();
        store.add_message(status("op1", 1, 0, 0, 0));
        store.add_event_listeners(vec![EventListener::new("a", "SIMULATION_STATUS", || {})]);

        let mut data = Map::new();
        let _ = data.insert("command".into(), Value::String("ping".into()));
        store.record_unknown(data);

        assert_eq!(store.messages().len(), 2);
        assert_matches!(store.messages()[1], SocketMessage::Unknown { .. });
        // Everything else untouched
        assert_eq!(store.simulation_data().len(), 1);
        assert_eq!(store.listener_count(), 1);
        assert!(store.last_message().unwrap().as_notification().is_some());
    }

    #[test]
    fn matching_listener_fires_once_and_is_removed() {
        let store = TelemetryStore::new();
        let fired = Arc::new(AtomicUsize::new(0));
        let fired_in = Arc::clone(&fired);
        store.add_event_listeners(vec![EventListener::new(
            "a",
            "SIMULATION_STATUS",
            move || {
                let _ = fired_in.fetch_add(1, Ordering::SeqCst);
            },
        )]);

        store.add_message(status("op1", 1, 0, 0, 0));
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert_eq!(store.listener_count(), 0);

        // A second matching message finds no registration
        store.add_message(status("op1", 2, 0, 0, 0));
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn non_matching_listeners_stay_registered() {
        let store = TelemetryStore::new();
        let fired = Arc::new(AtomicUsize::new(0));
        let fired_in = Arc::clone(&fired);
        store.add_event_listeners(vec![
            EventListener::new("a", "SIMULATION_DONE", move || {
                let _ = fired_in.fetch_add(1, Ordering::SeqCst);
            }),
            EventListener::new("b", "SIMULATION_STATUS", || {}),
        ]);

        store.add_message(status("op1", 1, 0, 0, 0));
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert_eq!(store.listener_count(), 1);
    }

    #[test]
    fn listeners_fire_in_registration_order() {
        let store = TelemetryStore::new();
        let order = Arc::new(Mutex::new(Vec::new()));
        let o1 = Arc::clone(&order);
        let o2 = Arc::clone(&order);
        store.add_event_listeners(vec![
            EventListener::new("first", "SIMULATION_STATUS", move || {
                o1.lock().push("first");
            }),
            EventListener::new("second", "SIMULATION_STATUS", move || {
                o2.lock().push("second");
            }),
        ]);

        store.add_message(status("op1", 1, 0, 0, 0));
        assert_eq!(*order.lock(), vec!["first", "second"]);
    }

    #[test]
    fn callback_observes_pre_removal_state() {
        // The fire happens strictly before the commit that removes the
        // registration, so a callback still sees itself registered.
        let store = Arc::new(TelemetryStore::new());
        let seen = Arc::new(AtomicUsize::new(usize::MAX));
        let store_in = Arc::clone(&store);
        let seen_in = Arc::clone(&seen);
        store.add_event_listeners(vec![EventListener::new(
            "a",
            "SIMULATION_STATUS",
            move || {
                seen_in.store(store_in.listener_count(), Ordering::SeqCst);
            },
        )]);

        store.add_message(status("op1", 1, 0, 0, 0));
        assert_eq!(seen.load(Ordering::SeqCst), 1);
        assert_eq!(store.listener_count(), 0);
    }

    #[test]
    fn callback_can_register_more_listeners() {
        let store = Arc::new(TelemetryStore::new());
        let store_in = Arc::clone(&store);
        store.add_event_listeners(vec![EventListener::new(
            "a",
            "SIMULATION_STATUS",
            move || {
                store_in.add_event_listeners(vec![EventListener::new(
                    "b",
                    "SIMULATION_DONE",
                    || {},
                )]);
            },
        )]);

        store.add_message(status("op1", 1, 0, 0, 0));
        // "a" fired and was removed; "b" registered from inside the callback
        assert_eq!(store.listener_count(), 1);
    }

    #[test]
    fn socket_open_flag_toggles() {
        let store = TelemetryStore::new();
        assert!(!store.is_socket_open());
        store.set_socket_open(true);
        assert!(store.is_socket_open());
        store.set_socket_open(false);
        assert!(!store.is_socket_open());
    }

    #[tokio::test]
    async fn subscribers_see_committed_transitions() {
        let store = TelemetryStore::new();
        let mut updates = store.subscribe();
        let before = *updates.borrow_and_update();

        store.add_message(status("op1", 1, 0, 0, 0));
        updates.changed().await.unwrap();
        assert!(*updates.borrow_and_update() > before);
    }
}
