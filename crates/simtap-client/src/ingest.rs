//! Inbound frame classification.

use serde_json::{Map, Value};
use tracing::trace;

use simtap_core::Notification;
use simtap_store::TelemetryStore;

/// Classify one inbound text frame and hand it to the store.
///
/// Frames that decode as a [`Notification`] go through full ingestion.
/// Other JSON objects are recorded as unknown messages with their key-value
/// content intact; undecodable text is wrapped in a `{"raw": <text>}` record
/// so it stays visible rather than being rejected.
pub(crate) fn ingest_frame(store: &TelemetryStore, text: &str) {
    if let Ok(notification) = serde_json::from_str::<Notification>(text) {
        store.add_message(notification);
        return;
    }
    match serde_json::from_str::<Map<String, Value>>(text) {
        Ok(map) => {
            trace!(keys = map.len(), "unclassified frame recorded");
            store.record_unknown(map);
        }
        Err(_) => {
            let mut map = Map::new();
            let _ = map.insert("raw".into(), Value::String(text.to_string()));
            store.record_unknown(map);
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
