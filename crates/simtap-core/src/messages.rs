//! Wire payloads and classified socket messages.
//!
//! The backend delivers text frames over the socket. Frames that decode as a
//! [`Notification`] carry simulation telemetry; everything else is kept as an
//! opaque key-value [`SocketMessage::Unknown`] record so it stays visible to
//! consumers without failing the pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ─────────────────────────────────────────────────────────────────────────────
// Notification payload
// ─────────────────────────────────────────────────────────────────────────────

/// Counter block of a notification, keyed to one simulation operation.
///
/// The four counters are cumulative totals as reported by the backend.
/// Fields the backend adds beyond the known set are preserved in `extra`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationContent {
    /// Identifier of the simulation operation this sample belongs to.
    pub id: String,
    /// Cumulative bytes received.
    #[serde(default)]
    pub rx: u64,
    /// Cumulative bytes transmitted.
    #[serde(default)]
    pub tx: u64,
    /// Cumulative messages received.
    #[serde(default)]
    pub msgs_rx: u64,
    /// Cumulative messages transmitted.
    #[serde(default)]
    pub msgs_tx: u64,
    /// Additional backend-supplied fields, preserved as-is.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// An inbound telemetry notification.
///
/// `kind` (wire name `type`) is the classification key used to match
/// registered one-shot event listeners.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    /// Notification type, e.g. `SIMULATION_STATUS`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Counter content for one operation.
    pub content: NotificationContent,
}

// ─────────────────────────────────────────────────────────────────────────────
// Classified messages
// ─────────────────────────────────────────────────────────────────────────────

/// A classified socket message with its receipt timestamp.
///
/// Immutable once constructed; the store only ever appends and evicts these.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SocketMessage {
    /// A frame that decoded as a telemetry [`Notification`].
    Notification {
        /// The decoded payload.
        data: Notification,
        /// Receipt time.
        timestamp: DateTime<Utc>,
    },
    /// A frame that did not decode as a notification, kept as an opaque
    /// key-value mapping for round-trip visibility.
    Unknown {
        /// The raw key-value record.
        data: Map<String, Value>,
        /// Receipt time.
        timestamp: DateTime<Utc>,
    },
}

impl SocketMessage {
    /// Receipt timestamp of the message, regardless of variant.
    #[must_use]
    pub const fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::Notification { timestamp, .. } | Self::Unknown { timestamp, .. } => *timestamp,
        }
    }

    /// The notification payload, if this is a notification message.
    #[must_use]
    pub const fn as_notification(&self) -> Option<&Notification> {
        match self {
            Self::Notification { data, .. } => Some(data),
            Self::Unknown { .. } => None,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
