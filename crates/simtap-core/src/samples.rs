//! Per-operation counter samples and delta derivation.
//!
//! The backend reports cumulative counters; consumers want per-interval
//! rates. [`OperationSample::derive`] turns each notification into a sample
//! whose derived fields are the non-negative increase since the previous
//! sample of the *same* operation. A sample that starts a new run (no
//! predecessor, or a different operation id) carries its raw values
//! unchanged.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::messages::NotificationContent;

/// The four cumulative counters of a notification, as received.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationCounters {
    /// Cumulative bytes received.
    pub rx: u64,
    /// Cumulative bytes transmitted.
    pub tx: u64,
    /// Cumulative messages received.
    pub msgs_rx: u64,
    /// Cumulative messages transmitted.
    pub msgs_tx: u64,
}

impl From<&NotificationContent> for OperationCounters {
    fn from(content: &NotificationContent) -> Self {
        Self {
            rx: content.rx,
            tx: content.tx,
            msgs_rx: content.msgs_rx,
            msgs_tx: content.msgs_tx,
        }
    }
}

/// One derived telemetry sample for a simulation operation.
///
/// The top-level counter fields hold the delta since the previous sample of
/// the same operation (clamped at zero if a counter regresses); `raw_data`
/// holds the cumulative values as received. Never mutated after creation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationSample {
    /// Bytes received since the previous sample.
    pub rx: u64,
    /// Bytes transmitted since the previous sample.
    pub tx: u64,
    /// Messages received since the previous sample.
    pub msgs_rx: u64,
    /// Messages transmitted since the previous sample.
    pub msgs_tx: u64,
    /// Receipt time of the underlying notification.
    pub timestamp: DateTime<Utc>,
    /// Operation this sample belongs to.
    pub operation_id: String,
    /// Raw cumulative counters as received.
    pub raw_data: OperationCounters,
}

impl OperationSample {
    /// Derive a sample from notification content.
    ///
    /// If `prev` is a sample for the same operation id, the derived fields
    /// are `saturating_sub` deltas against its raw counters; otherwise this
    /// is the first sample of a new run and the derived fields equal the raw
    /// values.
    #[must_use]
    pub fn derive(
        prev: Option<&Self>,
        content: &NotificationContent,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let raw = OperationCounters::from(content);
        match prev {
            Some(p) if p.operation_id == content.id => Self {
                rx: raw.rx.saturating_sub(p.raw_data.rx),
                tx: raw.tx.saturating_sub(p.raw_data.tx),
                msgs_rx: raw.msgs_rx.saturating_sub(p.raw_data.msgs_rx),
                msgs_tx: raw.msgs_tx.saturating_sub(p.raw_data.msgs_tx),
                timestamp,
                operation_id: content.id.clone(),
                raw_data: raw,
            },
            _ => Self {
                rx: raw.rx,
                tx: raw.tx,
                msgs_rx: raw.msgs_rx,
                msgs_tx: raw.msgs_tx,
                timestamp,
                operation_id: content.id.clone(),
                raw_data: raw,
            },
        }
    }

    /// Whether this sample continues the run `prev` belongs to.
    #[must_use]
    pub fn continues(&self, prev: &Self) -> bool {
        self.operation_id == prev.operation_id
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
