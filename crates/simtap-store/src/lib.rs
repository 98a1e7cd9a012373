//! # simtap-store
//!
//! In-memory telemetry store for the simtap client.
//!
//! - [`BoundedHistory`]: capped rolling sequence, newest last, oldest evicted
//! - [`EventListener`] / [`ListenerRegistry`]: one-shot callbacks keyed by
//!   notification type
//! - [`TelemetryStore`]: the store itself — ingestion, per-operation delta
//!   run buffer, listener fan-out, and change notification to subscribers
//!
//! ## Crate Position
//!
//! Owns all mutable client-side state. The connection manager
//! (`simtap-client`) feeds it; UI-side consumers read snapshots and await
//! change notifications.

#![deny(unsafe_code)]

pub mod history;
pub mod listeners;
pub mod store;

pub use history::BoundedHistory;
pub use listeners::{EventListener, ListenerRegistry};
pub use store::{MESSAGE_HISTORY_CAP, RUN_BUFFER_CAP, TelemetryStore};
