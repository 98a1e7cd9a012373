//! # simtap-core
//!
//! Foundation types for the simtap telemetry client.
//!
//! This crate provides the shared vocabulary the store and client crates
//! depend on:
//!
//! - **Wire payloads**: [`messages::Notification`] with its classification
//!   key and cumulative counter content
//! - **Classified messages**: [`messages::SocketMessage`] enum with
//!   `Notification` and `Unknown` variants
//! - **Derived samples**: [`samples::OperationSample`] holding raw counters
//!   and per-interval deltas for one simulation operation
//!
//! ## Crate Position
//!
//! Foundation crate. Pure data, no I/O. Depended on by `simtap-store` and
//! `simtap-client`.

#![deny(unsafe_code)]

pub mod messages;
pub mod samples;

pub use messages::{Notification, NotificationContent, SocketMessage};
pub use samples::{OperationCounters, OperationSample};
