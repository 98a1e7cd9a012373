//! # simtap-client
//!
//! WebSocket connection manager for the simtap telemetry store.
//!
//! - [`SocketManager`]: socket lifecycle, fixed-delay bounded retry with an
//!   explicit cancellable timer, post-connect token handshake, and `send`
//! - [`ClientConfig`]: endpoint and retry configuration
//! - [`socket_url`]: HTTP base URL → WebSocket endpoint derivation
//!
//! ## Crate Position
//!
//! Sole writer of the connection handle. Feeds decoded frames into
//! `simtap-store`; consumers never talk to the socket directly.

#![deny(unsafe_code)]

pub mod config;
pub mod errors;
pub mod manager;
pub mod url;

mod ingest;

pub use config::{ClientConfig, DEFAULT_MAX_RETRIES, DEFAULT_RETRY_DELAY_MS};
pub use errors::ClientError;
pub use manager::{ConnectionPhase, SocketManager};
pub use url::socket_url;
