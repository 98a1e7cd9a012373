//! Client error types.
//!
//! Connection failures never cross the public API — they are logged and
//! degrade into the retry path. [`ClientError`] exists for the fallible
//! internals and their log lines.

use thiserror::Error;

/// Errors raised by the connection internals.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The WebSocket connect attempt failed (DNS, TCP, TLS, or upgrade).
    #[error("websocket connect failed: {0}")]
    Connect(#[from] tokio_tungstenite::tungstenite::Error),
}
