//! Connection manager configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default delay between reconnect attempts, in milliseconds.
pub const DEFAULT_RETRY_DELAY_MS: u64 = 3000;

/// Default retry budget: retries after the initial attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 10;

/// Configuration for [`SocketManager`](crate::SocketManager).
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientConfig {
    /// Base HTTP(S) URL of the simulation API, e.g. `https://sim.example.com`.
    /// The socket endpoint is derived by scheme substitution plus `/ws`.
    /// When absent, the degenerate path-only `/ws` endpoint is used (the
    /// connect attempt fails and flows through the retry path).
    #[serde(default)]
    pub base_url: Option<String>,
    /// Fixed delay between reconnect attempts in ms (default: 3000).
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    /// Retries allowed after the initial attempt (default: 10, i.e. at most
    /// 11 attempts total before the manager gives up).
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_retry_delay_ms() -> u64 {
    DEFAULT_RETRY_DELAY_MS
}
fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            retry_delay_ms: DEFAULT_RETRY_DELAY_MS,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

impl ClientConfig {
    /// The reconnect delay as a [`Duration`].
    #[must_use]
    pub const fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
