//! Socket endpoint derivation.

/// Derive the WebSocket endpoint from the API's base HTTP URL.
///
/// Mirrors the HTTP scheme onto the socket: `https` becomes `wss`, `http`
/// becomes `ws`; any other scheme is left alone. The `/ws` path is appended.
/// A missing or empty base URL yields the path-only `/ws`.
#[must_use]
pub fn socket_url(base_url: Option<&str>) -> String {
    match base_url {
        Some(base) if !base.is_empty() => {
            let ws_base = if let Some(rest) = base.strip_prefix("https") {
                format!("wss{rest}")
            } else if let Some(rest) = base.strip_prefix("http") {
                format!("ws{rest}")
            } else {
                base.to_string()
            };
            format!("{}/ws", ws_base.trim_end_matches('/'))
        }
        _ => "/ws".to_string(),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
