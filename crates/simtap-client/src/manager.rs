//! Socket lifecycle and bounded reconnection.
//!
//! [`SocketManager`] owns the connection exclusively. It models the retry
//! policy as an explicit phase machine with a cancellable timer: each close
//! schedules one reconnect after a fixed delay, the attempt counter is
//! bounded, and a fresh external [`SocketManager::start_web_socket`] call
//! cancels any stale pending retry instead of letting two chains overlap.
//! A generation counter makes handlers of superseded connections inert.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use futures::{SinkExt, StreamExt};
use futures::stream::SplitSink;
use metrics::counter;
use parking_lot::Mutex;
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, info, trace, warn};
use uuid::Uuid;

use simtap_store::TelemetryStore;

use crate::config::ClientConfig;
use crate::errors::ClientError;
use crate::ingest::ingest_frame;
use crate::url::socket_url;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;

/// Where the connection lifecycle currently stands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionPhase {
    /// No connection has been requested yet.
    Idle,
    /// A connect attempt is in flight.
    Connecting,
    /// The socket is open and the handshake has been sent.
    Open,
    /// The socket closed; a reconnect is scheduled.
    Closed,
    /// The retry budget is spent; nothing further is scheduled until an
    /// external caller restarts with a fresh counter.
    Exhausted,
}

/// Owns the socket connection and its reconnection policy.
///
/// All inbound frames are classified and fed into the injected
/// [`TelemetryStore`]; outbound writes go through [`SocketManager::send`],
/// which silently drops payloads while disconnected.
pub struct SocketManager {
    store: Arc<TelemetryStore>,
    config: ClientConfig,
    writer: tokio::sync::Mutex<Option<WsSink>>,
    phase: Mutex<ConnectionPhase>,
    pending_retry: Mutex<Option<JoinHandle<()>>>,
    conn_task: Mutex<Option<JoinHandle<()>>>,
    generation: AtomicU64,
}

impl SocketManager {
    /// Create a manager bound to the given store.
    #[must_use]
    pub fn new(store: Arc<TelemetryStore>, config: ClientConfig) -> Arc<Self> {
        Arc::new(Self {
            store,
            config,
            writer: tokio::sync::Mutex::new(None),
            phase: Mutex::new(ConnectionPhase::Idle),
            pending_retry: Mutex::new(None),
            conn_task: Mutex::new(None),
            generation: AtomicU64::new(0),
        })
    }

    /// Current lifecycle phase.
    #[must_use]
    pub fn phase(&self) -> ConnectionPhase {
        *self.phase.lock()
    }

    /// The store this manager feeds.
    #[must_use]
    pub const fn store(&self) -> &Arc<TelemetryStore> {
        &self.store
    }

    /// Establish (or re-establish) the connection.
    ///
    /// `tries` is the attempt counter: external callers pass `0`, the retry
    /// path passes the incremented value. When `tries` exceeds the
    /// configured budget the call is a silent no-op and the manager parks
    /// in [`ConnectionPhase::Exhausted`] until re-invoked with a fresh
    /// counter. A successful open does not reset the counter.
    ///
    /// Any pending retry timer is cancelled and the previous connection
    /// task is torn down, so repeated external calls produce one connection
    /// chain rather than overlapping ones.
    pub fn start_web_socket(self: &Arc<Self>, token: &str, tries: u32) {
        if tries > self.config.max_retries {
            *self.phase.lock() = ConnectionPhase::Exhausted;
            debug!(tries, "connection attempts exhausted, staying disconnected");
            return;
        }
        if let Some(handle) = self.pending_retry.lock().take() {
            handle.abort();
        }
        if let Some(handle) = self.conn_task.lock().take() {
            handle.abort();
        }
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        *self.phase.lock() = ConnectionPhase::Connecting;

        let mgr = Arc::clone(self);
        let token = token.to_owned();
        let handle = tokio::spawn(async move {
            mgr.run_connection(generation, token, tries).await;
        });
        *self.conn_task.lock() = Some(handle);
    }

    /// Write a text frame to the live connection.
    ///
    /// Silently drops the payload when no connection is held — no error, no
    /// queueing, at-most-once.
    pub async fn send(&self, payload: impl Into<String>) {
        let payload: String = payload.into();
        let mut writer = self.writer.lock().await;
        let Some(sink) = writer.as_mut() else {
            trace!("send without live connection; payload dropped");
            return;
        };
        if let Err(e) = sink.send(Message::Text(payload.into())).await {
            warn!(error = %e, "websocket send failed");
        }
    }

    // ─── Connection task ─────────────────────────────────────────────────

    async fn run_connection(self: Arc<Self>, generation: u64, token: String, tries: u32) {
        let conn_id = Uuid::now_v7();
        let url = socket_url(self.config.base_url.as_deref());
        debug!(%conn_id, %url, tries, "connecting");
        counter!("simtap_connect_attempts_total").increment(1);

        // Drop any sink left over from a superseded connection before
        // connecting, so its socket is torn down promptly.
        {
            let mut writer = self.writer.lock().await;
            if self.is_stale(generation) {
                return;
            }
            *writer = None;
        }

        let ws = match self.open_connection(&url).await {
            Ok(ws) => ws,
            Err(e) => {
                warn!(%conn_id, error = %e, "connect failed");
                self.handle_close(generation, &token, tries).await;
                return;
            }
        };

        let (mut sink, mut stream) = ws.split();
        {
            // Install under the writer lock with the generation re-checked:
            // a connect that was superseded mid-flight must not clobber the
            // live connection's state. The handshake goes out on the owned
            // sink before it is installed, so it can only reach this
            // connection's socket.
            let mut writer = self.writer.lock().await;
            if self.is_stale(generation) {
                return;
            }
            *self.phase.lock() = ConnectionPhase::Open;
            self.store.set_socket_open(true);
            if let Err(e) = sink.send(Message::Text(format!("token:{token}").into())).await {
                warn!(%conn_id, error = %e, "handshake send failed");
            }
            *writer = Some(sink);
        }
        info!(%conn_id, "websocket open");

        while let Some(frame) = stream.next().await {
            if self.is_stale(generation) {
                return;
            }
            match frame {
                Ok(Message::Text(text)) => ingest_frame(&self.store, text.as_str()),
                Ok(Message::Close(_)) => break,
                Ok(_) => {}
                Err(e) => {
                    warn!(%conn_id, error = %e, "websocket read error");
                    break;
                }
            }
        }

        debug!(%conn_id, "websocket closed");
        self.handle_close(generation, &token, tries).await;
    }

    async fn open_connection(&self, url: &str) -> Result<WsStream, ClientError> {
        let (ws, _response) = connect_async(url).await?;
        Ok(ws)
    }

    /// Close handling: flip the open flag, drop the write half, and either
    /// schedule one reconnect or park exhausted. Inert for superseded
    /// connections.
    async fn handle_close(self: &Arc<Self>, generation: u64, token: &str, tries: u32) {
        if self.is_stale(generation) {
            return;
        }
        *self.writer.lock().await = None;
        self.store.set_socket_open(false);

        let next = tries + 1;
        if next > self.config.max_retries {
            *self.phase.lock() = ConnectionPhase::Exhausted;
            debug!(attempts = next, "retry budget spent; waiting for an external restart");
            return;
        }
        *self.phase.lock() = ConnectionPhase::Closed;

        let delay = self.config.retry_delay();
        let mgr = Arc::clone(self);
        let token = token.to_owned();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // Clear the slot first: this task must not abort itself from
            // inside start_web_socket.
            let _ = mgr.pending_retry.lock().take();
            mgr.start_web_socket(&token, next);
        });
        *self.pending_retry.lock() = Some(handle);
    }

    fn is_stale(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) != generation
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
