//! Command-line tail for live simulation telemetry.
//!
//! Connects to a simulation server's WebSocket endpoint, feeds frames into
//! the telemetry store, and logs each new sample until interrupted.

#![deny(unsafe_code)]

use std::sync::Arc;

use clap::Parser;

use simtap_client::{ClientConfig, SocketManager};
use simtap_store::TelemetryStore;

#[derive(Debug, Parser)]
#[command(name = "simtap", about = "Tail live simulation telemetry over WebSocket")]
struct Args {
    /// Base HTTP(S) URL of the simulation API, e.g. `https://sim.example.com`.
    #[arg(long, env = "SIMTAP_BASE_URL")]
    base_url: String,

    /// Auth token sent as the first frame after connect.
    #[arg(long, env = "SIMTAP_TOKEN")]
    token: String,

    /// Delay between reconnect attempts in milliseconds.
    #[arg(long, default_value_t = simtap_client::DEFAULT_RETRY_DELAY_MS)]
    retry_delay_ms: u64,

    /// Reconnect attempts allowed after the initial connect.
    #[arg(long, default_value_t = simtap_client::DEFAULT_MAX_RETRIES)]
    max_retries: u32,
}

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    tracing::info!(base_url = %args.base_url, "starting simtap");

    let store = Arc::new(TelemetryStore::new());
    let config = ClientConfig {
        base_url: Some(args.base_url),
        retry_delay_ms: args.retry_delay_ms,
        max_retries: args.max_retries,
    };
    let manager = SocketManager::new(Arc::clone(&store), config);
    manager.start_web_socket(&args.token, 0);

    let mut updates = store.subscribe();
    // (operation id, timestamp millis) of the newest sample already logged
    let mut last_logged: Option<(String, i64)> = None;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let samples = store.simulation_data();
                let Some(sample) = samples.last() else {
                    continue;
                };
                let key = (sample.operation_id.clone(), sample.timestamp.timestamp_millis());
                if last_logged.as_ref() == Some(&key) {
                    continue;
                }
                tracing::info!(
                    operation = %sample.operation_id,
                    rx = sample.rx,
                    tx = sample.tx,
                    msgs_rx = sample.msgs_rx,
                    msgs_tx = sample.msgs_tx,
                    "sample"
                );
                last_logged = Some(key);
            }
        }
    }

    tracing::info!("shutting down");
}
