//! Text-to-speech relay.
//!
//! # Architecture Overview
//!
//! ```text
//!                     ┌──────────────────────────────────────────────────┐
//!                     │                      RELAY                       │
//!                     │                                                  │
//!   Client Request    │  ┌──────────┐   ┌──────────┐   ┌─────────────┐   │
//!   ──────────────────┼─▶│ validate │──▶│  admit   │──▶│  upstream   │───┼──▶ TTS API
//!                     │  │ (cheap)  │   │ (1 lock) │   │ (10s bound) │   │
//!                     │  └────┬─────┘   └────┬─────┘   └──────┬──────┘   │
//!                     │       │ 403/405/400  │ 429/503        │ 502      │
//!   Client Response   │       ▼              ▼                ▼          │
//!   ◀─────────────────┼──────────── JSON {"message"} or audio ───────────│
//!                     └──────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use tts_relay::config::{finalize, load_config, RelayConfig};
use tts_relay::http::HttpServer;
use tts_relay::lifecycle::{signals, Shutdown};
use tts_relay::observability::{logging, metrics};

#[derive(Parser, Debug)]
#[command(name = "tts-relay")]
#[command(about = "Rate-limited relay for an authenticated text-to-speech API", long_about = None)]
struct Args {
    /// Path to a TOML config file. Defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override `listener.bind_address`.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => finalize(RelayConfig::default())?,
    };
    if let Some(bind) = args.bind {
        config.listener.bind_address = bind;
    }

    logging::init(&config.observability.log_level);
    tracing::info!("tts-relay v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.listener.bind_address,
        relay_path = %config.listener.relay_path,
        upstream = %config.upstream.endpoint,
        upstream_timeout_secs = config.upstream.timeout_secs,
        limit_levels = config.limits.0.len(),
        "Configuration loaded"
    );
    for level in &config.limits.0 {
        tracing::info!(
            window_secs = level.window_secs,
            max_calls_per_caller = level.max_calls_per_caller,
            max_total_callers = level.max_total_callers,
            "Limit level"
        );
    }

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let server = HttpServer::new(config)?;

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(signals::forward_signals(shutdown));

    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
