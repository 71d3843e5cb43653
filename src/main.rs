//! Character lookup service.
//!
//! # Architecture Overview
//!
//! ```text
//!     POST /characters
//!     ─────────────────▶ http ──▶ LookupService ──▶ FallbackOrchestrator
//!                                                      │
//!                              ┌───────────────────────┴──────────────┐
//!                              ▼ primary                   secondary ▼
//!                       ┌─────────────┐                    ┌─────────────┐
//!                       │ StoreGateway│                    │RemoteGateway│
//!                       │  + breaker  │◀── write-back ─────│  + breaker  │
//!                       └──────┬──────┘   (detached)       └──────┬──────┘
//!                              ▼                                  ▼
//!                       FileCollection                     character API
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use character_lookup::config::load_config;
use character_lookup::http::HttpServer;
use character_lookup::lifecycle::{build_state, Shutdown};
use character_lookup::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "character-lookup")]
#[command(about = "Character lookup service with store fallback", long_about = None)]
struct Args {
    /// Path to a TOML config file. Environment variables override it.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = load_config(args.config.as_deref())?;

    logging::init_logging(&config.observability)?;

    tracing::info!("character-lookup v{} starting", env!("CARGO_PKG_VERSION"));
    if config.app.is_development() {
        tracing::info!("Running in development mode");
    }

    tracing::info!(
        bind_address = %config.app.bind_address,
        collection = %config.store.collection,
        remote = %config.remote.base_url,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr)?,
            Err(e) => {
                tracing::error!(
                    metrics_address = %config.observability.metrics_address,
                    error = %e,
                    "Failed to parse metrics address"
                );
            }
        }
    }

    let state = build_state(&config)?;

    let listener = TcpListener::bind(&config.app.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config, state);
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
