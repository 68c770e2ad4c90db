//! Ollama Farm
//!
//! Presents one Ollama `/api/generate/` endpoint backed by a pool of Ollama hosts.
//!
//! # Architecture Overview
//!
//! ```text
//!                         ┌──────────────────────────────────────────────────┐
//!                         │                   OLLAMA FARM                     │
//!                         │                                                   │
//!     Client Request      │  ┌─────────┐    ┌───────────┐    ┌────────────┐  │
//!     ────────────────────┼─▶│  http   │───▶│ failover  │───▶│  selector  │  │
//!                         │  │ server  │    │coordinator│    │ (registry) │  │
//!                         │  └─────────┘    └─────┬─────┘    └─────┬──────┘  │
//!                         │                       │                │ probe   │
//!                         │                       ▼                ▼         │
//!     Client Response     │  ┌─────────┐    ┌───────────┐    ┌────────────┐  │
//!     ◀───────────────────┼──│farm_host│◀───│ forwarder │    │   health   │  │
//!                         │  │ rewrite │    │           │◀──▶│   probe    │  │
//!                         │  └─────────┘    └─────┬─────┘    └────────────┘  │
//!                         └───────────────────────┼──────────────────────────┘
//!                                                 ▼
//!                                           Ollama hosts
//! ```
//!
//! # Usage
//!
//! ```text
//! ollama-farm [--port PORT] [--config FILE] [--failover] [HOST[:PORT] ...]
//! ollama-farm --port 1234 localhost:11234 10.0.10.1 10.0.10.3
//! ```

use std::net::SocketAddr;
use std::process::ExitCode;

use clap::Parser;
use tokio::net::TcpListener;

use ollama_farm::config::FarmArgs;
use ollama_farm::lifecycle::{signals, startup};
use ollama_farm::observability::{logging, metrics};
use ollama_farm::{FarmServer, Shutdown};

#[tokio::main]
async fn main() -> ExitCode {
    let args = FarmArgs::parse();

    let config = match args.into_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error => {}", e);
            return ExitCode::FAILURE;
        }
    };

    logging::init_logging(&config.observability);
    tracing::info!("ollama-farm v{} starting", env!("CARGO_PKG_VERSION"));

    match run(config).await {
        Ok(()) => {
            tracing::info!("Shutdown complete");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Fatal error");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: ollama_farm::FarmConfig) -> Result<(), Box<dyn std::error::Error>> {
    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let port = config.listener.port;
    let server = FarmServer::new(config);

    let online = startup::probe_all(server.registry(), server.probe()).await;
    tracing::info!(online, total = server.registry().len(), "Initial host probe complete");

    let listener = TcpListener::bind(SocketAddr::from(([0, 0, 0, 0], port))).await?;
    tracing::info!(port, "Listening on port {}; press Control+C to exit", port);

    let shutdown = Shutdown::new();
    signals::spawn_signal_listener(&shutdown);

    server.run(listener, shutdown.subscribe()).await?;
    Ok(())
}
