//! gatekeeper: a secured query-routing tier for a primary/replica MySQL cluster.
//!
//! # Architecture Overview
//!
//! ```text
//!   Client ──▶ Gateway ──▶ Relay ──▶ Router ──▶ Primary (writes)
//!             (password)  (shape)   (mode)  └─▶ Replica (reads: random,
//!                                                lowest latency, direct)
//! ```
//!
//! Each hop is an axum service. One process can run any subset of them.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use gatekeeper::config::{load_config, Component};
use gatekeeper::lifecycle::{self, Shutdown};
use gatekeeper::observability::{logging::init_logging, metrics::init_metrics};

#[derive(Parser)]
#[command(name = "gatekeeper", version)]
#[command(about = "Authenticated query routing for a primary/replica cluster", long_about = None)]
struct Cli {
    /// TOML configuration file; defaults apply when omitted
    #[arg(short, long, env = "GATEKEEPER_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Clone, Copy)]
enum Commands {
    /// Run the query router
    Router,
    /// Run the trust relay
    Relay,
    /// Run the authenticating gateway
    Gateway,
    /// Run all three hops in this process
    All,
}

impl Commands {
    fn components(self) -> Vec<Component> {
        match self {
            Commands::Router => vec![Component::Router],
            Commands::Relay => vec![Component::Relay],
            Commands::Gateway => vec![Component::Gateway],
            Commands::All => vec![Component::Router, Component::Relay, Component::Gateway],
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let components = cli.command.components();

    let config = match load_config(cli.config.as_deref(), &components) {
        Ok(config) => config,
        Err(e) => {
            init_logging("info");
            tracing::error!(error = %e, "Failed to load configuration");
            return Err(e.into());
        }
    };

    init_logging(&config.observability.log_level);
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        components = ?components,
        "gatekeeper starting"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let shutdown = Shutdown::new();
    let signal_shutdown = shutdown.clone();
    tokio::spawn(async move {
        lifecycle::wait_for_signal().await;
        signal_shutdown.trigger();
    });

    lifecycle::run(&config, &components, &shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
