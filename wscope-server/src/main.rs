//! Walletscope Server
//!
//! A multi-chain wallet dashboard backend: balances and recent transfers
//! from public block explorers, plus an optional AI summary and chat relay.

mod api;
mod config;
mod server;
mod shutdown;
mod state;

use clap::Parser;
use config::{ConfigLoader, Overrides};
use server::{build_router, run_server};
use state::AppState;
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use wscope_core::ai::AiRelay;
use wscope_core::service::WalletService;

/// Walletscope - multi-chain wallet dashboard API
#[derive(Parser, Debug)]
#[command(name = "wscope-server")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the configuration file (skipped if it does not exist)
    #[arg(short, long, default_value = "./walletscope.toml")]
    config: PathBuf,

    #[command(flatten)]
    overrides: Overrides,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    init_tracing();

    // Parse command line arguments
    let args = Args::parse();

    tracing::info!("Starting wscope-server v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config_loader = ConfigLoader::new(&args.config, args.overrides);
    let loaded_config = config_loader.load().map_err(|e| {
        tracing::error!("Failed to load configuration: {}", e);
        e
    })?;

    let core = loaded_config.core;
    let http_client = core.http_client().map_err(|e| {
        tracing::error!("Failed to build HTTP client: {}", e);
        e
    })?;

    let wallets = WalletService::from_config(&core, http_client.clone());
    tracing::info!(
        chains = ?wallets.enabled_chains(),
        transfer_limit = core.limits.transfer_limit,
        "Chain adapters mounted"
    );

    let ai = AiRelay::new(core.ai.clone(), http_client);
    if ai.is_available() {
        tracing::info!(model = ai.model(), "AI relay enabled");
    } else {
        tracing::warn!("GEMINI_API_KEY not set, AI endpoints will answer 503");
    }

    // Build the router
    let state = AppState::new(wallets, ai);
    let router = build_router(state, loaded_config.server.static_dir.as_deref());

    // Run the server
    let listen_addr = loaded_config.server.listen;
    tracing::info!("Starting HTTP server on {}", listen_addr);
    run_server(router, listen_addr).await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Initialize the tracing subscriber with environment-based filtering.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
