//! Fox Remote Server - standalone headless remote-control server.
//!
//! Runs an in-memory player behind the fox-remote HTTP API: status
//! snapshots, a live event stream and the command endpoint.

mod config;

use std::net::IpAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use fox_remote_core::{spawn_server, AppState, MemoryPlayer, StatusBroadcaster};
use tokio::signal;

use crate::config::ServerConfig;

/// Fox Remote Server - live status and remote control for a music player.
#[derive(Parser, Debug)]
#[command(name = "fox-remote-server")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the configuration file (YAML).
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(short, long, default_value = "info", env = "FOX_REMOTE_LOG_LEVEL")]
    log_level: log::LevelFilter,

    /// Bind port (overrides config file).
    #[arg(short = 'p', long, env = "FOX_REMOTE_BIND_PORT")]
    port: Option<u16>,

    /// Bind address (overrides config file).
    #[arg(short = 'b', long, env = "FOX_REMOTE_BIND_ADDRESS")]
    bind_address: Option<IpAddr>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    env_logger::Builder::new()
        .filter_level(args.log_level)
        .format_timestamp_millis()
        .init();

    log::info!("Fox Remote Server v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let mut config =
        ServerConfig::load(args.config.as_deref()).context("Failed to load configuration")?;

    // Apply CLI overrides
    if let Some(port) = args.port {
        config.bind_port = port;
    }
    if let Some(address) = args.bind_address {
        config.bind_address = address;
    }

    log::info!(
        "Configuration: bind={}, tracks={}, logged_in={}",
        config.socket_addr(),
        config.tracks.len(),
        config.logged_in
    );
    if config.tracks.is_empty() {
        log::warn!("No tracks configured - transport commands will have no effect");
    }

    // The player reports every change straight to the event streams
    let broadcaster = StatusBroadcaster::new();
    let player = Arc::new(MemoryPlayer::new(
        std::mem::take(&mut config.tracks),
        Arc::new(broadcaster.clone()),
    ));
    player.set_logged_in(config.logged_in);

    let app_state = AppState::new(player.clone(), broadcaster);
    let server = spawn_server(app_state, config.socket_addr())
        .await
        .context("Failed to start HTTP server")?;

    log::info!("HTTP server started on {}", server.local_addr());

    // Drive playback progress so listeners see elapsed time and lyrics move
    let tick_interval = config.tick_interval();
    let ticker = tokio::spawn(async move {
        let mut interval = tokio::time::interval(tick_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        interval.tick().await;
        loop {
            interval.tick().await;
            player.tick(tick_interval);
        }
    });

    // Wait for shutdown signal
    shutdown_signal().await;

    log::info!("Shutdown signal received, cleaning up...");

    ticker.abort();
    server.shutdown().await.context("Server did not shut down cleanly")?;

    log::info!("Shutdown complete");
    Ok(())
}

/// Waits for a shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            log::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                log::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
