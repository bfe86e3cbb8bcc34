//! sysknobs - Main entry point
//!
//! Control-surface daemon exposing the `soundcontrol` and `dyn_fsync`
//! attribute groups over HTTP. Either group failing to register degrades
//! that feature only; the daemon itself keeps running.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sysknobs::api::{self, AppState};
use sysknobs::attr::{AttrPublisher, AttrRegistry};
use sysknobs::config::TomlConfig;
use sysknobs::fsync::{OsWriteback, SyncController, WritebackFlush};
use sysknobs::power::{self, PowerMonitor};
use sysknobs::sound::BoostRegistry;

/// Command-line arguments for sysknobs
#[derive(Parser, Debug)]
#[command(name = "sysknobs")]
#[command(about = "Sysfs-style control surface for audio boost and dynamic fsync tunables")]
#[command(version)]
struct Args {
    /// Port to listen on (overrides config file)
    #[arg(short, long, env = "SYSKNOBS_PORT")]
    port: Option<u16>,

    /// Path to TOML configuration file
    #[arg(short, long, env = "SYSKNOBS_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = TomlConfig::load(args.config.as_deref())
        .context("Failed to load configuration")?;

    init_tracing(&config)?;

    let port = args.port.unwrap_or(config.port);
    info!("Starting sysknobs on port {}", port);

    let attrs = Arc::new(AttrRegistry::new());

    // Audio boost registry
    let boosts = Arc::new(BoostRegistry::new());
    if let Err(e) = attrs.register(boosts.attr_group()) {
        // Feature unavailable, daemon unaffected
        error!("soundcontrol attribute group create failed: {}", e);
    }

    // Sync deferral controller, wired to the power event source
    let flusher: Arc<dyn WritebackFlush> = Arc::new(OsWriteback);
    let sync_controller = Arc::new(SyncController::new(flusher));
    let power_monitor = Arc::new(PowerMonitor::new());
    match attrs.register(sync_controller.attr_group()) {
        Ok(()) => {
            power::spawn_dispatch(&power_monitor, Arc::clone(&sync_controller));
        }
        Err(e) => {
            error!("dyn_fsync attribute group create failed: {}", e);
        }
    }

    let app_state = AppState {
        attrs: Arc::clone(&attrs),
        power: power_monitor,
        port,
    };
    let app = api::create_router(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    attrs.unregister("dyn_fsync");
    attrs.unregister("soundcontrol");
    info!("Server shutdown complete");
    Ok(())
}

/// Initialize tracing from config (RUST_LOG takes precedence)
fn init_tracing(config: &TomlConfig) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!("sysknobs={}", config.logging.level))
    });

    match &config.logging.file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_writer(Arc::new(file))
                        .with_ansi(false),
                )
                .init();
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
