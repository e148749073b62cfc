//! setu-triage - Disaster Report Triage Microservice
//!
//! Scores incoming citizen reports from text, photo and metadata signals,
//! decides priority and whether human verification is required, and serves
//! the emergency assistant with a helpline fallback.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{info, warn};

use setu_triage::config::{ConfigOverrides, TriageConfig};
use setu_triage::AppState;

/// Command-line arguments for setu-triage
#[derive(Parser, Debug)]
#[command(name = "setu-triage")]
#[command(about = "Disaster report triage microservice for Setu")]
#[command(version)]
struct Args {
    /// Configuration file (TOML)
    #[arg(short, long, env = "SETU_CONFIG")]
    config: Option<PathBuf>,

    /// Port to listen on
    #[arg(short, long, env = "SETU_PORT")]
    port: Option<u16>,

    /// Text analyzer base URL (empty disables the analyzer)
    #[arg(long, env = "SETU_TEXT_ANALYZER_URL")]
    text_analyzer_url: Option<String>,

    /// Image analyzer base URL (empty disables the analyzer)
    #[arg(long, env = "SETU_IMAGE_ANALYZER_URL")]
    image_analyzer_url: Option<String>,

    /// Assistant (Ollama) base URL (empty disables the assistant)
    #[arg(long, env = "SETU_ASSISTANT_URL")]
    assistant_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let overrides = ConfigOverrides {
        port: args.port,
        text_analyzer_url: args.text_analyzer_url,
        image_analyzer_url: args.image_analyzer_url,
        assistant_url: args.assistant_url,
    };

    // Resolution logs are emitted before the configured subscriber exists
    let config = setu_common::logging::with_bootstrap_logging("setu_triage", || {
        TriageConfig::load(args.config.as_deref(), &overrides)
    })
    .context("Failed to load configuration")?;

    setu_common::logging::init_tracing("setu_triage", &config.logging)
        .context("Failed to initialize logging")?;

    info!("Starting setu-triage (Report Triage) microservice");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));
    info!(
        text = config.fusion.weights.text,
        image = config.fusion.weights.image,
        metadata = config.fusion.weights.metadata,
        "Fusion weights"
    );

    let state = AppState::from_config(&config)?;
    let shutdown = state.shutdown.clone();
    let app = setu_triage::build_router(state);

    let addr: SocketAddr = format!("{}:{}", config.bind_address, config.port)
        .parse()
        .with_context(|| format!("Invalid bind address {}:{}", config.bind_address, config.port))?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            // Pending analyzer calls give up; their decisions still complete
            shutdown.cancel();
        })
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
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
