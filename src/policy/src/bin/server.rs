//! # Policy Decision Server
//!
//! HTTP front end for the rolegate policy engine.
//!
//! ## Configuration
//!
//! - `--config` / `ROLEGATE_CONFIG` - Policy document (TOML or JSON)
//! - `--port` / `PORT` - HTTP server port (default: 8080)
//! - `RUST_LOG` - Log level (default: info)

use anyhow::{Context, Result};
use clap::Parser;
use rolegate_policy::server::{build_router, AppState};
use rolegate_policy::PolicyConfig;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Rolegate policy decision server
#[derive(Parser)]
#[command(name = "policy-server")]
#[command(about = "Role/permission policy decision service")]
#[command(version)]
struct Cli {
    /// Path to the policy document
    #[arg(short, long, default_value = "/etc/rolegate/policy.toml", env = "ROLEGATE_CONFIG")]
    config: PathBuf,

    /// HTTP listen port
    #[arg(short, long, default_value_t = 8080, env = "PORT")]
    port: u16,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

/// Graceful shutdown handler
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
            Ok(mut sigterm) => {
                sigterm.recv().await;
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
            info!("Received Ctrl+C signal");
        }
        _ = terminate => {
            info!("Received SIGTERM signal");
        }
    }

    info!("Starting graceful shutdown");
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("{},rolegate_policy={}", log_level, log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Rolegate Policy Server v{}", rolegate_policy::VERSION);

    let engine = PolicyConfig::load(&cli.config)
        .with_context(|| format!("Failed to load policy document {}", cli.config.display()))?
        .into_engine()
        .context("Invalid policy document")?;

    let state = AppState::new(Arc::new(engine));
    let app = build_router(state);
    let addr = SocketAddr::from(([0, 0, 0, 0], cli.port));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind HTTP server on {}", addr))?;

    info!("Listening on {}", addr);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    info!("Server shut down gracefully");
    Ok(())
}
