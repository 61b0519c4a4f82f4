//! # Audio Ingest - Main Application Entry Point
//!
//! HTTP service that receives raw PCM audio, wraps it in a WAV container and
//! stores it in a remote blob store, falling back to a local directory.
//!
//! ## Application Architecture:
//! - **config**: Startup configuration (flags, environment, TOML file)
//! - **audio**: WAV header construction and upload filenames
//! - **storage**: Storage backends and the fallback router
//! - **handlers**: HTTP request handlers (`POST /audio`)
//! - **health**: Health and metrics endpoints
//! - **middleware**: Per-endpoint request metrics
//! - **state**: Shared application state and counters
//! - **error**: Error types and their HTTP responses

mod audio;       // WAV encoding and filenames (audio/ directory)
mod config;      // Configuration management (config.rs)
mod error;       // Error handling types (error.rs)
mod handlers;    // HTTP request handlers (handlers/ directory)
mod health;      // Health check endpoints (health.rs)
mod middleware;  // Custom middleware (middleware/ directory)
mod state;       // Application state management (state.rs)
mod storage;     // Storage backends (storage/ directory)

use actix_web::{web, App, HttpServer};
use anyhow::{Context, Result};
use clap::Parser;
use crate::config::{AppConfig, Cli};
use crate::state::AppState;
use crate::storage::StorageRouter;
use tracing::{error, info};
use tracing_actix_web::TracingLogger;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// ## What this function does:
/// 1. **Loads configuration** from flags, environment and config file
/// 2. **Builds the storage router** (remote first when configured, local last)
/// 3. **Starts the HTTP server** and waits for it to stop
/// 4. **Handles graceful shutdown** on SIGINT / SIGTERM
#[actix_web::main]
async fn main() -> Result<()> {
    // A missing .env file is fine
    dotenv::dotenv().ok();

    init_tracing()?;

    let cli = Cli::parse();
    let config = AppConfig::load(&cli).context("Failed to load configuration")?;
    config.validate()?;

    info!("Starting audio-ingest v{}", env!("CARGO_PKG_VERSION"));
    info!(
        addr = %config.server.addr,
        local_dir = %config.storage.local_dir,
        temp_dir = %config.storage.temp_dir,
        "Configuration loaded"
    );

    // Configuration is fixed from here on: the router and the state own it
    let router = StorageRouter::from_config(&config.storage)
        .context("Failed to set up storage backends")?;
    let bind_addr = config.server.bind_address();
    let app_state = AppState::new(config, router);

    info!("Server starting on {}", bind_addr);

    let server = HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(app_state.clone()))
            // Middleware runs bottom-up for requests
            .wrap(middleware::MetricsMiddleware)
            .wrap(TracingLogger::default())
            .configure(handlers::routes)
    })
    .disable_signals()
    .bind(&bind_addr)
    .with_context(|| format!("Failed to bind {}", bind_addr))?
    .run();

    let server_handle = server.handle();
    let server_task = tokio::spawn(server);

    tokio::select! {
        result = server_task => {
            match result {
                Ok(Err(e)) => error!("Server error: {}", e),
                Err(e) => error!("Server task error: {}", e),
                Ok(Ok(())) => {}
            }
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received, stopping server...");
            // Stop accepting connections and let in-flight uploads finish
            server_handle.stop(true).await;
        }
    }

    info!("Server stopped gracefully");
    Ok(())
}

/// ## Environment Variables:
/// - `RUST_LOG`: Controls what gets logged (e.g., "debug", "audio_ingest=trace")
/// - If not set, defaults to "audio_ingest=debug,actix_web=info"
fn init_tracing() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "audio_ingest=debug,actix_web=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init()?;

    Ok(())
}

/// Resolves on Ctrl+C, or SIGTERM on unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT"),
        _ = terminate => info!("Received SIGTERM"),
    }
}
