//! Ping server binary.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ net::listener ─▶ net::connection ─▶ http::server (middleware)
//!                                                              │
//!                                    ┌─────────────────────────┴──────────┐
//!                                    ▼                                    ▼
//!                            /healthz heartbeat            security::rate_limit
//!                                                                         │
//!                                                                         ▼
//!                                                                http::ping ─▶ {"result":"pong"}
//!
//!     SIGINT/SIGTERM ─▶ lifecycle::signals ─▶ Shutdown ─▶ drain ─▶ exit 0
//! ```

use std::process::ExitCode;

use ping_server::lifecycle::{signals::TerminationSignals, startup, Shutdown, ShutdownOutcome};
use ping_server::observability::logging;

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(e) = logging::init("info") {
        eprintln!("failed to initialize logging: {e}");
    }

    tracing::info!("ping-server v{} starting", env!("CARGO_PKG_VERSION"));

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();

    match TerminationSignals::install() {
        Ok(signals) => {
            let trigger = shutdown.clone();
            tokio::spawn(async move {
                match signals.recv().await {
                    Ok(()) => {
                        tracing::info!("Shutdown signal received, gracefully shutting down");
                        trigger.trigger();
                    }
                    Err(e) => tracing::error!(error = %e, "Failed waiting for shutdown signal"),
                }
            });
        }
        Err(e) => tracing::error!(error = %e, "Failed to install signal handlers"),
    }

    let dir = startup::config_dir();
    match startup::run(&dir, server_shutdown).await {
        Ok(ShutdownOutcome::Graceful) => {
            tracing::info!("Server stopped gracefully");
            ExitCode::SUCCESS
        }
        Ok(ShutdownOutcome::Forced { aborted }) => {
            tracing::warn!(aborted_connections = aborted, "Server stopped after forcing connections closed");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, config_dir = %dir.display(), "Server failed to start");
            ExitCode::FAILURE
        }
    }
}
