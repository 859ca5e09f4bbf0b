//! Startup orchestration.
//!
//! # Responsibilities
//! - Load and validate configuration
//! - Start the metrics exporter when enabled
//! - Bind the listener and hand it to the HTTP server
//!
//! # Design Decisions
//! - Fail fast: config and bind errors are fatal
//! - The listener binds last (traffic only when ready)

use std::path::{Path, PathBuf};

use tokio::sync::broadcast;

use crate::config::{load_config, AppConfig, ConfigError};
use crate::http::HttpServer;
use crate::lifecycle::ShutdownOutcome;
use crate::net::{self, BindError};
use crate::observability::metrics;

/// Environment variable naming the directory that holds `app.toml`.
pub const CONFIG_DIR_ENV: &str = "PING_SERVER_CONFIG_DIR";

/// Errors that stop the server before it serves traffic.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("unable to load configuration: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Bind(#[from] BindError),

    #[error("server error: {0}")]
    Serve(#[from] std::io::Error),
}

/// Config directory from `PING_SERVER_CONFIG_DIR`, defaulting to the working directory.
pub fn config_dir() -> PathBuf {
    std::env::var_os(CONFIG_DIR_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Load config from `dir` and serve until `shutdown` fires.
pub async fn run(
    dir: &Path,
    shutdown: broadcast::Receiver<()>,
) -> Result<ShutdownOutcome, StartupError> {
    let config = load_config(dir)?;

    tracing::info!(
        serve_address = %config.serve_address,
        rate_limited = config.rate_limit.enabled,
        burst = config.rate_limit.burst,
        refill_interval_secs = config.rate_limit.refill_interval_secs,
        "Configuration loaded"
    );

    serve(config, shutdown).await
}

/// Bind the configured address and serve until `shutdown` fires.
pub async fn serve(
    config: AppConfig,
    shutdown: broadcast::Receiver<()>,
) -> Result<ShutdownOutcome, StartupError> {
    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = net::bind(&config.serve_address).await?;
    let server = HttpServer::new(config);
    Ok(server.run(listener, shutdown).await?)
}
