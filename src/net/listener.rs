//! TCP listener setup.
//!
//! # Responsibilities
//! - Resolve and bind the configured `host:port`
//! - Report bind failures as a fatal, typed error

use tokio::net::TcpListener;

/// Failed to bind the listening socket.
#[derive(Debug, thiserror::Error)]
#[error("failed to bind {address}: {source}")]
pub struct BindError {
    pub address: String,
    #[source]
    pub source: std::io::Error,
}

/// Bind to `address`, resolving host names such as `localhost`.
pub async fn bind(address: &str) -> Result<TcpListener, BindError> {
    let to_error = |source| BindError {
        address: address.to_string(),
        source,
    };

    let listener = TcpListener::bind(address).await.map_err(to_error)?;
    let local_addr = listener.local_addr().map_err(to_error)?;

    tracing::info!(
        address = %local_addr,
        "Listener bound"
    );

    Ok(listener)
}
