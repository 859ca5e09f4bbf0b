//! OS signal handling.
//!
//! SIGINT (Ctrl+C) and SIGTERM trigger graceful shutdown. No other signal is
//! handled.

use std::io;

#[cfg(unix)]
use tokio::signal::unix::{signal, Signal, SignalKind};

/// Termination signal handlers, registered when constructed.
///
/// A signal delivered after [`TerminationSignals::install`] returns is
/// buffered until [`TerminationSignals::recv`] polls for it.
#[derive(Debug)]
pub struct TerminationSignals {
    #[cfg(unix)]
    interrupt: Signal,
    #[cfg(unix)]
    terminate: Signal,
}

impl TerminationSignals {
    /// Register the SIGINT and SIGTERM handlers.
    ///
    /// Must be called from inside a tokio runtime.
    pub fn install() -> io::Result<Self> {
        #[cfg(unix)]
        {
            Ok(Self {
                interrupt: signal(SignalKind::interrupt())?,
                terminate: signal(SignalKind::terminate())?,
            })
        }

        #[cfg(not(unix))]
        {
            Ok(Self {})
        }
    }

    /// Wait for the first termination signal.
    pub async fn recv(mut self) -> io::Result<()> {
        #[cfg(unix)]
        {
            tokio::select! {
                _ = self.interrupt.recv() => tracing::info!("SIGINT received"),
                _ = self.terminate.recv() => tracing::info!("SIGTERM received"),
            }
            Ok(())
        }

        #[cfg(not(unix))]
        {
            tokio::signal::ctrl_c().await?;
            tracing::info!("Ctrl+C received");
            Ok(())
        }
    }
}
