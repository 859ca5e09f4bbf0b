//! Stop requests and drain results.
//!
//! `main` fires [`Shutdown::trigger`] when SIGINT or SIGTERM arrives. The
//! accept loop in `HttpServer::run` holds the matching receiver and stops
//! accepting when it fires. The drain that follows reports a
//! [`ShutdownOutcome`].

use tokio::sync::broadcast;

/// One-shot stop request fanned out to every receiver.
///
/// Clones share the same channel, so the signal task and tests can each hold
/// a handle. Receivers must be taken with [`Shutdown::subscribe`] before the
/// trigger fires; a receiver created afterwards never sees it.
#[derive(Debug, Clone)]
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Ask every receiver to stop. Firing with no receivers left is a no-op.
    pub fn trigger(&self) {
        if self.tx.send(()).is_err() {
            tracing::debug!("Stop requested with no server listening");
        }
    }

    /// Receivers still attached, i.e. servers that have not returned yet.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// How the server reached `Stopped`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownOutcome {
    /// Every connection finished within the drain timeout.
    Graceful,
    /// The drain timeout elapsed and `aborted` connections were closed forcibly.
    Forced { aborted: u64 },
}
