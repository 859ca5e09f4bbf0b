//! Server lifecycle state machine.
//!
//! # State Transitions
//! ```text
//! Starting → Serving → ShuttingDown → Stopped
//! ```
//!
//! Transitions only move forward. The current state is published on a
//! watch channel so embedders and tests can wait for a given state.

use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LifecycleState {
    Starting,
    Serving,
    ShuttingDown,
    Stopped,
}

impl std::fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            LifecycleState::Starting => "starting",
            LifecycleState::Serving => "serving",
            LifecycleState::ShuttingDown => "shutting_down",
            LifecycleState::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// Owner of the lifecycle state.
#[derive(Debug)]
pub struct Lifecycle {
    tx: watch::Sender<LifecycleState>,
}

impl Lifecycle {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(LifecycleState::Starting);
        Self { tx }
    }

    pub fn current(&self) -> LifecycleState {
        *self.tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<LifecycleState> {
        self.tx.subscribe()
    }

    /// Move to `next`. Returns false and leaves the state untouched if `next`
    /// is not ahead of the current state.
    pub fn transition(&self, next: LifecycleState) -> bool {
        let current = self.current();
        if next <= current {
            tracing::warn!(from = %current, to = %next, "Ignoring backwards lifecycle transition");
            return false;
        }
        self.tx.send_replace(next);
        tracing::debug!(from = %current, to = %next, "Lifecycle transition");
        true
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}
