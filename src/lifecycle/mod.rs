//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Validate → Bind listener → Serve
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Stop accepting → Drain connections → Force-close stragglers
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//!
//! State (state.rs):
//!     Starting → Serving → ShuttingDown → Stopped
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then listener
//! - Ordered shutdown: stop accept, drain, close
//! - Shutdown has timeout: forced close after deadline, exit code unaffected

pub mod shutdown;
pub mod signals;
pub mod startup;
pub mod state;

pub use shutdown::{Shutdown, ShutdownOutcome};
pub use startup::StartupError;
pub use state::{Lifecycle, LifecycleState};
