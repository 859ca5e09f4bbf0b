//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Configured host:port
//!     → listener.rs (bind, fatal on failure)
//!     → accept loop in http::server
//!     → connection.rs (idle timeout, tracking, graceful drain)
//!     → Hand off to HTTP layer
//!
//! Connection States:
//!     Active → Draining → Closed
//! ```
//!
//! # Design Decisions
//! - Each connection tracked for graceful shutdown
//! - Stragglers are aborted once the drain deadline passes

pub mod connection;
pub mod listener;

pub use connection::{ConnectionSet, ConnectionTracker, IdleTimeout};
pub use listener::{bind, BindError};
