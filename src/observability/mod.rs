//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Handlers, middleware and lifecycle produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters, histograms via the metrics facade)
//!
//! Consumers:
//!     → stdout (fmt layer)
//!     → Prometheus scrape endpoint (optional)
//! ```
//!
//! # Design Decisions
//! - Request ID flows through every request span
//! - Metrics are cheap (atomic increments) and off unless enabled

pub mod logging;
pub mod metrics;
