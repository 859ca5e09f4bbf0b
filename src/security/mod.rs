//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request for /v1/ping:
//!     → rate_limit.rs (shared token bucket, 429 on exhaustion)
//!     → Pass to ping handler
//! ```
//!
//! # Design Decisions
//! - One bucket for the whole endpoint, not per client
//! - The bucket is always built from config; disabling it is an explicit policy
//! - Rejection is cheap and never reaches the handler

pub mod rate_limit;

pub use rate_limit::{rate_limit_middleware, AdmissionController, RateLimiter};
