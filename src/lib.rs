//! Rate-limited ping service.
//!
//! A single `GET /v1/ping` endpoint behind a token-bucket admission
//! controller, a `/healthz` heartbeat, and a server lifecycle with
//! signal-driven graceful shutdown.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod security;

pub use config::AppConfig;
pub use http::HttpServer;
pub use lifecycle::{Shutdown, ShutdownOutcome};
