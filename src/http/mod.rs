//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection (net)
//!     → server.rs (hyper http1 connection, write timeout, middleware stack)
//!     → request.rs (request ID, tracing span)
//!     → /healthz → health.rs
//!     → /v1/ping → security::rate_limit → ping.rs
//!     → response.rs (JSON encoding)
//!     → Send to client
//! ```

pub mod health;
pub mod ping;
pub mod request;
pub mod response;
pub mod server;

pub use ping::PingResponse;
pub use request::{MakeRequestUuidV4, X_REQUEST_ID};
pub use server::{build_router, HttpServer};
