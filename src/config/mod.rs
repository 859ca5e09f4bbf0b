//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! <dir>/app.toml
//!     → loader.rs (read, deserialize, apply SERVE_ADDRESS env override)
//!     → validation.rs (semantic checks)
//!     → AppConfig (validated, immutable)
//!     → passed explicitly to the server and its subsystems
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - Only the bind address is required; every other field has a default
//! - Each failure (empty path, missing file, unmarshal, validation) is a distinct error

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::AppConfig;
pub use schema::ObservabilityConfig;
pub use schema::RateLimitConfig;
pub use schema::TimeoutConfig;
