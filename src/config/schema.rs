//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from the config file.
//! Only `SERVE_ADDRESS` is required; every table has defaults.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration for the ping server.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    /// Bind address (e.g., "127.0.0.1:4343").
    #[serde(rename = "SERVE_ADDRESS")]
    pub serve_address: String,

    /// Token bucket in front of `/v1/ping`.
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Connection, request and shutdown timeouts.
    #[serde(default)]
    pub timeouts: TimeoutConfig,

    /// Metrics settings.
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl AppConfig {
    /// Build a config bound to `serve_address` with every other knob at its default.
    pub fn new(serve_address: impl Into<String>) -> Self {
        Self {
            serve_address: serve_address.into(),
            rate_limit: RateLimitConfig::default(),
            timeouts: TimeoutConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// When false, `/v1/ping` is served without admission control.
    pub enabled: bool,

    /// Burst capacity (maximum tokens in the bucket).
    pub burst: u32,

    /// One token is added every `refill_interval_secs` seconds.
    pub refill_interval_secs: u64,
}

impl RateLimitConfig {
    pub fn refill_interval(&self) -> Duration {
        Duration::from_secs(self.refill_interval_secs)
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            burst: 5,
            refill_interval_secs: 12,
        }
    }
}

/// Timeout configuration, all values in seconds.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Time allowed to read a request head.
    pub read_secs: u64,

    /// Time allowed to produce a response once the request is read.
    pub write_secs: u64,

    /// Idle connection timeout.
    pub idle_secs: u64,

    /// Global per-request timeout enforced by the router.
    pub request_secs: u64,

    /// Bounded wait for in-flight connections during shutdown.
    pub drain_secs: u64,
}

impl TimeoutConfig {
    pub fn read(&self) -> Duration {
        Duration::from_secs(self.read_secs)
    }

    pub fn write(&self) -> Duration {
        Duration::from_secs(self.write_secs)
    }

    pub fn idle(&self) -> Duration {
        Duration::from_secs(self.idle_secs)
    }

    pub fn request(&self) -> Duration {
        Duration::from_secs(self.request_secs)
    }

    pub fn drain(&self) -> Duration {
        Duration::from_secs(self.drain_secs)
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            read_secs: 15,
            write_secs: 15,
            idle_secs: 60,
            request_secs: 60,
            drain_secs: 15,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
