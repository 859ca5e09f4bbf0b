//! Admission control for the ping endpoint.
//!
//! A single token bucket shared by every request task. The bucket starts
//! full, gains one token per refill interval and never holds more than the
//! burst capacity.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::config::RateLimitConfig;
use crate::observability::metrics;

/// Body sent with every 429.
pub const RATE_LIMIT_EXCEEDED: &str = "rate limit exceeded";

/// A simple token bucket.
#[derive(Debug)]
struct TokenBucket {
    tokens: f64,
    last_update: Instant,
}

impl TokenBucket {
    fn new(capacity: f64, now: Instant) -> Self {
        Self {
            tokens: capacity,
            last_update: now,
        }
    }

    fn try_acquire(&mut self, now: Instant, capacity: f64, refill_interval: Duration) -> bool {
        // Callers read the clock before taking the lock, so `now` may trail `last_update`.
        let elapsed = now.saturating_duration_since(self.last_update);
        let refill = elapsed.as_secs_f64() / refill_interval.as_secs_f64();

        self.tokens = (self.tokens + refill).min(capacity);
        self.last_update = self.last_update.max(now);

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

/// Token bucket rate limiter shared across request tasks.
#[derive(Debug)]
pub struct RateLimiter {
    bucket: Mutex<TokenBucket>,
    capacity: f64,
    refill_interval: Duration,
}

impl RateLimiter {
    /// Create a full bucket holding `burst` tokens, refilled one token every `refill_interval`.
    pub fn new(burst: u32, refill_interval: Duration) -> Self {
        let capacity = f64::from(burst.max(1));
        Self {
            bucket: Mutex::new(TokenBucket::new(capacity, Instant::now())),
            capacity,
            refill_interval: refill_interval.max(Duration::from_nanos(1)),
        }
    }

    /// Consume one token if available. Returns whether the caller is admitted.
    pub fn try_admit(&self) -> bool {
        self.try_admit_at(Instant::now())
    }

    pub(crate) fn try_admit_at(&self, now: Instant) -> bool {
        let mut bucket = self.bucket.lock().expect("rate limiter mutex poisoned");
        bucket.try_acquire(now, self.capacity, self.refill_interval)
    }

    /// Whole tokens currently in the bucket, without refilling.
    pub fn available(&self) -> u32 {
        let bucket = self.bucket.lock().expect("rate limiter mutex poisoned");
        bucket.tokens.floor() as u32
    }

    pub fn burst(&self) -> u32 {
        self.capacity as u32
    }
}

/// Decides whether a request may reach the ping handler.
///
/// `Unlimited` is an explicit policy selected by `rate_limit.enabled = false`.
#[derive(Debug, Clone)]
pub enum AdmissionController {
    Limited(Arc<RateLimiter>),
    Unlimited,
}

impl AdmissionController {
    pub fn limited(limiter: RateLimiter) -> Self {
        Self::Limited(Arc::new(limiter))
    }

    pub fn unlimited() -> Self {
        Self::Unlimited
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        if config.enabled {
            Self::limited(RateLimiter::new(config.burst, config.refill_interval()))
        } else {
            tracing::warn!("Rate limiting disabled, admitting every request");
            Self::unlimited()
        }
    }

    pub fn try_admit(&self) -> bool {
        match self {
            Self::Limited(limiter) => limiter.try_admit(),
            Self::Unlimited => true,
        }
    }
}

/// Middleware that gates the wrapped route on [`AdmissionController::try_admit`].
pub async fn rate_limit_middleware(
    State(admission): State<AdmissionController>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if admission.try_admit() {
        return next.run(request).await;
    }

    tracing::info!(path = %request.uri().path(), "Rate limit exceeded");
    metrics::record_rate_limited(request.uri().path());
    (StatusCode::TOO_MANY_REQUESTS, RATE_LIMIT_EXCEEDED).into_response()
}
