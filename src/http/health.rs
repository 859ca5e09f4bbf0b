//! Liveness heartbeat.
//!
//! `/healthz` sits outside admission control, so it answers 200 even while
//! the ping bucket is empty.

use axum::http::{header, StatusCode};
use axum::response::IntoResponse;

pub const HEALTHZ_PATH: &str = "/healthz";

pub async fn heartbeat() -> impl IntoResponse {
    (StatusCode::OK, [(header::CONTENT_TYPE, "text/plain")], ".")
}
