//! The `/v1/ping` endpoint.

use std::time::Instant;

use axum::response::Response;
use serde::{Deserialize, Serialize};

use crate::http::response;
use crate::observability::metrics;

pub const PING_PATH: &str = "/v1/ping";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PingResponse {
    pub result: String,
}

impl PingResponse {
    pub fn pong() -> Self {
        Self {
            result: "pong".to_string(),
        }
    }
}

/// Answer `{"result":"pong"}`. Admission has already been decided by the
/// rate limit middleware in front of this route.
pub async fn get_ping() -> Response {
    let start = Instant::now();
    tracing::info!("Ping handler called");

    let response = response::json(&PingResponse::pong());
    metrics::record_request(PING_PATH, response.status().as_u16(), start);
    response
}
