//! Request identification.
//!
//! # Responsibilities
//! - Generate a UUID v4 request ID for every request that lacks one
//! - Echo the ID back on the response
//! - Attach the ID and the client address to the request's tracing span
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - A client-supplied `x-request-id` is kept, not replaced
//! - The client address prefers `X-Real-IP`, then the first `X-Forwarded-For`
//!   hop, then the TCP peer. Header values that are not IP addresses are ignored.

use std::net::{IpAddr, SocketAddr};

use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{HeaderValue, Request},
};
use tower_http::request_id::{MakeRequestId, RequestId};
use tracing::Span;
use uuid::Uuid;

pub const X_REQUEST_ID: &str = "x-request-id";
pub const X_REAL_IP: &str = "x-real-ip";
pub const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// Generates request IDs from random UUIDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeRequestUuidV4;

impl MakeRequestId for MakeRequestUuidV4 {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// Read the request ID header, falling back to `unknown`.
pub fn request_id<B>(request: &Request<B>) -> &str {
    request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
}

fn header_str<'a, B>(request: &'a Request<B>, name: &str) -> Option<&'a str> {
    request.headers().get(name).and_then(|v| v.to_str().ok())
}

/// Resolve the address of the client behind any proxies.
pub fn client_ip<B>(request: &Request<B>) -> Option<IpAddr> {
    let real_ip = header_str(request, X_REAL_IP).and_then(|v| v.trim().parse::<IpAddr>().ok());
    let forwarded = || {
        header_str(request, X_FORWARDED_FOR)
            .and_then(|v| v.split(',').next())
            .and_then(|v| v.trim().parse::<IpAddr>().ok())
    };
    let peer = || {
        request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip())
    };

    real_ip.or_else(forwarded).or_else(peer)
}

/// Span for `TraceLayer` carrying method, path, request ID and client address.
pub fn make_request_span(request: &Request<Body>) -> Span {
    let span = tracing::info_span!(
        "request",
        method = %request.method(),
        path = %request.uri().path(),
        request_id = %request_id(request),
        client_ip = tracing::field::Empty
    );
    if let Some(ip) = client_ip(request) {
        span.record("client_ip", tracing::field::display(ip));
    }
    span
}
