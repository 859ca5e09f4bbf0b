//! HTTP server setup and lifecycle.
//!
//! # Responsibilities
//! - Create the Axum Router with the ping and heartbeat handlers
//! - Wire up middleware (request ID, tracing, panic recovery, timeout, CORS)
//! - Put admission control in front of `/v1/ping` only
//! - Accept connections with read, write and idle timeouts
//! - Stop accepting on shutdown, drain in-flight requests, force-close after the deadline

use std::time::Duration;

use axum::{
    extract::ConnectInfo,
    http::{header, Method, StatusCode},
    middleware,
    routing::get,
    Extension, Router,
};
use hyper::server::conn::http1;
use hyper_util::{
    rt::{TokioIo, TokioTimer},
    service::TowerToHyperService,
};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, watch};
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{Any, CorsLayer},
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::AppConfig;
use crate::http::health::{self, HEALTHZ_PATH};
use crate::http::ping::{self, PING_PATH};
use crate::http::request::{make_request_span, MakeRequestUuidV4};
use crate::lifecycle::{Lifecycle, LifecycleState, ShutdownOutcome};
use crate::net::{ConnectionSet, IdleTimeout};
use crate::security::{rate_limit_middleware, AdmissionController};

/// Pause after a failed accept so a persistent error (e.g. EMFILE) does not spin.
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(100);

/// HTTP server for the ping service.
pub struct HttpServer {
    router: Router,
    config: AppConfig,
    lifecycle: Lifecycle,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: AppConfig) -> Self {
        let admission = AdmissionController::from_config(&config.rate_limit);
        let router = build_router(&config, admission);
        Self::with_router(config, router)
    }

    /// Serve an arbitrary router with this server's connection handling and
    /// shutdown behaviour.
    pub fn with_router(config: AppConfig, router: Router) -> Self {
        Self {
            router,
            config,
            lifecycle: Lifecycle::new(),
        }
    }

    /// Watch the server move through its lifecycle states.
    pub fn lifecycle(&self) -> watch::Receiver<LifecycleState> {
        self.lifecycle.subscribe()
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Run the server on `listener` until `shutdown` fires, then drain.
    ///
    /// Errors only if the listener's local address cannot be read. Drain
    /// timeouts are reported through [`ShutdownOutcome::Forced`].
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<ShutdownOutcome, std::io::Error> {
        let addr = listener.local_addr()?;
        let timeouts = self.config.timeouts.clone();
        let router = self.router;

        let mut http = http1::Builder::new();
        http.timer(TokioTimer::new())
            .header_read_timeout(timeouts.read());

        let mut connections = ConnectionSet::new();

        self.lifecycle.transition(LifecycleState::Serving);
        tracing::info!(
            address = %addr,
            read_timeout = ?timeouts.read(),
            write_timeout = ?timeouts.write(),
            idle_timeout = ?timeouts.idle(),
            "HTTP server started"
        );

        loop {
            tokio::select! {
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        let service = TowerToHyperService::new(
                            ServiceBuilder::new()
                                .layer(Extension(ConnectInfo(peer)))
                                .timeout(timeouts.write())
                                .service(router.clone()),
                        );
                        let io = TokioIo::new(IdleTimeout::new(stream, timeouts.idle()));
                        connections.spawn(http.serve_connection(io, service), peer);
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Failed to accept connection");
                        tokio::time::sleep(ACCEPT_ERROR_BACKOFF).await;
                    }
                },
                signal = shutdown.recv() => {
                    if let Err(e) = signal {
                        tracing::warn!(error = %e, "Shutdown channel closed, stopping");
                    }
                    break;
                }
            }
        }

        drop(listener);
        self.lifecycle.transition(LifecycleState::ShuttingDown);
        tracing::info!("Shutdown signal received, no longer accepting connections");

        let outcome = connections.drain(timeouts.drain()).await;

        self.lifecycle.transition(LifecycleState::Stopped);
        match outcome {
            ShutdownOutcome::Graceful => tracing::info!("HTTP server stopped gracefully"),
            ShutdownOutcome::Forced { aborted } => {
                tracing::warn!(aborted_connections = aborted, "HTTP server stopped after forced close")
            }
        }
        Ok(outcome)
    }
}

/// Build the Axum router with all middleware layers.
///
/// Admission control wraps the `GET /v1/ping` handler only. Other methods on
/// the path get 405 without spending a token, and `/healthz` is always served.
pub fn build_router(config: &AppConfig, admission: AdmissionController) -> Router {
    let ping_route = get(ping::get_ping)
        .route_layer(middleware::from_fn_with_state(admission, rate_limit_middleware));

    let routes = Router::new()
        .route(HEALTHZ_PATH, get(health::heartbeat))
        .route(PING_PATH, ping_route);

    with_middleware(routes, config.timeouts.request())
}

/// Wrap `routes` in the shared middleware stack. Requests running past
/// `request_timeout` are answered with 504.
fn with_middleware(routes: Router, request_timeout: Duration) -> Router {
    let layers = ServiceBuilder::new()
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV4))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http().make_span_with(make_request_span))
        .layer(CatchPanicLayer::new())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::GATEWAY_TIMEOUT,
            request_timeout,
        ))
        .layer(cors_layer());

    routes.layer(layers)
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::ACCEPT, header::AUTHORIZATION, header::CONTENT_TYPE])
        .max_age(Duration::from_secs(300))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::request::X_REQUEST_ID;
    use crate::security::RateLimiter;
    use axum::{body::Body, http::Request};
    use tower::ServiceExt;

    fn router_with_burst(burst: u32) -> Router {
        let config = AppConfig::new("127.0.0.1:0");
        let admission =
            AdmissionController::limited(RateLimiter::new(burst, Duration::from_secs(3600)));
        build_router(&config, admission)
    }

    async fn send(router: &Router, path: &str) -> (StatusCode, String) {
        let request = Request::builder().uri(path).body(Body::empty()).unwrap();
        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn ping_returns_pong() {
        let router = router_with_burst(5);
        let request = Request::builder().uri(PING_PATH).body(Body::empty()).unwrap();
        let response = router.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], br#"{"result":"pong"}"#);
    }

    #[tokio::test]
    async fn exhausted_bucket_returns_429_without_payload() {
        let router = router_with_burst(2);
        assert_eq!(send(&router, PING_PATH).await.0, StatusCode::OK);
        assert_eq!(send(&router, PING_PATH).await.0, StatusCode::OK);

        let (status, body) = send(&router, PING_PATH).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert!(!body.is_empty());
        assert!(!body.contains("pong"));
    }

    #[tokio::test]
    async fn healthz_ignores_rate_limit() {
        let router = router_with_burst(1);
        assert_eq!(send(&router, PING_PATH).await.0, StatusCode::OK);
        assert_eq!(send(&router, PING_PATH).await.0, StatusCode::TOO_MANY_REQUESTS);

        for _ in 0..10 {
            let (status, body) = send(&router, HEALTHZ_PATH).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body, ".");
        }
    }

    #[tokio::test]
    async fn unknown_paths_do_not_consume_tokens() {
        let router = router_with_burst(1);
        assert_eq!(send(&router, "/v1/nope").await.0, StatusCode::NOT_FOUND);
        assert_eq!(send(&router, "/v1/ping/").await.0, StatusCode::NOT_FOUND);
        assert_eq!(send(&router, PING_PATH).await.0, StatusCode::OK);
    }

    #[tokio::test]
    async fn other_methods_on_ping_do_not_consume_tokens() {
        let router = router_with_burst(1);
        for method in [Method::POST, Method::PUT, Method::DELETE] {
            let request = Request::builder()
                .method(method)
                .uri(PING_PATH)
                .body(Body::empty())
                .unwrap();
            let response = router.clone().oneshot(request).await.unwrap();
            assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        }

        assert_eq!(send(&router, PING_PATH).await.0, StatusCode::OK);
        assert_eq!(send(&router, PING_PATH).await.0, StatusCode::TOO_MANY_REQUESTS);
    }

    #[tokio::test]
    async fn slow_request_gets_gateway_timeout() {
        let routes = Router::new().route(
            "/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                "late"
            }),
        );
        let router = with_middleware(routes, Duration::from_millis(100));

        let (status, body) = send(&router, "/slow").await;
        assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
        assert!(!body.contains("late"));
    }

    #[tokio::test]
    async fn unlimited_admission_never_rejects() {
        let config = AppConfig::new("127.0.0.1:0");
        let router = build_router(&config, AdmissionController::unlimited());
        for _ in 0..50 {
            assert_eq!(send(&router, PING_PATH).await.0, StatusCode::OK);
        }
    }

    #[tokio::test]
    async fn request_id_is_generated_or_propagated() {
        let router = router_with_burst(5);

        let request = Request::builder().uri(HEALTHZ_PATH).body(Body::empty()).unwrap();
        let response = router.clone().oneshot(request).await.unwrap();
        assert!(response.headers().contains_key(X_REQUEST_ID));

        let request = Request::builder()
            .uri(HEALTHZ_PATH)
            .header(X_REQUEST_ID, "client-chosen")
            .body(Body::empty())
            .unwrap();
        let response = router.oneshot(request).await.unwrap();
        assert_eq!(response.headers()[X_REQUEST_ID], "client-chosen");
    }

    #[tokio::test]
    async fn lifecycle_starts_in_starting() {
        let server = HttpServer::new(AppConfig::new("127.0.0.1:0"));
        assert_eq!(*server.lifecycle().borrow(), LifecycleState::Starting);
        assert_eq!(server.config().serve_address, "127.0.0.1:0");
    }
}
