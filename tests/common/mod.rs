//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::time::Duration;

use ping_server::lifecycle::{LifecycleState, Shutdown, ShutdownOutcome};
use ping_server::{AppConfig, HttpServer};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// A server running on an ephemeral local port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub lifecycle: watch::Receiver<LifecycleState>,
    pub handle: JoinHandle<std::io::Result<ShutdownOutcome>>,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Trigger shutdown and wait for the server task to finish.
    #[allow(dead_code)]
    pub async fn stop(self) -> ShutdownOutcome {
        self.shutdown.trigger();
        self.handle.await.unwrap().unwrap()
    }
}

/// Config bound to an ephemeral port with default knobs.
#[allow(dead_code)]
pub fn local_config() -> AppConfig {
    AppConfig::new("127.0.0.1:0")
}

/// Bind an ephemeral port, run `server` on it and wait until it is serving.
pub async fn spawn_server(server: HttpServer) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let mut lifecycle = server.lifecycle();

    let handle = tokio::spawn(server.run(listener, server_shutdown));
    lifecycle
        .wait_for(|state| *state == LifecycleState::Serving)
        .await
        .unwrap();

    TestServer {
        addr,
        shutdown,
        lifecycle,
        handle,
    }
}

/// Client that bypasses any system proxy and never hangs a test forever.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .timeout(Duration::from_secs(30))
        .build()
        .unwrap()
}
