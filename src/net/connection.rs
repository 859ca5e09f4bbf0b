//! Connection lifecycle tracking.
//!
//! # Responsibilities
//! - Track live connections (Active → Draining → Closed)
//! - Generate unique connection IDs for tracing
//! - Close connections that sit idle past the configured timeout
//! - Drain every connection on shutdown, aborting stragglers after a deadline

use std::fmt::Display;
use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use hyper_util::server::graceful::{GracefulConnection, GracefulShutdown};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::task::JoinSet;
use tokio::time::{Instant, Sleep};

use crate::lifecycle::ShutdownOutcome;

/// Global atomic counter for connection IDs.
/// Using relaxed ordering is sufficient since we only need uniqueness, not synchronization.
static CONNECTION_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Generate a new unique connection ID.
    pub fn new() -> Self {
        Self(CONNECTION_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Counts live connections.
#[derive(Debug, Clone, Default)]
pub struct ConnectionTracker {
    active_count: Arc<AtomicU64>,
}

impl ConnectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new active connection. Returns a guard that decrements on drop.
    pub fn track(&self) -> ConnectionGuard {
        self.active_count.fetch_add(1, Ordering::SeqCst);
        ConnectionGuard {
            active_count: Arc::clone(&self.active_count),
            id: ConnectionId::new(),
        }
    }

    /// Get current active connection count.
    pub fn active_count(&self) -> u64 {
        self.active_count.load(Ordering::SeqCst)
    }
}

/// Guard that tracks a connection's lifetime.
/// Decrements active count when dropped.
#[derive(Debug)]
pub struct ConnectionGuard {
    active_count: Arc<AtomicU64>,
    id: ConnectionId,
}

impl ConnectionGuard {
    /// Get this connection's ID.
    pub fn id(&self) -> ConnectionId {
        self.id
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.active_count.fetch_sub(1, Ordering::SeqCst);
        tracing::trace!(connection_id = %self.id, "Connection closed");
    }
}

/// Every connection task spawned by the accept loop.
///
/// Connections are registered with a [`GracefulShutdown`] so that
/// [`ConnectionSet::drain`] can ask them to finish their in-flight request
/// and close.
pub struct ConnectionSet {
    graceful: GracefulShutdown,
    tasks: JoinSet<()>,
    tracker: ConnectionTracker,
}

impl ConnectionSet {
    pub fn new() -> Self {
        Self {
            graceful: GracefulShutdown::new(),
            tasks: JoinSet::new(),
            tracker: ConnectionTracker::new(),
        }
    }

    /// Drive `conn` on its own task.
    pub fn spawn<C>(&mut self, conn: C, peer: SocketAddr)
    where
        C: GracefulConnection + Send + 'static,
        C::Error: Display + Send + 'static,
    {
        let guard = self.tracker.track();
        let conn = self.graceful.watch(conn);

        tracing::debug!(connection_id = %guard.id(), peer_addr = %peer, "Connection accepted");

        self.tasks.spawn(async move {
            if let Err(e) = conn.await {
                tracing::debug!(connection_id = %guard.id(), error = %e, "Connection ended with error");
            }
            drop(guard);
        });

        // Reap finished tasks so the set does not grow with every connection served.
        while self.tasks.try_join_next().is_some() {}
    }

    /// Number of connections still open.
    pub fn active(&self) -> u64 {
        self.tracker.active_count()
    }

    /// Signal every connection to close once its in-flight request is done and
    /// wait up to `timeout` for them. Connections still open at the deadline
    /// are aborted.
    pub async fn drain(self, timeout: Duration) -> ShutdownOutcome {
        let Self {
            graceful,
            mut tasks,
            tracker,
        } = self;
        tracing::info!(
            open_connections = tracker.active_count(),
            timeout = ?timeout,
            "Draining connections"
        );

        match tokio::time::timeout(timeout, graceful.shutdown()).await {
            Ok(()) => {
                while tasks.join_next().await.is_some() {}
                tracing::info!("All connections drained");
                ShutdownOutcome::Graceful
            }
            Err(_) => {
                let aborted = tracker.active_count();
                tracing::error!(
                    aborted_connections = aborted,
                    timeout = ?timeout,
                    "Drain timeout elapsed, forcing connections closed"
                );
                tasks.shutdown().await;
                ShutdownOutcome::Forced { aborted }
            }
        }
    }
}

impl Default for ConnectionSet {
    fn default() -> Self {
        Self::new()
    }
}

/// Stream wrapper that fails with `TimedOut` once no bytes have moved in
/// either direction for `timeout`.
#[derive(Debug)]
pub struct IdleTimeout<S> {
    inner: S,
    timeout: Duration,
    deadline: Pin<Box<Sleep>>,
}

impl<S> IdleTimeout<S> {
    pub fn new(inner: S, timeout: Duration) -> Self {
        Self {
            inner,
            timeout,
            deadline: Box::pin(tokio::time::sleep(timeout)),
        }
    }

    fn touch(&mut self) {
        let next = Instant::now() + self.timeout;
        self.deadline.as_mut().reset(next);
    }

    /// Map a pending inner poll to an error once the deadline has passed.
    fn pending_or_expired<T>(&mut self, cx: &mut Context<'_>) -> Poll<io::Result<T>> {
        match self.deadline.as_mut().poll(cx) {
            Poll::Ready(()) => Poll::Ready(Err(io::Error::new(
                io::ErrorKind::TimedOut,
                "connection idle timeout",
            ))),
            Poll::Pending => Poll::Pending,
        }
    }
}

impl<S: AsyncRead + Unpin> AsyncRead for IdleTimeout<S> {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        match Pin::new(&mut this.inner).poll_read(cx, buf) {
            Poll::Ready(result) => {
                this.touch();
                Poll::Ready(result)
            }
            Poll::Pending => this.pending_or_expired(cx),
        }
    }
}

impl<S: AsyncWrite + Unpin> AsyncWrite for IdleTimeout<S> {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        let this = self.get_mut();
        match Pin::new(&mut this.inner).poll_write(cx, buf) {
            Poll::Ready(result) => {
                this.touch();
                Poll::Ready(result)
            }
            Poll::Pending => this.pending_or_expired(cx),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        match Pin::new(&mut this.inner).poll_flush(cx) {
            Poll::Ready(result) => Poll::Ready(result),
            Poll::Pending => this.pending_or_expired(cx),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_shutdown(cx)
    }

    fn poll_write_vectored(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        bufs: &[io::IoSlice<'_>],
    ) -> Poll<io::Result<usize>> {
        let this = self.get_mut();
        match Pin::new(&mut this.inner).poll_write_vectored(cx, bufs) {
            Poll::Ready(result) => {
                this.touch();
                Poll::Ready(result)
            }
            Poll::Pending => this.pending_or_expired(cx),
        }
    }

    fn is_write_vectored(&self) -> bool {
        self.inner.is_write_vectored()
    }
}
