//! Process lifecycle: bind, serve, and drain.
//!
//! ```text
//! Initializing -> Serving -> Draining -> Stopped
//! ```
//!
//! The first SIGINT/SIGTERM, or an explicit [`Lifecycle::shutdown`], starts
//! the drain. The listener stops accepting, in-flight requests get the grace
//! period to finish, and whatever is still open after that is abandoned.

use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::ServerError;
use crate::server::GitHubMcpServer;
use crate::transport::TransportBinding;

pub const DEFAULT_SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Initializing,
    Serving,
    Draining,
    Stopped,
}

/// How serving ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownOutcome {
    /// Every in-flight request finished within the grace period.
    Clean,
    /// The grace period elapsed and open connections were dropped.
    Forced,
}

/// Owns the shutdown token and the observable server state.
///
/// Clones share the same state, so a signal task and the serving task can
/// each hold one.
#[derive(Debug, Clone)]
pub struct Lifecycle {
    shutdown: CancellationToken,
    state: Arc<watch::Sender<LifecycleState>>,
    grace: Duration,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new(DEFAULT_SHUTDOWN_GRACE)
    }
}

impl Lifecycle {
    pub fn new(grace: Duration) -> Self {
        let (state, _) = watch::channel(LifecycleState::Initializing);
        Self {
            shutdown: CancellationToken::new(),
            state: Arc::new(state),
            grace,
        }
    }

    pub fn state(&self) -> LifecycleState {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<LifecycleState> {
        self.state.subscribe()
    }

    pub fn grace(&self) -> Duration {
        self.grace
    }

    /// Token cancelled when draining starts.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Request a drain. Calling this again, or after the server stopped,
    /// does nothing.
    pub fn shutdown(&self) {
        if self.shutdown.is_cancelled() {
            debug!("Shutdown already requested");
            return;
        }
        info!("Shutdown requested");
        self.shutdown.cancel();
    }

    /// Start draining on the first SIGINT or SIGTERM.
    ///
    /// The task exits on its own once shutdown has been requested by any
    /// other path.
    pub fn watch_signals(&self) -> JoinHandle<()> {
        let lifecycle = self.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = shutdown_signal() => lifecycle.shutdown(),
                _ = lifecycle.shutdown.cancelled() => {}
            }
        })
    }

    fn transition(&self, to: LifecycleState) {
        self.state.send_modify(|state| {
            if *state != to {
                debug!(from = ?*state, to = ?to, "Lifecycle state changed");
                *state = to;
            }
        });
    }

    /// Bind `addr` and serve `binding` until shutdown.
    pub async fn run(
        &self,
        addr: SocketAddr,
        binding: &TransportBinding,
        server: GitHubMcpServer,
    ) -> Result<ShutdownOutcome, ServerError> {
        let listener = match bind(addr).await {
            Ok(listener) => listener,
            Err(e) => {
                self.transition(LifecycleState::Stopped);
                return Err(e);
            }
        };
        self.serve_binding(listener, binding, server).await
    }

    /// Serve `binding` on an already bound listener.
    pub async fn serve_binding(
        &self,
        listener: TcpListener,
        binding: &TransportBinding,
        server: GitHubMcpServer,
    ) -> Result<ShutdownOutcome, ServerError> {
        if let Ok(addr) = listener.local_addr() {
            info!(%addr, transport = %binding, "GitHub MCP server listening");
        }
        let router = binding.router(server, &self.shutdown);
        self.serve(listener, router).await
    }

    /// Serve `router` until shutdown, then drain within the grace period.
    pub async fn serve(
        &self,
        listener: TcpListener,
        router: Router,
    ) -> Result<ShutdownOutcome, ServerError> {
        let shutdown = self.shutdown.clone();
        let serve = axum::serve(listener, router)
            .with_graceful_shutdown(shutdown.clone().cancelled_owned())
            .into_future();
        tokio::pin!(serve);
        self.transition(LifecycleState::Serving);

        tokio::select! {
            result = &mut serve => {
                self.transition(LifecycleState::Stopped);
                return result
                    .map(|()| ShutdownOutcome::Clean)
                    .map_err(ServerError::Serve);
            }
            _ = shutdown.cancelled() => {}
        }

        self.transition(LifecycleState::Draining);
        info!(grace = ?self.grace, "Draining in-flight requests");

        let outcome = match tokio::time::timeout(self.grace, &mut serve).await {
            Ok(Ok(())) => ShutdownOutcome::Clean,
            Ok(Err(e)) => {
                self.transition(LifecycleState::Stopped);
                return Err(ServerError::Serve(e));
            }
            Err(_) => {
                warn!(
                    grace = ?self.grace,
                    "Grace period elapsed; dropping remaining connections"
                );
                ShutdownOutcome::Forced
            }
        };

        self.transition(LifecycleState::Stopped);
        info!(outcome = ?outcome, "Server stopped");
        Ok(outcome)
    }
}

/// Bind the listener. Failure here is fatal.
pub async fn bind(addr: SocketAddr) -> Result<TcpListener, ServerError> {
    TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::ListenerBind { addr, source })
}

/// Resolves on the first SIGINT, or SIGTERM on unix.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("SIGINT received, initiating shutdown"),
        _ = terminate => info!("SIGTERM received, initiating shutdown"),
    }
}
