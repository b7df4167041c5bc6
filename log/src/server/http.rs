//! HTTP server implementation for the commit log.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tokio::signal;

use super::config::LogServerConfig;
use super::handlers::{
    AppState, handle_commit_offsets, handle_healthy, handle_list_committed_offsets,
    handle_metrics, handle_poll, handle_ready, handle_rpc, handle_send,
};
use super::metrics::Metrics;
use super::middleware::{MetricsLayer, TracingLayer};
use crate::CommitLog;

/// Builds the router with all routes and middleware.
pub fn router(log: Arc<CommitLog>, metrics: Arc<Metrics>) -> Router {
    let state = AppState {
        log,
        metrics: metrics.clone(),
    };

    Router::new()
        .route("/api/v1/log/send", post(handle_send))
        .route("/api/v1/log/poll", post(handle_poll))
        .route("/api/v1/log/commit_offsets", post(handle_commit_offsets))
        .route(
            "/api/v1/log/list_committed_offsets",
            post(handle_list_committed_offsets),
        )
        .route("/api/v1/rpc", post(handle_rpc))
        .route("/metrics", get(handle_metrics))
        .route("/-/healthy", get(handle_healthy))
        .route("/-/ready", get(handle_ready))
        .layer(TracingLayer::new())
        .layer(MetricsLayer::new(metrics))
        .with_state(state)
}

/// HTTP server for the log service.
pub struct LogServer {
    log: Arc<CommitLog>,
    config: LogServerConfig,
}

impl LogServer {
    /// Create a new log server.
    pub fn new(log: Arc<CommitLog>, config: LogServerConfig) -> Self {
        Self { log, config }
    }

    /// Run the HTTP server until SIGINT or SIGTERM, then close the log.
    pub async fn run(self) -> std::io::Result<()> {
        let app = router(self.log.clone(), Arc::new(Metrics::new()));

        let addr = SocketAddr::from(([0, 0, 0, 0], self.config.port));
        tracing::info!("Starting Commit Log HTTP server on {}", addr);

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shut down gracefully");
        if let Err(err) = self.log.close().await {
            tracing::error!(error = %err, "failed to close log");
        }
        Ok(())
    }
}

/// Listen for SIGTERM (K8s pod termination) and SIGINT (Ctrl+C).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received SIGINT, starting graceful shutdown"),
        _ = terminate => tracing::info!("Received SIGTERM, starting graceful shutdown"),
    }
}
