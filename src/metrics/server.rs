//! HTTP server for the Prometheus metrics endpoint.

use super::collector::{CollectError, Collector};
use super::exposition::CONTENT_TYPE;
use crate::upstream::UpstreamError;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tower_http::trace::TraceLayer;

/// Errors that can occur during metrics server operations.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind to address: {0}")]
    Bind(#[from] std::io::Error),

    #[error("server error: {0}")]
    Server(String),
}

/// Configuration for the metrics server.
#[derive(Debug, Clone)]
pub struct MetricsServerConfig {
    /// Address to bind the server to.
    pub bind_addr: SocketAddr,
}

impl Default for MetricsServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: ([127, 0, 0, 1], 5555).into(),
        }
    }
}

/// HTTP server exposing `/metrics`.
///
/// The collector is shared read-only; each request runs its own
/// collection, so concurrent scrapes never see each other's data.
pub struct MetricsServer {
    config: MetricsServerConfig,
    collector: Arc<Collector>,
}

impl MetricsServer {
    /// Creates a new metrics server.
    pub fn new(config: MetricsServerConfig, collector: Collector) -> Self {
        Self {
            config,
            collector: Arc::new(collector),
        }
    }

    /// Builds the router. Exposed for tests and embedding.
    pub fn router(&self) -> Router {
        router(Arc::clone(&self.collector))
    }

    /// Starts the HTTP server.
    ///
    /// This method runs the server until `shutdown` resolves.
    pub async fn run(
        self,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> Result<(), ServerError> {
        let app = self.router();
        let listener = tokio::net::TcpListener::bind(self.config.bind_addr).await?;

        tracing::info!(
            addr = %self.config.bind_addr,
            mountpoints = self.collector.mountpoints().len(),
            "Metrics server listening"
        );

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| ServerError::Server(e.to_string()))?;

        tracing::info!("Metrics server stopped");
        Ok(())
    }
}

fn router(collector: Arc<Collector>) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .route("/health", get(health_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(collector)
}

/// Handler for the /metrics endpoint.
async fn metrics_handler(State(collector): State<Arc<Collector>>) -> Response {
    match collector.render().await {
        Ok(body) => (StatusCode::OK, [(header::CONTENT_TYPE, CONTENT_TYPE)], body).into_response(),
        Err(e) => {
            let status = error_status(&e);
            tracing::error!(error = %e, status = status.as_u16(), "Scrape failed");
            (
                status,
                [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
                format!("Failed to collect metrics: {}\n", e),
            )
                .into_response()
        }
    }
}

/// Handler for the /health endpoint.
async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// Status code returned for a failed scrape.
pub fn error_status(error: &CollectError) -> StatusCode {
    match error {
        CollectError::CredentialsUnavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
        CollectError::Upstream(e) if e.is_timeout() => StatusCode::GATEWAY_TIMEOUT,
        CollectError::Upstream(UpstreamError::InvalidUrl(_) | UpstreamError::Client(_)) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
        CollectError::Upstream(_) => StatusCode::BAD_GATEWAY,
    }
}
