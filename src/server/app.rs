//! Preview server.
//!
//! Serves the output directory alongside health, metrics and the refresh
//! stream, with signal handling and graceful shutdown.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Request, State};
use axum::response::{IntoResponse, Response};
use axum::Router;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use super::observability::spans;
use super::rest::create_rest_router;
use super::sse::create_refresh_router;
use crate::build::BuildOrchestrator;
use crate::config::Config;
use crate::Result;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host address to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

impl From<&Config> for ServerConfig {
    fn from(config: &Config) -> Self {
        Self {
            host: config.host.clone(),
            port: config.port,
        }
    }
}

/// State shared by every route.
#[derive(Debug)]
pub struct ServeState {
    pub orchestrator: Arc<BuildOrchestrator>,
    pub output_dir: PathBuf,
}

impl ServeState {
    #[must_use]
    pub fn new(orchestrator: Arc<BuildOrchestrator>) -> Self {
        let output_dir = orchestrator.context().output_dir.clone();
        Self {
            orchestrator,
            output_dir,
        }
    }
}

/// Application server.
pub struct App {
    config: ServerConfig,
    state: Arc<ServeState>,
}

impl App {
    #[must_use]
    pub fn new(config: ServerConfig, orchestrator: Arc<BuildOrchestrator>) -> Self {
        Self {
            config,
            state: Arc::new(ServeState::new(orchestrator)),
        }
    }

    /// Build the router with all endpoints.
    pub(crate) fn router(&self) -> Router {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        let output = Router::new()
            .fallback(serve_output)
            .with_state(Arc::clone(&self.state));

        Router::new()
            .merge(create_rest_router(Arc::clone(&self.state)))
            .merge(create_refresh_router(
                self.state.orchestrator.refresh().clone(),
            ))
            .merge(output)
            .layer(
                TraceLayer::new_for_http()
                    .make_span_with(|request: &axum::http::Request<_>| {
                        let request_id = request
                            .headers()
                            .get("x-request-id")
                            .and_then(|v| v.to_str().ok())
                            .unwrap_or("unknown");

                        spans::request_span(
                            request.method().as_str(),
                            &request.uri().to_string(),
                            request_id,
                        )
                    })
                    .on_response(
                        |response: &axum::response::Response,
                         latency: std::time::Duration,
                         _span: &tracing::Span| {
                            tracing::debug!(
                                status = %response.status(),
                                latency_ms = latency.as_millis(),
                                "Request completed"
                            );
                        },
                    ),
            )
            .layer(cors)
    }

    /// Run the server until a shutdown signal arrives or `cancel` fires.
    ///
    /// # Errors
    ///
    /// Returns an error if the address is invalid, the port cannot be bound,
    /// or the server fails while running.
    pub async fn run(self, cancel: CancellationToken) -> Result<()> {
        let addr: SocketAddr = format!("{}:{}", self.config.host, self.config.port)
            .parse()
            .map_err(|e| crate::Error::config(format!("invalid address: {e}")))?;

        let listener = tokio::net::TcpListener::bind(addr).await.map_err(|e| {
            crate::error::ServerError::BindFailed {
                address: addr.to_string(),
                reason: e.to_string(),
            }
        })?;

        tracing::info!(url = %format!("http://{addr}"), "Started preview server");

        axum::serve(listener, self.router())
            .with_graceful_shutdown(async move {
                tokio::select! {
                    () = shutdown_signal() => {}
                    () = cancel.cancelled() => {}
                }
            })
            .await
            .map_err(|e| crate::error::ServerError::Request(e.to_string()))?;

        tracing::info!("Server shut down gracefully");
        Ok(())
    }
}

/// Serve a file from the output directory. Extensionless page URLs
/// resolve to their `.html` artifact.
async fn serve_output(State(state): State<Arc<ServeState>>, mut request: Request) -> Response {
    if let Some(uri) = html_fallback(&state.output_dir, request.uri().path()).await {
        if let Ok(uri) = uri.parse() {
            *request.uri_mut() = uri;
        }
    }

    match ServeDir::new(&state.output_dir).oneshot(request).await {
        Ok(response) => response.map(Body::new).into_response(),
        Err(never) => match never {},
    }
}

async fn html_fallback(output_dir: &Path, uri_path: &str) -> Option<String> {
    let relative = uri_path.trim_start_matches('/');
    if relative.is_empty() || relative.ends_with('/') || relative.split('/').any(|s| s == "..") {
        return None;
    }
    if tokio::fs::metadata(output_dir.join(relative)).await.is_ok() {
        return None;
    }
    let page = format!("{relative}.html");
    tokio::fs::metadata(output_dir.join(&page))
        .await
        .ok()
        .filter(std::fs::Metadata::is_file)
        .map(|_| format!("/{page}"))
}

/// Wait for shutdown signal (SIGTERM or Ctrl+C).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, initiating shutdown");
        }
    }
}
