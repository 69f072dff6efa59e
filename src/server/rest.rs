//! Health, metrics and status endpoints.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use prometheus::{Encoder, TextEncoder};
use serde::Serialize;

use super::app::ServeState;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub last_build: Option<String>,
}

/// Create REST API router.
pub fn create_rest_router(state: Arc<ServeState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics))
        .route("/api/v1/status", get(status))
        .with_state(state)
}

/// Health check endpoint. Unhealthy until the first build completes.
async fn health_check(State(state): State<Arc<ServeState>>) -> impl IntoResponse {
    let last_build = state.orchestrator.state().await.last_build_at;

    let (status_code, status) = if last_build.is_some() {
        (StatusCode::OK, "healthy")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "building")
    };

    let response = HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        last_build: last_build.map(|t| t.to_rfc3339()),
    };

    tracing::debug!(status = ?status_code, "Health check");
    (status_code, Json(response))
}

/// Prometheus metrics endpoint.
async fn metrics() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    let mut buffer = Vec::new();
    match encoder.encode(&metric_families, &mut buffer) {
        Ok(()) => {
            tracing::trace!("Metrics encoded successfully");
            (
                StatusCode::OK,
                [(
                    axum::http::header::CONTENT_TYPE,
                    "text/plain; charset=utf-8",
                )],
                buffer,
            )
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode metrics");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [(
                    axum::http::header::CONTENT_TYPE,
                    "text/plain; charset=utf-8",
                )],
                b"Failed to encode metrics".to_vec(),
            )
        }
    }
}

/// Session statistics.
async fn status(State(state): State<Arc<ServeState>>) -> impl IntoResponse {
    let orchestrator = &state.orchestrator;
    let session = orchestrator.state().await;

    let graphs: serde_json::Map<String, serde_json::Value> = session
        .graphs
        .iter()
        .map(|(name, graph)| {
            (
                name.clone(),
                serde_json::json!({
                    "nodes": graph.node_count(),
                    "edges": graph.edge_count(),
                }),
            )
        })
        .collect();

    Json(serde_json::json!({
        "version": env!("CARGO_PKG_VERSION"),
        "fast_rebuild": orchestrator.fast_rebuild(),
        "last_build": session.last_build_at.map(|t| t.to_rfc3339()),
        "refreshes": orchestrator.refresh().count(),
        "stats": {
            "content_files": session.store.len(),
            "tracked_assets": session.tracked_assets.len(),
            "known_slugs": session.known_slugs.len(),
            "graphs": graphs,
        }
    }))
}
