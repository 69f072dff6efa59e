//! Preview server and observability.
//!
//! This module provides:
//! - The axum app serving the output directory
//! - Health, status and metrics endpoints
//! - The refresh event stream for live reload
//! - Tracing setup and Prometheus metrics

mod app;
pub mod metrics;
pub mod observability;
mod rest;
mod sse;

pub use app::{App, ServeState, ServerConfig};
pub use metrics::init_metrics;
pub use observability::init_tracing;
pub use rest::{create_rest_router, HealthResponse};
pub use sse::create_refresh_router;
