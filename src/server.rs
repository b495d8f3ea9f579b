//! Web server module for the exporter.
//!
//! Serves the Prometheus scrape endpoint plus a small JSON API.

use axum::{
    Json, Router,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tower_http::trace::{DefaultMakeSpan, TraceLayer};

use crate::collector::{Collector, TargetDevices};
use crate::exposition;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub collector: Arc<dyn Collector>,
}

impl AppState {
    pub fn new(collector: impl Collector) -> Self {
        Self {
            collector: Arc::new(collector),
        }
    }
}

/// Health check response.
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

/// Create the Axum router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .route("/healthz", get(healthz_handler))
        .route("/api/devices", get(devices_handler))
        .layer(TraceLayer::new_for_http().make_span_with(DefaultMakeSpan::default()))
        .with_state(state)
}

/// Scrape endpoint: one collection round per request.
async fn metrics_handler(State(state): State<AppState>) -> Response {
    let started = Instant::now();
    let observations = state.collector.collect().await;
    tracing::debug!(
        observations = observations.len(),
        elapsed = ?started.elapsed(),
        "Served scrape"
    );

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, exposition::CONTENT_TYPE)],
        exposition::render(&observations),
    )
        .into_response()
}

/// Liveness check.
async fn healthz_handler() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

/// Device listing per target.
async fn devices_handler(State(state): State<AppState>) -> Json<Vec<TargetDevices>> {
    Json(state.collector.enumerate_devices().await)
}
