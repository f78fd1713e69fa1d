//! Health and metrics endpoints

use axum::{
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Json},
};
use serde::Serialize;

use crate::web::AppState;

#[derive(Debug, Serialize)]
pub struct HealthInfo {
    pub status: &'static str,
    pub version: &'static str,
    /// Whether private sightings are being persisted
    pub database: bool,
}

/// GET /health
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(HealthInfo {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        database: state.store.is_available(),
    })
}

/// GET /metrics - Prometheus text format
pub async fn render_metrics(State(state): State<AppState>) -> impl IntoResponse {
    match &state.metrics {
        Some(handle) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render(),
        )
            .into_response(),
        None => (StatusCode::NOT_FOUND, "Metrics not enabled").into_response(),
    }
}
