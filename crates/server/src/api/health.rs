use actroute_router::MetricsSnapshot;
use axum::Json;
use axum::extract::State;
use serde::Serialize;

use super::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    /// Number of routes in the dispatch table.
    pub routes: usize,
    pub metrics: MetricsSnapshot,
}

/// `GET /health`: liveness plus dispatch counters.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        routes: state.dispatcher.table().len(),
        metrics: state.dispatcher.metrics().snapshot(),
    })
}
