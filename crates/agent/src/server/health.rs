//! `GET /health`, per `spec.md` §6.3 — unauthenticated liveness probe.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;

use carla_wire::HealthResponse;

use super::AppState;

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        time_utc: chrono::Utc::now().to_rfc3339(),
        jobs: state.table.len(),
    })
}
