//! `POST /stop`, per `spec.md` §6.1.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;

use carla_wire::{StopRequest, StopResponse};

use crate::error::AgentError;
use crate::terminate;

use super::AppState;

pub async fn stop(
    State(state): State<Arc<AppState>>,
    Json(req): Json<StopRequest>,
) -> Result<Json<StopResponse>, AgentError> {
    let job = state
        .table
        .get(&req.job_id)
        .ok_or_else(|| AgentError::JobNotFound(req.job_id.clone()))?;

    terminate::terminate_job(&job, req.mode).await;
    state.table.remove(&req.job_id);

    Ok(Json(StopResponse { status: "sent".to_string(), job_id: req.job_id, mode: req.mode }))
}
