//! `POST /stop_all`, per `spec.md` §4.1 "Concurrency": snapshot the table,
//! release the table lock, then terminate every job concurrently — never
//! hold the table mutex across a terminate call.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;

use carla_wire::{StopAllResponse, TerminateMode};

use crate::error::AgentError;
use crate::terminate;

use super::AppState;

#[derive(Debug, Deserialize)]
pub struct StopAllQuery {
    #[serde(default)]
    pub mode: TerminateMode,
}

pub async fn stop_all(
    State(state): State<Arc<AppState>>,
    Query(query): Query<StopAllQuery>,
) -> Result<Json<StopAllResponse>, AgentError> {
    let jobs = state.table.snapshot();

    let terminations = jobs.iter().map(|job| {
        let job = job.clone();
        let job_id = job.job_id.clone();
        let mode = query.mode;
        async move {
            terminate::terminate_job(&job, mode).await;
            job_id
        }
    });
    let stopped_ids: Vec<String> = futures::future::join_all(terminations).await;

    for job_id in stopped_ids {
        state.table.remove(&job_id);
    }

    Ok(Json(StopAllResponse { status: "sent".to_string(), mode: query.mode }))
}
