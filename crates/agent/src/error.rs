//! Agent error kinds and their HTTP disposition, per `spec.md` §7.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error("missing bearer token")]
    AuthMissing,
    #[error("invalid bearer token")]
    AuthInvalid,
    #[error("job_id '{0}' already exists")]
    DuplicateJob(String),
    #[error("job_id '{0}' not found")]
    JobNotFound(String),
    #[error("failed to start job: {0}")]
    SpawnFailed(String),
    #[error("cmd must not be empty")]
    EmptyCommand,
}

impl IntoResponse for AgentError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AgentError::AuthMissing => (StatusCode::UNAUTHORIZED, self.to_string()),
            AgentError::AuthInvalid => (StatusCode::FORBIDDEN, self.to_string()),
            AgentError::DuplicateJob(_) => (StatusCode::CONFLICT, self.to_string()),
            AgentError::JobNotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            AgentError::SpawnFailed(_) => (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()),
            AgentError::EmptyCommand => (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}
