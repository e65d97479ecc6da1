//! Bearer-token authentication, per `spec.md` §4.1 and §6.2.
//!
//! Every request except `/health` must carry `Authorization: Bearer
//! <token>` matching the configured token. If the agent is still running
//! the `change-me` placeholder, auth is bypassed entirely — each bypassed
//! request is logged at `warn` so an operator notices a misconfigured
//! deployment quickly.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use tracing::warn;

use crate::error::AgentError;
use super::AppState;

pub async fn require_bearer_token(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Result<Response, AgentError> {
    if state.config.auth_disabled() {
        warn!("authentication disabled: agent is running with the default placeholder token");
        return Ok(next.run(req).await);
    }

    let presented = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    match presented {
        None => Err(AgentError::AuthMissing),
        Some(token) if token == state.config.token => Ok(next.run(req).await),
        Some(_) => Err(AgentError::AuthInvalid),
    }
}
