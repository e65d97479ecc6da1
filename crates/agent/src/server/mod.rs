//! HTTP surface, one module per endpoint, mirroring the teacher's
//! one-file-per-subcommand layout.

mod auth;
mod health;
mod start;
mod status;
mod stop;
mod stop_all;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::config::AgentConfig;
use crate::table::JobTable;

pub struct AppState {
    pub table: Arc<JobTable>,
    pub config: AgentConfig,
}

pub fn build_router(state: Arc<AppState>) -> Router {
    let authenticated = Router::new()
        .route("/start", post(start::start))
        .route("/stop", post(stop::stop))
        .route("/stop_all", post(stop_all::stop_all))
        .route("/status/:job_id", get(status::status_one))
        .route("/status", get(status::status_all))
        .route_layer(axum::middleware::from_fn_with_state(state.clone(), auth::require_bearer_token));

    Router::new()
        .route("/health", get(health::health))
        .merge(authenticated)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
