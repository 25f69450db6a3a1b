//! services/api/src/web/sched.rs
//!
//! Axum handlers for scheduler observability and manual triggering.

use crate::web::alerts::pipeline_response;
use crate::web::state::AppState;
use axum::{
    extract::State,
    response::{IntoResponse, Json},
};
use caretaker_core::scheduler::TickOutcome;
use serde_json::json;
use std::sync::Arc;

/// Current scheduler registration and timing.
#[utoipa::path(
    get,
    path = "/api/scheduler/status",
    responses((status = 200, description = "Scheduler state"))
)]
pub async fn scheduler_status_handler(State(app_state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(app_state.scheduler.status())
}

/// Fire one tick immediately with the scheduler's bound configuration.
///
/// Shares the single-flight slot with scheduled ticks: if one is already
/// running the request is not queued behind it.
#[utoipa::path(
    post,
    path = "/api/scheduler/run-now",
    responses(
        (status = 201, description = "Alert produced and persisted"),
        (status = 200, description = "Normal reading, or skipped because a run was in flight"),
        (status = 502, description = "A pipeline stage failed")
    )
)]
pub async fn scheduler_run_now_handler(
    State(app_state): State<Arc<AppState>>,
) -> impl IntoResponse {
    match app_state.scheduler.run_once().await {
        TickOutcome::Completed(result) => pipeline_response(result).into_response(),
        TickOutcome::Skipped => Json(json!({
            "skipped": true,
            "detail": "a pipeline run is already in flight",
        }))
        .into_response(),
    }
}
