//! services/api/src/web/alerts.rs
//!
//! Axum handlers for the clothing-alert endpoints: on-demand pipeline
//! triggering plus the query and delete operations over the alert ledger.

use crate::web::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use caretaker_core::domain::{AlertCategory, AlertRecord, PipelineConfig};
use caretaker_core::pipeline::PipelineResult;
use caretaker_core::ports::PortError;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::error;
use utoipa::ToSchema;
use uuid::Uuid;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

/// Request payload for an on-demand pipeline run.
#[derive(Deserialize, ToSchema)]
pub struct GenerateAlertRequest {
    /// The care recipient; falls back to the scheduler's bound subject.
    pub subject: Option<String>,
    /// Target average temperature in degrees Celsius. Required.
    pub target_average: Option<f64>,
    /// Tolerance margin; must be > 0 when given.
    pub margin: Option<f64>,
    pub include_temperature: Option<bool>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Deserialize)]
pub struct AlertFilterParams {
    pub subject: Option<String>,
    pub category: Option<String>,
    pub limit: Option<usize>,
}

/// One alert in a response body.
#[derive(Serialize, ToSchema)]
pub struct AlertView {
    pub id: Uuid,
    pub subject: String,
    pub category: String,
    pub temperature: f64,
    pub target_average: f64,
    pub margin: f64,
    pub message: String,
    pub audio_url: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<AlertRecord> for AlertView {
    fn from(a: AlertRecord) -> Self {
        Self {
            id: a.id,
            subject: a.subject,
            category: a.category.to_string(),
            temperature: a.current_temperature,
            target_average: a.target_average,
            margin: a.margin,
            message: a.message,
            audio_url: a.audio_url,
            created_at: a.created_at,
        }
    }
}

type HandlerError = (StatusCode, String);

fn parse_category(raw: Option<&str>) -> Result<Option<AlertCategory>, HandlerError> {
    match raw {
        None => Ok(None),
        Some(s) => AlertCategory::parse(s).map(Some).ok_or_else(|| {
            (
                StatusCode::BAD_REQUEST,
                "category must be 'below-range' or 'above-range'".to_string(),
            )
        }),
    }
}

fn internal(e: PortError) -> HandlerError {
    error!("ledger operation failed: {e}");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "storage operation failed".to_string(),
    )
}

/// Maps a pipeline outcome onto the transport contract: 201 when an alert
/// was produced, 200 for a normal reading, 502 when any stage failed.
pub fn pipeline_response(result: PipelineResult) -> impl IntoResponse {
    let status = match &result {
        PipelineResult::Produced { .. } => StatusCode::CREATED,
        PipelineResult::Normal { .. } => StatusCode::OK,
        PipelineResult::Failed { .. } => StatusCode::BAD_GATEWAY,
    };
    (status, Json(result))
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// Trigger one alert evaluation for a subject.
#[utoipa::path(
    post,
    path = "/api/alerts/generate",
    request_body = GenerateAlertRequest,
    responses(
        (status = 201, description = "Alert produced and persisted"),
        (status = 200, description = "Temperature within the normal range; no alert"),
        (status = 400, description = "Missing or invalid parameters"),
        (status = 502, description = "An upstream stage failed; the failing stage is named in the body")
    )
)]
pub async fn generate_alert_handler(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<GenerateAlertRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let target_average = payload.target_average.ok_or_else(|| {
        (
            StatusCode::BAD_REQUEST,
            "'target_average' is required and must be numeric".to_string(),
        )
    })?;

    let defaults = &app_state.config;
    let config = PipelineConfig {
        subject: payload
            .subject
            .unwrap_or_else(|| defaults.scheduler_subject.clone()),
        target_average,
        margin: payload.margin.unwrap_or(defaults.scheduler_margin),
        include_temperature: payload
            .include_temperature
            .unwrap_or(defaults.scheduler_include_temperature),
        latitude: payload.latitude.unwrap_or(defaults.scheduler_latitude),
        longitude: payload.longitude.unwrap_or(defaults.scheduler_longitude),
    };
    config
        .validate()
        .map_err(|detail| (StatusCode::BAD_REQUEST, detail))?;

    let result = app_state.pipeline.produce(&config).await;
    Ok(pipeline_response(result))
}

/// Fetch the most recent alert for a subject, optionally by category.
#[utoipa::path(
    get,
    path = "/api/alerts/latest",
    params(
        ("subject" = String, Query, description = "The care recipient"),
        ("category" = Option<String>, Query, description = "'below-range' or 'above-range'")
    ),
    responses(
        (status = 200, description = "Most recent matching alert", body = AlertView),
        (status = 404, description = "No alert matches"),
        (status = 400, description = "Missing subject or invalid category")
    )
)]
pub async fn latest_alert_handler(
    State(app_state): State<Arc<AppState>>,
    Query(params): Query<AlertFilterParams>,
) -> Result<impl IntoResponse, HandlerError> {
    let subject = params.subject.as_deref().filter(|s| !s.is_empty()).ok_or((
        StatusCode::BAD_REQUEST,
        "'subject' parameter is required".to_string(),
    ))?;
    let category = parse_category(params.category.as_deref())?;

    match app_state
        .ledger
        .latest_alert(subject, category)
        .await
        .map_err(internal)?
    {
        Some(alert) => Ok((StatusCode::OK, Json(AlertView::from(alert)))),
        None => Err((
            StatusCode::NOT_FOUND,
            "no alerts for this subject with that criterion".to_string(),
        )),
    }
}

/// List alerts, newest first. The limit is clamped to 1..=200.
#[utoipa::path(
    get,
    path = "/api/alerts",
    params(
        ("subject" = Option<String>, Query, description = "Filter by care recipient"),
        ("category" = Option<String>, Query, description = "'below-range' or 'above-range'"),
        ("limit" = Option<usize>, Query, description = "Maximum records, clamped to 1..=200")
    ),
    responses(
        (status = 200, description = "Matching alerts plus total count"),
        (status = 400, description = "Invalid category value")
    )
)]
pub async fn list_alerts_handler(
    State(app_state): State<Arc<AppState>>,
    Query(params): Query<AlertFilterParams>,
) -> Result<impl IntoResponse, HandlerError> {
    let category = parse_category(params.category.as_deref())?;
    let alerts = app_state
        .ledger
        .list_alerts(params.subject.as_deref(), category, params.limit.unwrap_or(20))
        .await
        .map_err(internal)?;

    let views: Vec<AlertView> = alerts.into_iter().map(AlertView::from).collect();
    Ok(Json(json!({ "total": views.len(), "alerts": views })))
}

/// Delete every alert for a subject, optionally by category.
#[utoipa::path(
    delete,
    path = "/api/alerts",
    params(
        ("subject" = String, Query, description = "The care recipient"),
        ("category" = Option<String>, Query, description = "'below-range' or 'above-range'")
    ),
    responses(
        (status = 200, description = "Count of deleted alerts"),
        (status = 400, description = "Missing subject or invalid category")
    )
)]
pub async fn delete_alerts_handler(
    State(app_state): State<Arc<AppState>>,
    Query(params): Query<AlertFilterParams>,
) -> Result<impl IntoResponse, HandlerError> {
    let subject = params.subject.as_deref().filter(|s| !s.is_empty()).ok_or((
        StatusCode::BAD_REQUEST,
        "'subject' parameter is required".to_string(),
    ))?;
    let category = parse_category(params.category.as_deref())?;

    let deleted = app_state
        .ledger
        .delete_alerts(subject, category)
        .await
        .map_err(internal)?;
    Ok(Json(json!({ "deleted": deleted })))
}

/// Delete one alert by id. The owning partition is resolved internally.
#[utoipa::path(
    delete,
    path = "/api/alerts/{id}",
    params(("id" = Uuid, Path, description = "The alert id")),
    responses(
        (status = 200, description = "Alert deleted"),
        (status = 404, description = "No such alert")
    )
)]
pub async fn delete_alert_by_id_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HandlerError> {
    let deleted = app_state
        .ledger
        .delete_alert_by_id(id)
        .await
        .map_err(internal)?;
    if !deleted {
        return Err((
            StatusCode::NOT_FOUND,
            "no alert with that id".to_string(),
        ));
    }
    Ok(Json(json!({ "deleted": true, "id": id })))
}
