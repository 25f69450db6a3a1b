//! services/api/src/web/reminders.rs
//!
//! Axum handlers for reminder intake and management: a natural-language
//! phrase goes through extraction, date derivation, speech synthesis, and
//! blob publication before a ReminderRecord is persisted.

use crate::web::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use caretaker_core::domain::ReminderRecord;
use caretaker_core::schedule_dates::derive_schedule;
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{error, warn};
use utoipa::ToSchema;
use uuid::Uuid;

type HandlerError = (StatusCode, String);

fn upstream(stage: &str, e: impl std::fmt::Display) -> HandlerError {
    warn!("reminder intake failed at {stage}: {e}");
    (
        StatusCode::BAD_GATEWAY,
        format!("reminder creation failed at {stage}"),
    )
}

//=========================================================================================
// Intake
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct CreateReminderRequest {
    /// Free-text caretaker instruction, e.g.
    /// "Olga takes ibuprofen at 8 a.m. for 4 days".
    pub phrase: String,
}

/// Create a reminder from a natural-language phrase.
#[utoipa::path(
    post,
    path = "/api/reminders",
    request_body = CreateReminderRequest,
    responses(
        (status = 201, description = "Reminder created"),
        (status = 400, description = "Empty phrase or unusable extraction"),
        (status = 502, description = "Extraction, synthesis, or publication failed")
    )
)]
pub async fn create_reminder_handler(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<CreateReminderRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    if payload.phrase.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "'phrase' must not be empty".to_string(),
        ));
    }

    let draft = app_state
        .extraction
        .extract(&payload.phrase)
        .await
        .map_err(|e| upstream("extraction", e))?;

    // Slot times are local wall-clock values, so the "has today's slot
    // already passed" decision runs on the local clock.
    let (start_date, end_date) = derive_schedule(
        crate::clock::local_now(app_state.config.local_tz),
        draft.time_of_day,
        &draft.weekdays,
        draft.duration_days,
    )
    .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;

    let audio = app_state
        .tts
        .synthesize(&draft.message)
        .await
        .map_err(|e| upstream("synthesis", e))?;

    let artifact_name = format!(
        "{}_{}.wav",
        draft.substance,
        draft.time_of_day.format("%H%M")
    );
    let audio_url = app_state
        .blobs
        .publish(&audio, &artifact_name)
        .await
        .map_err(|e| upstream("publication", e))?;

    let record = ReminderRecord {
        id: Uuid::nil(),
        subject: draft.subject,
        time_of_day: draft.time_of_day,
        substance: draft.substance,
        message: draft.message,
        audio_url,
        frequency: draft.frequency,
        weekdays: draft.weekdays,
        duration_days: draft.duration_days,
        start_date,
        end_date,
        active: true,
        priority: draft.priority,
        created_at: Utc::now(),
        deactivated_at: None,
    };
    let id = app_state
        .ledger
        .append_reminder(record.clone())
        .await
        .map_err(|e| upstream("persistence", e))?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "id": id,
            "subject": record.subject,
            "time_of_day": record.time_of_day.format("%H:%M").to_string(),
            "substance": record.substance,
            "audio_url": record.audio_url,
            "start_date": record.start_date,
            "end_date": record.end_date,
        })),
    ))
}

//=========================================================================================
// Listing and Deactivation
//=========================================================================================

#[derive(Deserialize)]
pub struct ListRemindersParams {
    pub subject: Option<String>,
}

/// List a subject's active reminders.
#[utoipa::path(
    get,
    path = "/api/reminders",
    params(("subject" = String, Query, description = "The care recipient")),
    responses(
        (status = 200, description = "The subject's active reminders"),
        (status = 400, description = "Missing subject")
    )
)]
pub async fn list_reminders_handler(
    State(app_state): State<Arc<AppState>>,
    Query(params): Query<ListRemindersParams>,
) -> Result<impl IntoResponse, HandlerError> {
    let subject = params.subject.filter(|s| !s.is_empty()).ok_or((
        StatusCode::BAD_REQUEST,
        "'subject' parameter is required".to_string(),
    ))?;

    let reminders = app_state
        .ledger
        .reminders_for_subject(&subject)
        .await
        .map_err(|e| {
            error!("reminder listing failed: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "storage operation failed".to_string(),
            )
        })?;

    let entries: Vec<_> = reminders
        .into_iter()
        .map(|r| {
            json!({
                "id": r.id,
                "subject": r.subject,
                "time_of_day": r.time_of_day.format("%H:%M").to_string(),
                "substance": r.substance,
                "message": r.message,
                "audio_url": r.audio_url,
                "weekdays": r.weekdays,
                "start_date": r.start_date,
                "end_date": r.end_date,
            })
        })
        .collect();
    Ok(Json(json!({ "total": entries.len(), "reminders": entries })))
}

#[derive(Deserialize)]
pub struct DeactivateParams {
    pub subject: Option<String>,
}

/// Deactivate one reminder. The record is kept, flagged inactive.
#[utoipa::path(
    delete,
    path = "/api/reminders/{id}",
    params(
        ("id" = Uuid, Path, description = "The reminder id"),
        ("subject" = String, Query, description = "The owning care recipient")
    ),
    responses(
        (status = 200, description = "Reminder deactivated"),
        (status = 404, description = "No such reminder"),
        (status = 400, description = "Missing subject")
    )
)]
pub async fn deactivate_reminder_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Query(params): Query<DeactivateParams>,
) -> Result<impl IntoResponse, HandlerError> {
    let subject = params.subject.filter(|s| !s.is_empty()).ok_or((
        StatusCode::BAD_REQUEST,
        "'subject' parameter is required".to_string(),
    ))?;

    match app_state.ledger.deactivate_reminder(id, &subject).await {
        Ok(()) => Ok(Json(json!({ "deactivated": true, "id": id }))),
        Err(caretaker_core::ports::PortError::NotFound(_)) => Err((
            StatusCode::NOT_FOUND,
            "no reminder with that id for this subject".to_string(),
        )),
        Err(e) => {
            error!("deactivation failed: {e}");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                "storage operation failed".to_string(),
            ))
        }
    }
}
