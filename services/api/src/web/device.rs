//! services/api/src/web/device.rs
//!
//! Axum handlers for the embedded client (the bedside sensor/button
//! device): the conditional config snapshot, the per-slot audio lookup,
//! the day's agenda, button events, and playback acknowledgements.

use crate::web::state::AppState;
use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
};
use caretaker_core::snapshot::SnapshotFetch;
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info, warn};
use utoipa::ToSchema;

/// Freshness directive for the polling device: serve fresh for a minute,
/// tolerate another 30 seconds while revalidating.
const CACHE_CONTROL: &str = "private, max-age=60, stale-while-revalidate=30";

type HandlerError = (StatusCode, String);

//=========================================================================================
// Config Snapshot (Conditional Fetch)
//=========================================================================================

/// Fetch the active-reminder snapshot with ETag revalidation.
#[utoipa::path(
    get,
    path = "/api/device/config",
    params(("If-None-Match" = Option<String>, Header, description = "Previously seen fingerprint")),
    responses(
        (status = 200, description = "Full snapshot body; ETag header carries the fingerprint"),
        (status = 304, description = "Snapshot unchanged; no body"),
        (status = 500, description = "No snapshot has ever been built and the rebuild failed")
    )
)]
pub async fn device_config_handler(
    State(app_state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Response {
    let if_none_match = headers
        .get(header::IF_NONE_MATCH)
        .and_then(|v| v.to_str().ok());

    match app_state.snapshot.get(if_none_match).await {
        Ok(SnapshotFetch::NotModified { fingerprint }) => (
            StatusCode::NOT_MODIFIED,
            [
                (header::ETAG, fingerprint),
                (header::CACHE_CONTROL, CACHE_CONTROL.to_string()),
            ],
        )
            .into_response(),
        Ok(SnapshotFetch::Modified { body, fingerprint }) => (
            StatusCode::OK,
            [
                (header::ETAG, fingerprint),
                (header::CACHE_CONTROL, CACHE_CONTROL.to_string()),
                (
                    header::CONTENT_TYPE,
                    "application/json; charset=utf-8".to_string(),
                ),
            ],
            body,
        )
            .into_response(),
        Err(e) => {
            error!("device config unavailable: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("config unavailable: {e}"),
            )
                .into_response()
        }
    }
}

//=========================================================================================
// Reminder Lookup Endpoints
//=========================================================================================

#[derive(Deserialize)]
pub struct NextAudioParams {
    pub subject: Option<String>,
    /// Time slot in "HH:MM".
    pub time: Option<String>,
}

/// Resolve the reminder audio to play at a given time slot.
#[utoipa::path(
    get,
    path = "/api/device/next-audio",
    params(
        ("subject" = String, Query, description = "The care recipient"),
        ("time" = String, Query, description = "Time slot, HH:MM")
    ),
    responses(
        (status = 200, description = "Highest-priority reminder for the slot"),
        (status = 404, description = "No reminder at this time"),
        (status = 400, description = "Missing subject or time")
    )
)]
pub async fn next_audio_handler(
    State(app_state): State<Arc<AppState>>,
    Query(params): Query<NextAudioParams>,
) -> Result<impl IntoResponse, HandlerError> {
    let (Some(subject), Some(time)) = (params.subject, params.time) else {
        return Err((
            StatusCode::BAD_REQUEST,
            "'subject' and 'time' parameters are required".to_string(),
        ));
    };

    let reminders = app_state
        .ledger
        .reminders_for_subject(&subject)
        .await
        .map_err(|e| {
            error!("reminder lookup failed: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "storage operation failed".to_string(),
            )
        })?;

    let mut candidates: Vec<_> = reminders
        .into_iter()
        .filter(|r| r.time_of_day.format("%H:%M").to_string() == time)
        .collect();
    // Ties on priority break toward the most recently created reminder.
    candidates.sort_by_key(|r| (r.priority, r.created_at));
    let Some(best) = candidates.pop() else {
        return Err((
            StatusCode::NOT_FOUND,
            "no reminder for this time".to_string(),
        ));
    };

    Ok(Json(json!({
        "reminder_id": best.id,
        "time": best.time_of_day.format("%H:%M").to_string(),
        "audio_url": best.audio_url,
        "message": best.message,
    })))
}

#[derive(Deserialize)]
pub struct AgendaParams {
    pub subject: Option<String>,
}

/// The remaining reminders for today, in time order.
#[utoipa::path(
    get,
    path = "/api/device/agenda",
    params(("subject" = String, Query, description = "The care recipient")),
    responses(
        (status = 200, description = "Today's remaining reminders"),
        (status = 400, description = "Missing subject")
    )
)]
pub async fn agenda_handler(
    State(app_state): State<Arc<AppState>>,
    Query(params): Query<AgendaParams>,
) -> Result<impl IntoResponse, HandlerError> {
    let subject = params.subject.filter(|s| !s.is_empty()).ok_or((
        StatusCode::BAD_REQUEST,
        "'subject' parameter is required".to_string(),
    ))?;

    // Reminder slots are local wall-clock values; "today" and "now" have to
    // be read in the recipient's timezone, not UTC.
    let now = crate::clock::local_now(app_state.config.local_tz);
    let today = now.date();
    let now_time = now.time();

    let reminders = app_state
        .ledger
        .reminders_for_subject(&subject)
        .await
        .map_err(|e| {
            error!("agenda lookup failed: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "storage operation failed".to_string(),
            )
        })?;

    let mut upcoming: Vec<_> = reminders
        .into_iter()
        .filter(|r| r.covers(today) && r.time_of_day >= now_time)
        .collect();
    upcoming.sort_by_key(|r| r.time_of_day);

    let entries: Vec<_> = upcoming
        .into_iter()
        .map(|r| {
            json!({
                "reminder_id": r.id,
                "time": r.time_of_day.format("%H:%M").to_string(),
                "audio_url": r.audio_url,
                "message": r.message,
            })
        })
        .collect();
    Ok(Json(json!({ "reminders": entries })))
}

//=========================================================================================
// Button Events and Acknowledgements
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct ButtonEvent {
    pub button: String,
    pub subject: Option<String>,
    pub timestamp: Option<String>,
}

fn button_message(button: &str, subject: &str) -> Option<String> {
    match button {
        "red" | "medical_emergency" => Some(format!(
            "MEDICAL EMERGENCY: {subject} pressed the red button. Check on them immediately."
        )),
        "blue" | "loneliness" => Some(format!(
            "EMOTIONAL ALERT: {subject} pressed the blue button. They need company."
        )),
        "yellow" | "hunger" => Some(format!(
            "MEAL REQUEST: {subject} pressed the yellow button. They are hungry."
        )),
        _ => None,
    }
}

/// Receive a button press and dispatch the matching SMS to the caretaker.
#[utoipa::path(
    post,
    path = "/api/device/event",
    request_body = ButtonEvent,
    responses((status = 200, description = "Event processed"))
)]
pub async fn device_event_handler(
    State(app_state): State<Arc<AppState>>,
    Json(event): Json<ButtonEvent>,
) -> impl IntoResponse {
    let subject = event.subject.as_deref().unwrap_or("the care recipient");

    if let Some(message) = button_message(&event.button, subject) {
        // SMS failure is reported to the caretaker's logs, not the device:
        // the button press itself was received either way.
        if let Err(e) = app_state.sms.send(&message).await {
            warn!(button = event.button, error = %e, "SMS dispatch failed");
        }
    } else {
        warn!(button = event.button, "unrecognized button in device event");
    }

    Json(json!({
        "status": "received",
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

#[derive(Deserialize, ToSchema)]
pub struct PlaybackAck {
    pub reminder_id: Option<String>,
    pub subject: Option<String>,
    pub timestamp: Option<String>,
}

/// Record that the device finished playing a reminder.
#[utoipa::path(
    post,
    path = "/api/device/ack",
    request_body = PlaybackAck,
    responses(
        (status = 200, description = "Acknowledgement recorded"),
        (status = 400, description = "Missing reminder_id or subject")
    )
)]
pub async fn ack_handler(Json(ack): Json<PlaybackAck>) -> Result<impl IntoResponse, HandlerError> {
    let reminder_id = ack.reminder_id.as_deref().unwrap_or("").trim();
    let subject = ack.subject.as_deref().unwrap_or("").trim();
    if reminder_id.is_empty() || subject.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "'reminder_id' and 'subject' are required".to_string(),
        ));
    }

    info!(reminder_id, subject, timestamp = ?ack.timestamp, "playback acknowledged");
    Ok(Json(json!({ "ok": true })))
}
