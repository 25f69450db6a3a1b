//! services/api/src/web/rest.rs
//!
//! Contains the master definition for the OpenAPI specification. The
//! handlers themselves live in the sibling modules, grouped by surface.

use utoipa::OpenApi;

use crate::web::{alerts, device, reminders, sched, weather};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        alerts::generate_alert_handler,
        alerts::latest_alert_handler,
        alerts::list_alerts_handler,
        alerts::delete_alerts_handler,
        alerts::delete_alert_by_id_handler,
        reminders::create_reminder_handler,
        reminders::list_reminders_handler,
        reminders::deactivate_reminder_handler,
        device::device_config_handler,
        device::next_audio_handler,
        device::agenda_handler,
        device::device_event_handler,
        device::ack_handler,
        sched::scheduler_status_handler,
        sched::scheduler_run_now_handler,
        weather::current_weather_handler,
    ),
    components(
        schemas(
            alerts::GenerateAlertRequest,
            alerts::AlertView,
            reminders::CreateReminderRequest,
            device::ButtonEvent,
            device::PlaybackAck,
        )
    ),
    tags(
        (name = "Caretaker Reminder API", description = "Spoken reminders, clothing alerts, and the device-facing endpoints behind them.")
    )
)]
pub struct ApiDoc;
