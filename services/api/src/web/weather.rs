//! services/api/src/web/weather.rs
//!
//! Direct passthrough to the weather port, for clients that want the raw
//! reading without triggering the alert pipeline.

use crate::web::state::AppState;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::warn;

#[derive(Deserialize)]
pub struct WeatherParams {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// Current temperature at the coordinates, defaulting to the configured
/// home location.
#[utoipa::path(
    get,
    path = "/api/weather/current",
    params(
        ("latitude" = Option<f64>, Query, description = "Defaults to the configured home location"),
        ("longitude" = Option<f64>, Query, description = "Defaults to the configured home location")
    ),
    responses(
        (status = 200, description = "Current temperature in degrees Celsius"),
        (status = 502, description = "Weather upstream failed")
    )
)]
pub async fn current_weather_handler(
    State(app_state): State<Arc<AppState>>,
    Query(params): Query<WeatherParams>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let latitude = params
        .latitude
        .unwrap_or(app_state.config.scheduler_latitude);
    let longitude = params
        .longitude
        .unwrap_or(app_state.config.scheduler_longitude);

    let temperature = app_state
        .weather
        .current_temperature(latitude, longitude)
        .await
        .map_err(|e| {
            warn!("weather lookup failed: {e}");
            (
                StatusCode::BAD_GATEWAY,
                "weather lookup failed".to_string(),
            )
        })?;

    Ok(Json(json!({
        "temperature": temperature,
        "units": "celsius",
        "latitude": latitude,
        "longitude": longitude,
    })))
}
