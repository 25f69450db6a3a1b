//! services/api/src/adapters/weather.rs
//!
//! This module contains the adapter for the OpenWeather current-conditions
//! API. It implements the `WeatherService` port from the `core` crate.

use async_trait::async_trait;
use caretaker_core::ports::{PortError, PortResult, WeatherService};
use serde::Deserialize;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements the `WeatherService` port using OpenWeather.
#[derive(Clone)]
pub struct OpenWeatherAdapter {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl OpenWeatherAdapter {
    /// Creates a new `OpenWeatherAdapter`. The `client` is expected to carry
    /// the process-wide upstream timeout.
    pub fn new(client: reqwest::Client, base_url: String, api_key: String) -> Self {
        Self {
            client,
            base_url,
            api_key,
        }
    }
}

#[derive(Deserialize)]
struct WeatherResponse {
    main: WeatherMain,
}

#[derive(Deserialize)]
struct WeatherMain {
    temp: f64,
}

//=========================================================================================
// `WeatherService` Trait Implementation
//=========================================================================================

#[async_trait]
impl WeatherService for OpenWeatherAdapter {
    /// Returns the current temperature in degrees Celsius at the coordinates.
    async fn current_temperature(&self, latitude: f64, longitude: f64) -> PortResult<f64> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("lat", latitude.to_string()),
                ("lon", longitude.to_string()),
                ("appid", self.api_key.clone()),
                ("units", "metric".to_string()),
            ])
            .send()
            .await
            .map_err(|e| PortError::Upstream(e.to_string()))?
            .error_for_status()
            .map_err(|e| PortError::Upstream(e.to_string()))?;

        let body: WeatherResponse = response
            .json()
            .await
            .map_err(|e| PortError::Upstream(format!("malformed weather payload: {e}")))?;
        Ok(body.main.temp)
    }
}
