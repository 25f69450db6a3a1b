//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The
//! `.env` file is used for local development. Missing credentials for a
//! required collaborator fail here, at startup, not at first use.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

fn required(name: &str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::MissingVar(name.to_string()))
}

fn parse_var<T: std::str::FromStr>(name: &str, raw: String) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    raw.parse::<T>()
        .map_err(|e| ConfigError::InvalidValue(name.to_string(), e.to_string()))
}

fn optional_parsed<T: std::str::FromStr>(name: &str, default: T) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => parse_var(name, raw),
        Err(_) => Ok(default),
    }
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub database_url: String,
    pub log_level: Level,

    // --- OpenAI (extraction + speech synthesis) ---
    pub openai_api_key: String,
    pub extraction_model: String,
    pub tts_voice: String,

    // --- Blob storage ---
    /// Container base URL, e.g. `https://account.blob.core.windows.net/audio`.
    pub blob_container_url: String,
    /// SAS query string granting write access to the container.
    pub blob_sas_token: String,

    // --- Weather lookup ---
    pub weather_api_key: String,
    pub weather_base_url: String,

    // --- SMS gateway ---
    pub sms_account_sid: String,
    pub sms_auth_token: String,
    pub sms_from_number: String,
    pub sms_to_number: String,

    /// Timezone of the care recipient's home. Reminder time slots are local
    /// wall-clock values, so "what time is it" questions go through this,
    /// never through UTC.
    pub local_tz: chrono_tz::Tz,

    // --- Pipeline / scheduler defaults ---
    pub scratch_dir: PathBuf,
    pub scheduler_enabled: bool,
    pub scheduler_interval_minutes: u64,
    pub scheduler_subject: String,
    pub scheduler_target_average: f64,
    pub scheduler_margin: f64,
    pub scheduler_include_temperature: bool,
    pub scheduler_latitude: f64,
    pub scheduler_longitude: f64,

    // --- Device snapshot cache ---
    pub snapshot_ttl: Duration,

    /// Timeout applied to every outbound collaborator call.
    pub upstream_timeout: Duration,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for
    /// development, but this is skipped in test environments to ensure
    /// tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        // --- Server and database settings ---
        let bind_address_str =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let bind_address = parse_var::<SocketAddr>("BIND_ADDRESS", bind_address_str)?;

        let database_url = required("DATABASE_URL")?;

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Required collaborator credentials ---
        let openai_api_key = required("OPENAI_API_KEY")?;
        let blob_container_url = required("BLOB_CONTAINER_URL")?;
        let blob_sas_token = required("BLOB_SAS_TOKEN")?;
        let weather_api_key = required("OPENWEATHER_API_KEY")?;
        let sms_account_sid = required("SMS_ACCOUNT_SID")?;
        let sms_auth_token = required("SMS_AUTH_TOKEN")?;
        let sms_from_number = required("SMS_FROM_NUMBER")?;
        let sms_to_number = required("SMS_TO_NUMBER")?;

        // --- Adapter-specific settings with defaults ---
        let extraction_model =
            std::env::var("EXTRACTION_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string());
        let tts_voice = std::env::var("TTS_VOICE").unwrap_or_else(|_| "nova".to_string());
        let weather_base_url = std::env::var("OPENWEATHER_BASE_URL")
            .unwrap_or_else(|_| "https://api.openweathermap.org/data/2.5/weather".to_string());
        let scratch_dir = std::env::var("AUDIO_SCRATCH_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./audio_scratch"));
        let local_tz = optional_parsed("LOCAL_TZ", chrono_tz::America::Costa_Rica)?;

        // --- Scheduler defaults (overridable per deployment) ---
        let scheduler_enabled = optional_parsed("SCHED_ENABLED", true)?;
        let scheduler_interval_minutes = optional_parsed("SCHED_EVERY_MIN", 15u64)?;
        let scheduler_subject =
            std::env::var("SCHED_SUBJECT").unwrap_or_else(|_| "Gabriel".to_string());
        let scheduler_target_average = optional_parsed("SCHED_TARGET_AVERAGE", 25.0f64)?;
        let scheduler_margin = optional_parsed("SCHED_MARGIN", 3.0f64)?;
        let scheduler_include_temperature = optional_parsed("SCHED_INCLUDE_TEMP", true)?;
        let scheduler_latitude = optional_parsed("SCHED_LAT", 9.9281f64)?;
        let scheduler_longitude = optional_parsed("SCHED_LON", -84.0907f64)?;

        let snapshot_ttl = Duration::from_secs(optional_parsed("SNAPSHOT_TTL_SECS", 60u64)?);
        let upstream_timeout =
            Duration::from_secs(optional_parsed("UPSTREAM_TIMEOUT_SECS", 10u64)?);

        Ok(Self {
            bind_address,
            database_url,
            log_level,
            openai_api_key,
            extraction_model,
            tts_voice,
            blob_container_url,
            blob_sas_token,
            weather_api_key,
            weather_base_url,
            sms_account_sid,
            sms_auth_token,
            sms_from_number,
            sms_to_number,
            local_tz,
            scratch_dir,
            scheduler_enabled,
            scheduler_interval_minutes,
            scheduler_subject,
            scheduler_target_average,
            scheduler_margin,
            scheduler_include_temperature,
            scheduler_latitude,
            scheduler_longitude,
            snapshot_ttl,
            upstream_timeout,
        })
    }
}
