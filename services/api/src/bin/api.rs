//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{
        HttpBlobAdapter, OpenAiExtractionAdapter, OpenAiTtsAdapter, OpenWeatherAdapter,
        PgDocumentStore, TwilioSmsAdapter,
    },
    config::Config,
    error::ApiError,
    web::{alerts, device, reminders, sched, weather, ApiDoc, AppState},
};
use async_openai::{
    config::OpenAIConfig,
    types::{SpeechModel, Voice},
    Client,
};
use axum::{
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        Method,
    },
    routing::{delete, get, post},
    Router,
};
use caretaker_core::domain::PipelineConfig;
use caretaker_core::ledger::Ledger;
use caretaker_core::pipeline::AlertPipeline;
use caretaker_core::scheduler::AlertScheduler;
use caretaker_core::snapshot::SnapshotCache;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Connect to Database & Run Migrations ---
    info!("Connecting to database...");
    let db_pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;
    let store = Arc::new(PgDocumentStore::new(db_pool.clone()));
    info!("Running database migrations...");
    store.run_migrations().await?;
    info!("Database migrations complete.");

    // --- 3. Initialize Service Adapters ---
    let openai_config = OpenAIConfig::new().with_api_key(config.openai_api_key.clone());
    let openai_client = Client::with_config(openai_config);

    let tts_voice = match config.tts_voice.to_lowercase().as_str() {
        "alloy" => Voice::Alloy,
        "echo" => Voice::Echo,
        "fable" => Voice::Fable,
        "onyx" => Voice::Onyx,
        "nova" => Voice::Nova,
        "shimmer" => Voice::Shimmer,
        _ => {
            return Err(ApiError::Internal(format!(
                "Invalid TTS voice specified in config: '{}'",
                config.tts_voice
            )))
        }
    };
    let tts = Arc::new(OpenAiTtsAdapter::new(
        openai_client.clone(),
        SpeechModel::Tts1Hd,
        tts_voice,
    ));
    let extraction = Arc::new(OpenAiExtractionAdapter::new(
        openai_client.clone(),
        config.extraction_model.clone(),
    ));

    // One HTTP client for every REST collaborator; the timeout rides along.
    let http_client = reqwest::Client::builder()
        .timeout(config.upstream_timeout)
        .build()
        .map_err(|e| ApiError::Internal(format!("HTTP client construction failed: {e}")))?;

    let weather = Arc::new(OpenWeatherAdapter::new(
        http_client.clone(),
        config.weather_base_url.clone(),
        config.weather_api_key.clone(),
    ));
    let blobs = Arc::new(HttpBlobAdapter::new(
        http_client.clone(),
        config.blob_container_url.clone(),
        config.blob_sas_token.clone(),
    ));
    let sms = Arc::new(TwilioSmsAdapter::new(
        http_client,
        config.sms_account_sid.clone(),
        config.sms_auth_token.clone(),
        config.sms_from_number.clone(),
        config.sms_to_number.clone(),
    ));

    // --- 4. Assemble the Core Components ---
    let ledger = Ledger::new(store);
    let pipeline = Arc::new(AlertPipeline::new(
        weather.clone(),
        tts.clone(),
        blobs.clone(),
        ledger.clone(),
        &config.scratch_dir,
    )?);

    let scheduler_config = PipelineConfig {
        subject: config.scheduler_subject.clone(),
        target_average: config.scheduler_target_average,
        margin: config.scheduler_margin,
        include_temperature: config.scheduler_include_temperature,
        latitude: config.scheduler_latitude,
        longitude: config.scheduler_longitude,
    };
    let scheduler = AlertScheduler::new(pipeline.clone(), scheduler_config.clone());
    if config.scheduler_enabled {
        scheduler.enable(scheduler_config, config.scheduler_interval_minutes);
    }

    let snapshot = Arc::new(SnapshotCache::new(ledger.clone(), config.snapshot_ttl));

    // --- 5. Build the Shared AppState ---
    let app_state = Arc::new(AppState {
        config: config.clone(),
        ledger,
        pipeline,
        scheduler,
        snapshot,
        sms,
        extraction,
        tts,
        blobs,
        weather,
    });

    // The device clients call from anywhere on the home network.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT]);

    // --- 6. Create the Web Router ---
    let api_router = Router::new()
        .route("/api/alerts/generate", post(alerts::generate_alert_handler))
        .route("/api/alerts/latest", get(alerts::latest_alert_handler))
        .route(
            "/api/alerts",
            get(alerts::list_alerts_handler).delete(alerts::delete_alerts_handler),
        )
        .route(
            "/api/alerts/{id}",
            delete(alerts::delete_alert_by_id_handler),
        )
        .route(
            "/api/reminders",
            post(reminders::create_reminder_handler).get(reminders::list_reminders_handler),
        )
        .route(
            "/api/reminders/{id}",
            delete(reminders::deactivate_reminder_handler),
        )
        .route(
            "/api/weather/current",
            get(weather::current_weather_handler),
        )
        .route("/api/device/config", get(device::device_config_handler))
        .route("/api/device/next-audio", get(device::next_audio_handler))
        .route("/api/device/agenda", get(device::agenda_handler))
        .route("/api/device/event", post(device::device_event_handler))
        .route("/api/device/ack", post(device::ack_handler))
        .route(
            "/api/scheduler/status",
            get(sched::scheduler_status_handler),
        )
        .route(
            "/api/scheduler/run-now",
            post(sched::scheduler_run_now_handler),
        )
        .layer(cors)
        .with_state(app_state);

    // Merge the API router with the Swagger UI router for a complete application.
    let app = Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // --- 7. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
