//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use caretaker_core::ledger::Ledger;
use caretaker_core::pipeline::AlertPipeline;
use caretaker_core::ports::{ReminderExtractionService, SmsService, TextToSpeechService};
use caretaker_core::ports::{BlobStorage, WeatherService};
use caretaker_core::scheduler::AlertScheduler;
use caretaker_core::snapshot::SnapshotCache;
use std::sync::Arc;

//=========================================================================================
// AppState (Shared Across All Connections)
//=========================================================================================

/// The shared application state, created once at startup and passed to all
/// handlers. Components depend on the abstract ports; the concrete adapters
/// are wired in by the binary.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub ledger: Ledger,
    pub pipeline: Arc<AlertPipeline>,
    pub scheduler: Arc<AlertScheduler>,
    pub snapshot: Arc<SnapshotCache>,
    pub sms: Arc<dyn SmsService>,
    pub extraction: Arc<dyn ReminderExtractionService>,
    pub tts: Arc<dyn TextToSpeechService>,
    pub blobs: Arc<dyn BlobStorage>,
    pub weather: Arc<dyn WeatherService>,
}
