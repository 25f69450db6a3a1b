pub mod domain;
pub mod evaluator;
pub mod ledger;
pub mod pipeline;
pub mod ports;
pub mod schedule_dates;
pub mod scheduler;
pub mod snapshot;

pub use domain::{
    AlertCategory, AlertRecord, DocumentKind, PipelineConfig, ReminderDraft, ReminderRecord,
    StoredDocument, TempClass,
};
pub use ledger::Ledger;
pub use pipeline::{AlertPipeline, PipelineResult, PipelineStage};
pub use ports::{
    BlobStorage, DocumentQuery, DocumentStore, PortError, PortResult,
    ReminderExtractionService, SmsService, TextToSpeechService, WeatherService,
};
pub use scheduler::{AlertScheduler, SchedulerStatus, TickOutcome};
pub use snapshot::{SnapshotCache, SnapshotFetch};
