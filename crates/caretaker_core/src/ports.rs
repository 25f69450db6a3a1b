//! crates/caretaker_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the
//! core to be independent of specific external implementations like the
//! document database, the speech synthesizer, or the weather API.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{AlertCategory, DocumentKind, ReminderDraft, StoredDocument};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g. the
/// document store, the blob container, or an HTTP upstream).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Invalid record: {0}")]
    InvalidRecord(String),
    #[error("Upstream service failed: {0}")]
    Upstream(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Document Store Port
//=========================================================================================

/// A filter for [`DocumentStore::query`]. Mirrors the capabilities the
/// underlying partitioned collection offers: kind discriminant, partition
/// key, alert category, activity flag, ordering, and a result cap.
#[derive(Debug, Clone, Default)]
pub struct DocumentQuery {
    pub kind: Option<DocumentKind>,
    pub subject: Option<String>,
    pub category: Option<AlertCategory>,
    pub active_only: bool,
    /// When true, results are ordered by `created_at` descending.
    pub newest_first: bool,
    pub limit: Option<usize>,
}

impl DocumentQuery {
    pub fn of_kind(kind: DocumentKind) -> Self {
        Self {
            kind: Some(kind),
            ..Self::default()
        }
    }
}

/// The partitioned document collection holding reminders and alerts.
///
/// Point operations (`read`, `replace`, `delete`) are keyed by id plus
/// partition key; `find` is the only cross-partition point lookup and exists
/// because deletions by bare id must first resolve the owning partition.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn insert(&self, document: StoredDocument) -> PortResult<()>;

    async fn query(&self, query: DocumentQuery) -> PortResult<Vec<StoredDocument>>;

    /// Point read within one partition. `Ok(None)` when absent.
    async fn read(&self, id: Uuid, subject: &str) -> PortResult<Option<StoredDocument>>;

    /// Cross-partition lookup by id only. `Ok(None)` when absent.
    async fn find(&self, id: Uuid) -> PortResult<Option<StoredDocument>>;

    /// Replaces an existing document in place (same id and partition key).
    async fn replace(&self, document: StoredDocument) -> PortResult<()>;

    async fn delete(&self, id: Uuid, subject: &str) -> PortResult<()>;
}

//=========================================================================================
// External Collaborator Ports
//=========================================================================================

#[async_trait]
pub trait WeatherService: Send + Sync {
    /// Returns the current temperature in degrees Celsius at the coordinates.
    async fn current_temperature(&self, latitude: f64, longitude: f64) -> PortResult<f64>;
}

#[async_trait]
pub trait TextToSpeechService: Send + Sync {
    /// Synthesizes spoken audio (WAV bytes) from a string of text.
    ///
    /// A non-audio payload from the upstream is a synthesis failure, not a
    /// success with garbage bytes.
    async fn synthesize(&self, text: &str) -> PortResult<Vec<u8>>;
}

#[async_trait]
pub trait BlobStorage: Send + Sync {
    /// Publishes the bytes to durable storage under `name` and returns the
    /// public URL of the artifact.
    async fn publish(&self, bytes: &[u8], name: &str) -> PortResult<String>;
}

#[async_trait]
pub trait SmsService: Send + Sync {
    /// Dispatches a text message to the configured caretaker number.
    async fn send(&self, message: &str) -> PortResult<()>;
}

#[async_trait]
pub trait ReminderExtractionService: Send + Sync {
    /// Turns a natural-language instruction into a structured reminder draft.
    async fn extract(&self, phrase: &str) -> PortResult<ReminderDraft>;
}
