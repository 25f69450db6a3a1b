//! crates/caretaker_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or transport format; the
//! serde derives exist only because the document store persists them as JSON.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Sentinel weekday value meaning "every day of the week".
pub const ALL_WEEKDAYS: &str = "all";

/// The out-of-range side a produced alert belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertCategory {
    #[serde(rename = "below-range")]
    BelowRange,
    #[serde(rename = "above-range")]
    AboveRange,
}

impl AlertCategory {
    /// Short tag used as the artifact name prefix.
    pub fn tag(self) -> &'static str {
        match self {
            AlertCategory::BelowRange => "cold",
            AlertCategory::AboveRange => "heat",
        }
    }

    /// Parses the wire form used in query parameters and stored documents.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "below-range" => Some(AlertCategory::BelowRange),
            "above-range" => Some(AlertCategory::AboveRange),
            _ => None,
        }
    }
}

impl std::fmt::Display for AlertCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AlertCategory::BelowRange => write!(f, "below-range"),
            AlertCategory::AboveRange => write!(f, "above-range"),
        }
    }
}

/// Result of classifying a temperature against a target range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TempClass {
    Normal,
    OutOfRange(AlertCategory),
}

/// A persisted caretaker instruction: "remind this person to take this
/// substance at this time".
///
/// Records are deactivated rather than deleted when superseded; inactive
/// records are excluded from every serving path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReminderRecord {
    pub id: Uuid,
    /// The care recipient; doubles as the storage partition key.
    pub subject: String,
    /// Time of day in 24h clock.
    pub time_of_day: NaiveTime,
    pub substance: String,
    /// Rendered spoken text for the reminder.
    pub message: String,
    pub audio_url: String,
    /// Frequency as the caretaker phrased it ("twice a day", "every 8 hours").
    pub frequency: String,
    /// Lowercase weekday names, or the single sentinel `"all"`.
    pub weekdays: Vec<String>,
    /// 0 means an indefinite course.
    pub duration_days: u32,
    pub start_date: NaiveDate,
    /// `None` means indefinite. When present, always >= `start_date`.
    pub end_date: Option<NaiveDate>,
    pub active: bool,
    #[serde(default)]
    pub priority: i32,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub deactivated_at: Option<DateTime<Utc>>,
}

impl ReminderRecord {
    /// Whether the record's date window covers the given day.
    pub fn covers(&self, day: NaiveDate) -> bool {
        if day < self.start_date {
            return false;
        }
        match self.end_date {
            Some(end) => day <= end,
            None => true,
        }
    }
}

/// The structured output of the natural-language extraction step, before
/// audio has been synthesized or dates derived.
#[derive(Debug, Clone)]
pub struct ReminderDraft {
    pub subject: String,
    pub time_of_day: NaiveTime,
    pub substance: String,
    pub message: String,
    pub frequency: String,
    pub weekdays: Vec<String>,
    pub duration_days: u32,
    pub priority: i32,
}

/// An immutable produced alert. Historical, never revised.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertRecord {
    pub id: Uuid,
    /// Partition key.
    pub subject: String,
    pub category: AlertCategory,
    pub current_temperature: f64,
    pub target_average: f64,
    pub margin: f64,
    pub message: String,
    /// Non-empty by construction: the pipeline never persists an alert
    /// without a durable audio artifact behind this URL.
    pub audio_url: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

/// Parameters for one pipeline evaluation.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub subject: String,
    pub target_average: f64,
    /// Must be > 0; enforced by [`PipelineConfig::validate`] at the boundary.
    pub margin: f64,
    pub include_temperature: bool,
    pub latitude: f64,
    pub longitude: f64,
}

impl PipelineConfig {
    /// Rejects configurations that would make the normal range ill-defined.
    pub fn validate(&self) -> Result<(), String> {
        if !(self.margin > 0.0) {
            return Err(format!("margin must be > 0 (got {})", self.margin));
        }
        if self.subject.trim().is_empty() {
            return Err("subject must not be empty".to_string());
        }
        Ok(())
    }
}

/// Discriminant for the two record kinds stored in the shared collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocumentKind {
    #[serde(rename = "reminder")]
    Reminder,
    #[serde(rename = "alert")]
    Alert,
}

impl DocumentKind {
    pub fn as_str(self) -> &'static str {
        match self {
            DocumentKind::Reminder => "reminder",
            DocumentKind::Alert => "alert",
        }
    }
}

/// A record as it lives in the partitioned collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum StoredDocument {
    #[serde(rename = "reminder")]
    Reminder(ReminderRecord),
    #[serde(rename = "alert")]
    Alert(AlertRecord),
}

impl StoredDocument {
    pub fn kind(&self) -> DocumentKind {
        match self {
            StoredDocument::Reminder(_) => DocumentKind::Reminder,
            StoredDocument::Alert(_) => DocumentKind::Alert,
        }
    }

    pub fn id(&self) -> Uuid {
        match self {
            StoredDocument::Reminder(r) => r.id,
            StoredDocument::Alert(a) => a.id,
        }
    }

    pub fn subject(&self) -> &str {
        match self {
            StoredDocument::Reminder(r) => &r.subject,
            StoredDocument::Alert(a) => &a.subject,
        }
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        match self {
            StoredDocument::Reminder(r) => r.created_at,
            StoredDocument::Alert(a) => a.created_at,
        }
    }

    pub fn is_active(&self) -> bool {
        match self {
            StoredDocument::Reminder(r) => r.active,
            StoredDocument::Alert(a) => a.active,
        }
    }
}
