//! services/api/src/adapters/extract.rs
//!
//! This module contains the adapter for the natural-language extraction
//! service: it turns a caretaker's free-text instruction into a structured
//! reminder draft. It implements the `ReminderExtractionService` port.

const SYSTEM_INSTRUCTIONS: &str = r#"You convert natural-language phrases into structured medication reminders.
Always answer with a single JSON object with exactly these fields:
- subject: name or description of the person who must take the medication, as it appears in the text.
- time_of_day: 24h clock, "HH:MM".
- substance: short lowercase name of the medication.
- message: a short spoken reminder for an elderly person, using the time in words and the medication name.
- frequency: the frequency exactly as the user phrased it (e.g. "twice a day", "every 8 hours").
- weekdays: lowercase English day names on which it must be taken (e.g. ["monday","wednesday","friday"]), or ["all"] when daily.
- duration_days: integer; when the user says "for X days" use X, otherwise 0.
- priority: integer, 0 unless the user marks the reminder as urgent or important (then 1).

Examples:

Input:
"My grandmother takes 100 mg of aspirin at 8 a.m., twice a day, Monday to Friday."
Output:
{
  "subject": "grandmother",
  "time_of_day": "08:00",
  "substance": "aspirin",
  "message": "Grandma, it's eight o'clock. Time to take your aspirin.",
  "frequency": "twice a day",
  "weekdays": ["monday","tuesday","wednesday","thursday","friday"],
  "duration_days": 0,
  "priority": 0
}

Input:
"Olga must take 500 mg of ibuprofen at 8 a.m., every 12 hours, for 4 days."
Output:
{
  "subject": "Olga",
  "time_of_day": "08:00",
  "substance": "ibuprofen",
  "message": "Olga, it's eight o'clock. Time to take your ibuprofen.",
  "frequency": "every 12 hours",
  "weekdays": ["all"],
  "duration_days": 4,
  "priority": 0
}"#;

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::{
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs, ResponseFormat,
    },
    Client,
};
use async_trait::async_trait;
use caretaker_core::domain::ReminderDraft;
use caretaker_core::ports::{PortError, PortResult, ReminderExtractionService};
use chrono::NaiveTime;
use serde::Deserialize;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `ReminderExtractionService` using an
/// OpenAI-compatible chat model constrained to JSON output.
#[derive(Clone)]
pub struct OpenAiExtractionAdapter {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiExtractionAdapter {
    /// Creates a new `OpenAiExtractionAdapter`.
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self { client, model }
    }
}

/// The raw JSON shape the model produces. `time_of_day` arrives as "HH:MM"
/// and is parsed separately because it is the one field the model gets
/// wrong most often.
#[derive(Deserialize)]
struct ExtractedFields {
    subject: String,
    time_of_day: String,
    substance: String,
    message: String,
    frequency: String,
    weekdays: Vec<String>,
    #[serde(default)]
    duration_days: u32,
    #[serde(default)]
    priority: i32,
}

//=========================================================================================
// `ReminderExtractionService` Trait Implementation
//=========================================================================================

#[async_trait]
impl ReminderExtractionService for OpenAiExtractionAdapter {
    async fn extract(&self, phrase: &str) -> PortResult<ReminderDraft> {
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .temperature(0.2)
            .response_format(ResponseFormat::JsonObject)
            .messages([
                ChatCompletionRequestSystemMessageArgs::default()
                    .content(SYSTEM_INSTRUCTIONS)
                    .build()
                    .map_err(|e| PortError::Unexpected(e.to_string()))?
                    .into(),
                ChatCompletionRequestUserMessageArgs::default()
                    .content(phrase)
                    .build()
                    .map_err(|e| PortError::Unexpected(e.to_string()))?
                    .into(),
            ])
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e: OpenAIError| PortError::Upstream(e.to_string()))?;

        let content = response
            .choices
            .first()
            .and_then(|c| c.message.content.as_deref())
            .ok_or_else(|| PortError::Upstream("extraction returned no content".to_string()))?;

        let fields: ExtractedFields = serde_json::from_str(content).map_err(|e| {
            PortError::Upstream(format!("extraction returned malformed JSON: {e}"))
        })?;

        let time_of_day = NaiveTime::parse_from_str(&fields.time_of_day, "%H:%M")
            .map_err(|_| {
                PortError::Upstream(format!(
                    "extraction returned an invalid time '{}'",
                    fields.time_of_day
                ))
            })?;

        Ok(ReminderDraft {
            subject: fields.subject,
            time_of_day,
            substance: fields.substance,
            message: fields.message,
            frequency: fields.frequency,
            weekdays: fields.weekdays,
            duration_days: fields.duration_days,
            priority: fields.priority,
        })
    }
}
