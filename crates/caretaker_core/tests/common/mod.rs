//! Shared in-memory fakes for the core integration tests. Each fake
//! implements one port and can be flipped into a failing mode to exercise
//! the partial-failure paths.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use caretaker_core::domain::StoredDocument;
use caretaker_core::ports::{
    BlobStorage, DocumentQuery, DocumentStore, PortError, PortResult, TextToSpeechService,
    WeatherService,
};
use chrono::{NaiveDate, NaiveTime, Utc};
use uuid::Uuid;

//=========================================================================================
// Document store fake
//=========================================================================================

#[derive(Default)]
pub struct InMemoryStore {
    docs: Mutex<Vec<StoredDocument>>,
    fail_queries: AtomicBool,
    fail_inserts: AtomicBool,
    undeletable: Mutex<HashSet<Uuid>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_queries(&self, fail: bool) {
        self.fail_queries.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_inserts(&self, fail: bool) {
        self.fail_inserts.store(fail, Ordering::SeqCst);
    }

    /// Marks an id whose delete will fail, for best-effort bulk tests.
    pub fn refuse_delete(&self, id: Uuid) {
        self.undeletable.lock().unwrap().insert(id);
    }

    /// Bypasses ledger validation; used to seed malformed documents.
    pub fn seed(&self, doc: StoredDocument) {
        self.docs.lock().unwrap().push(doc);
    }

    pub fn len(&self) -> usize {
        self.docs.lock().unwrap().len()
    }
}

fn matches(doc: &StoredDocument, query: &DocumentQuery) -> bool {
    if let Some(kind) = query.kind {
        if doc.kind() != kind {
            return false;
        }
    }
    if let Some(subject) = &query.subject {
        if doc.subject() != subject {
            return false;
        }
    }
    if let Some(category) = query.category {
        match doc {
            StoredDocument::Alert(a) if a.category == category => {}
            _ => return false,
        }
    }
    if query.active_only && !doc.is_active() {
        return false;
    }
    true
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn insert(&self, document: StoredDocument) -> PortResult<()> {
        if self.fail_inserts.load(Ordering::SeqCst) {
            return Err(PortError::Upstream("store down".to_string()));
        }
        self.docs.lock().unwrap().push(document);
        Ok(())
    }

    async fn query(&self, query: DocumentQuery) -> PortResult<Vec<StoredDocument>> {
        if self.fail_queries.load(Ordering::SeqCst) {
            return Err(PortError::Upstream("store down".to_string()));
        }
        let docs = self.docs.lock().unwrap();
        let mut hits: Vec<StoredDocument> =
            docs.iter().filter(|d| matches(d, &query)).cloned().collect();
        if query.newest_first {
            hits.sort_by_key(|d| std::cmp::Reverse(d.created_at()));
        }
        if let Some(limit) = query.limit {
            hits.truncate(limit);
        }
        Ok(hits)
    }

    async fn read(&self, id: Uuid, subject: &str) -> PortResult<Option<StoredDocument>> {
        let docs = self.docs.lock().unwrap();
        Ok(docs
            .iter()
            .find(|d| d.id() == id && d.subject() == subject)
            .cloned())
    }

    async fn find(&self, id: Uuid) -> PortResult<Option<StoredDocument>> {
        let docs = self.docs.lock().unwrap();
        Ok(docs.iter().find(|d| d.id() == id).cloned())
    }

    async fn replace(&self, document: StoredDocument) -> PortResult<()> {
        let mut docs = self.docs.lock().unwrap();
        let slot = docs
            .iter_mut()
            .find(|d| d.id() == document.id() && d.subject() == document.subject())
            .ok_or_else(|| PortError::NotFound(document.id().to_string()))?;
        *slot = document;
        Ok(())
    }

    async fn delete(&self, id: Uuid, subject: &str) -> PortResult<()> {
        if self.undeletable.lock().unwrap().contains(&id) {
            return Err(PortError::Upstream("delete refused".to_string()));
        }
        let mut docs = self.docs.lock().unwrap();
        let before = docs.len();
        docs.retain(|d| !(d.id() == id && d.subject() == subject));
        if docs.len() == before {
            return Err(PortError::NotFound(id.to_string()));
        }
        Ok(())
    }
}

//=========================================================================================
// Collaborator fakes
//=========================================================================================

pub struct StubWeather {
    pub temperature: Option<f64>,
    /// Simulated upstream latency, for single-flight tests.
    pub delay: Duration,
}

impl StubWeather {
    pub fn reporting(temperature: f64) -> Self {
        Self {
            temperature: Some(temperature),
            delay: Duration::ZERO,
        }
    }

    pub fn failing() -> Self {
        Self {
            temperature: None,
            delay: Duration::ZERO,
        }
    }
}

#[async_trait]
impl WeatherService for StubWeather {
    async fn current_temperature(&self, _latitude: f64, _longitude: f64) -> PortResult<f64> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.temperature
            .ok_or_else(|| PortError::Upstream("weather down".to_string()))
    }
}

pub struct StubTts {
    pub fail: bool,
}

#[async_trait]
impl TextToSpeechService for StubTts {
    async fn synthesize(&self, text: &str) -> PortResult<Vec<u8>> {
        if self.fail {
            return Err(PortError::Upstream("synthesis down".to_string()));
        }
        let mut bytes = b"RIFF".to_vec();
        bytes.extend_from_slice(text.as_bytes());
        Ok(bytes)
    }
}

pub struct StubBlobs {
    pub fail: bool,
    pub published: Mutex<Vec<String>>,
}

impl StubBlobs {
    pub fn working() -> Self {
        Self {
            fail: false,
            published: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            published: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl BlobStorage for StubBlobs {
    async fn publish(&self, _bytes: &[u8], name: &str) -> PortResult<String> {
        if self.fail {
            return Err(PortError::Upstream("blob store down".to_string()));
        }
        self.published.lock().unwrap().push(name.to_string());
        Ok(format!("https://blobs.example/audio/{name}"))
    }
}

//=========================================================================================
// Record builders
//=========================================================================================

pub fn reminder(subject: &str, substance: &str) -> caretaker_core::domain::ReminderRecord {
    caretaker_core::domain::ReminderRecord {
        id: Uuid::new_v4(),
        subject: subject.to_string(),
        time_of_day: NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
        substance: substance.to_string(),
        message: format!("Time to take {substance}."),
        audio_url: format!("https://blobs.example/audio/{substance}.wav"),
        frequency: "once a day".to_string(),
        weekdays: vec!["all".to_string()],
        duration_days: 0,
        start_date: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
        end_date: None,
        active: true,
        priority: 0,
        created_at: Utc::now(),
        deactivated_at: None,
    }
}

pub fn alert(subject: &str) -> caretaker_core::domain::AlertRecord {
    caretaker_core::domain::AlertRecord {
        id: Uuid::nil(),
        subject: subject.to_string(),
        category: caretaker_core::domain::AlertCategory::BelowRange,
        current_temperature: 12.0,
        target_average: 25.0,
        margin: 3.0,
        message: "It's cold outside, put on a warm coat.".to_string(),
        audio_url: "https://blobs.example/audio/cold_abc123.wav".to_string(),
        active: true,
        created_at: Utc::now(),
    }
}
