//! crates/caretaker_core/src/ledger.rs
//!
//! Append/query/delete operations over the persisted alert and reminder
//! records, built on the injected [`DocumentStore`] port. The ledger owns
//! the contracts the raw store does not: partition-key validation, limit
//! clamping, best-effort bulk deletes, and soft deactivation of reminders.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::warn;
use uuid::Uuid;

use crate::domain::{AlertCategory, AlertRecord, DocumentKind, ReminderRecord, StoredDocument};
use crate::ports::{DocumentQuery, DocumentStore, PortError, PortResult};

/// Bounds applied to every list operation so the device/poll path never
/// receives an unbounded response.
pub const LIST_LIMIT_MIN: usize = 1;
pub const LIST_LIMIT_MAX: usize = 200;

fn clamp_limit(limit: usize) -> usize {
    limit.clamp(LIST_LIMIT_MIN, LIST_LIMIT_MAX)
}

/// The ledger over the partitioned document collection.
#[derive(Clone)]
pub struct Ledger {
    store: Arc<dyn DocumentStore>,
}

impl Ledger {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    //=====================================================================================
    // Alert operations
    //=====================================================================================

    /// Appends an alert record, assigning a fresh id and creation timestamp
    /// when unset (nil id, epoch `created_at`). An empty partition key fails
    /// the whole operation; it is never silently defaulted.
    pub async fn append_alert(&self, mut record: AlertRecord) -> PortResult<Uuid> {
        if record.subject.trim().is_empty() {
            return Err(PortError::InvalidRecord(
                "alert record requires a non-empty subject".to_string(),
            ));
        }
        if record.id.is_nil() {
            record.id = Uuid::new_v4();
        }
        if record.created_at == DateTime::<Utc>::UNIX_EPOCH {
            record.created_at = Utc::now();
        }
        let id = record.id;
        self.store.insert(StoredDocument::Alert(record)).await?;
        Ok(id)
    }

    /// The single most recently created matching alert, or `Ok(None)` when
    /// nothing matches.
    pub async fn latest_alert(
        &self,
        subject: &str,
        category: Option<AlertCategory>,
    ) -> PortResult<Option<AlertRecord>> {
        let query = DocumentQuery {
            subject: Some(subject.to_string()),
            category,
            newest_first: true,
            limit: Some(1),
            ..DocumentQuery::of_kind(DocumentKind::Alert)
        };
        let mut docs = self.store.query(query).await?;
        let first = docs.drain(..).next().and_then(|d| match d {
            StoredDocument::Alert(a) => Some(a),
            _ => None,
        });
        Ok(first)
    }

    /// Matching alerts ordered newest-first. `limit` is clamped to 1..=200.
    pub async fn list_alerts(
        &self,
        subject: Option<&str>,
        category: Option<AlertCategory>,
        limit: usize,
    ) -> PortResult<Vec<AlertRecord>> {
        let query = DocumentQuery {
            subject: subject.map(str::to_string),
            category,
            newest_first: true,
            limit: Some(clamp_limit(limit)),
            ..DocumentQuery::of_kind(DocumentKind::Alert)
        };
        let docs = self.store.query(query).await?;
        Ok(docs
            .into_iter()
            .filter_map(|d| match d {
                StoredDocument::Alert(a) => Some(a),
                _ => None,
            })
            .collect())
    }

    /// Removes every matching alert and returns how many were deleted.
    ///
    /// Not atomic across documents: a failure partway through is logged and
    /// skipped, and the count reflects only the documents actually removed.
    pub async fn delete_alerts(
        &self,
        subject: &str,
        category: Option<AlertCategory>,
    ) -> PortResult<usize> {
        if subject.trim().is_empty() {
            return Err(PortError::InvalidRecord(
                "subject is required to delete alerts".to_string(),
            ));
        }
        let query = DocumentQuery {
            subject: Some(subject.to_string()),
            category,
            ..DocumentQuery::of_kind(DocumentKind::Alert)
        };
        let docs = self.store.query(query).await?;

        let mut deleted = 0usize;
        for doc in docs {
            match self.store.delete(doc.id(), doc.subject()).await {
                Ok(()) => deleted += 1,
                Err(e) => {
                    warn!(id = %doc.id(), subject = doc.subject(), error = %e,
                        "could not delete alert, continuing");
                }
            }
        }
        Ok(deleted)
    }

    /// Deletes one alert by bare id. The owning partition key is resolved
    /// with a cross-partition lookup first; a found document with an empty
    /// subject is a delete failure, not a crash. Returns `false` when no
    /// such alert exists.
    pub async fn delete_alert_by_id(&self, id: Uuid) -> PortResult<bool> {
        let Some(doc) = self.store.find(id).await? else {
            return Ok(false);
        };
        if doc.kind() != DocumentKind::Alert {
            return Ok(false);
        }
        if doc.subject().trim().is_empty() {
            return Err(PortError::InvalidRecord(format!(
                "alert {id} has no partition key; refusing to delete"
            )));
        }
        self.store.delete(id, doc.subject()).await?;
        Ok(true)
    }

    //=====================================================================================
    // Reminder operations
    //=====================================================================================

    /// Appends a reminder record, assigning id/created_at when unset.
    pub async fn append_reminder(&self, mut record: ReminderRecord) -> PortResult<Uuid> {
        if record.subject.trim().is_empty() {
            return Err(PortError::InvalidRecord(
                "reminder record requires a non-empty subject".to_string(),
            ));
        }
        if let Some(end) = record.end_date {
            if end < record.start_date {
                return Err(PortError::InvalidRecord(format!(
                    "end_date {} precedes start_date {}",
                    end, record.start_date
                )));
            }
        }
        if record.id.is_nil() {
            record.id = Uuid::new_v4();
        }
        if record.created_at == DateTime::<Utc>::UNIX_EPOCH {
            record.created_at = Utc::now();
        }
        let id = record.id;
        self.store.insert(StoredDocument::Reminder(record)).await?;
        Ok(id)
    }

    /// The cross-subject projection of every active reminder, used by the
    /// device snapshot cache.
    pub async fn active_reminders(&self) -> PortResult<Vec<ReminderRecord>> {
        let query = DocumentQuery {
            active_only: true,
            ..DocumentQuery::of_kind(DocumentKind::Reminder)
        };
        let docs = self.store.query(query).await?;
        Ok(docs
            .into_iter()
            .filter_map(|d| match d {
                StoredDocument::Reminder(r) => Some(r),
                _ => None,
            })
            .collect())
    }

    /// Active reminders for one subject (partition-local query).
    pub async fn reminders_for_subject(&self, subject: &str) -> PortResult<Vec<ReminderRecord>> {
        let query = DocumentQuery {
            subject: Some(subject.to_string()),
            active_only: true,
            ..DocumentQuery::of_kind(DocumentKind::Reminder)
        };
        let docs = self.store.query(query).await?;
        Ok(docs
            .into_iter()
            .filter_map(|d| match d {
                StoredDocument::Reminder(r) => Some(r),
                _ => None,
            })
            .collect())
    }

    /// Soft-deletes a reminder: clears `active`, stamps `deactivated_at`,
    /// and replaces the document. The record itself is never removed.
    pub async fn deactivate_reminder(&self, id: Uuid, subject: &str) -> PortResult<()> {
        let doc = self
            .store
            .read(id, subject)
            .await?
            .ok_or_else(|| PortError::NotFound(format!("reminder {id} for {subject}")))?;
        let StoredDocument::Reminder(mut record) = doc else {
            return Err(PortError::NotFound(format!("reminder {id} for {subject}")));
        };
        record.active = false;
        record.deactivated_at = Some(Utc::now());
        self.store.replace(StoredDocument::Reminder(record)).await
    }
}
