//! Ledger contract tests: partition-key validation, limit clamping,
//! best-effort bulk deletes, and soft deactivation.

mod common;

use std::sync::Arc;

use caretaker_core::domain::{AlertCategory, StoredDocument};
use caretaker_core::ledger::Ledger;
use caretaker_core::ports::PortError;
use common::{alert, reminder, InMemoryStore};
use uuid::Uuid;

fn ledger_over(store: &Arc<InMemoryStore>) -> Ledger {
    Ledger::new(store.clone())
}

#[tokio::test]
async fn append_rejects_an_empty_partition_key() {
    let store = Arc::new(InMemoryStore::new());
    let ledger = ledger_over(&store);

    let mut record = alert("");
    record.subject = "   ".to_string();
    let err = ledger.append_alert(record).await.unwrap_err();
    assert!(matches!(err, PortError::InvalidRecord(_)));
    assert_eq!(store.len(), 0, "nothing may be written without a subject");
}

#[tokio::test]
async fn append_stamps_unset_ids_and_timestamps() {
    let store = Arc::new(InMemoryStore::new());
    let ledger = ledger_over(&store);

    let mut record = alert("Gabriel");
    record.created_at = chrono::DateTime::UNIX_EPOCH;
    let id = ledger.append_alert(record).await.unwrap();
    assert!(!id.is_nil());

    let stored = ledger.latest_alert("Gabriel", None).await.unwrap().unwrap();
    assert!(
        stored.created_at > chrono::DateTime::UNIX_EPOCH,
        "epoch sentinel is replaced with the append time"
    );

    let mut record = reminder("Olga", "aspirin");
    record.id = Uuid::nil();
    record.created_at = chrono::DateTime::UNIX_EPOCH;
    let id = ledger.append_reminder(record).await.unwrap();
    assert!(!id.is_nil());

    let stored = ledger.reminders_for_subject("Olga").await.unwrap();
    assert!(stored[0].created_at > chrono::DateTime::UNIX_EPOCH);
}

#[tokio::test]
async fn latest_alert_returns_none_when_nothing_matches() {
    let store = Arc::new(InMemoryStore::new());
    let ledger = ledger_over(&store);

    let found = ledger.latest_alert("Gabriel", None).await.unwrap();
    assert!(found.is_none());
}

#[tokio::test]
async fn latest_alert_honors_the_category_filter() {
    let store = Arc::new(InMemoryStore::new());
    let ledger = ledger_over(&store);

    let mut cold = alert("Gabriel");
    cold.created_at = chrono::Utc::now() - chrono::Duration::minutes(5);
    ledger.append_alert(cold).await.unwrap();

    let mut hot = alert("Gabriel");
    hot.category = AlertCategory::AboveRange;
    ledger.append_alert(hot).await.unwrap();

    let any = ledger.latest_alert("Gabriel", None).await.unwrap().unwrap();
    assert_eq!(any.category, AlertCategory::AboveRange, "newest wins");

    let cold_only = ledger
        .latest_alert("Gabriel", Some(AlertCategory::BelowRange))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(cold_only.category, AlertCategory::BelowRange);
}

#[tokio::test]
async fn list_limit_is_clamped_to_the_protective_bounds() {
    let store = Arc::new(InMemoryStore::new());
    let ledger = ledger_over(&store);

    for _ in 0..205 {
        ledger.append_alert(alert("Gabriel")).await.unwrap();
    }

    let capped = ledger.list_alerts(Some("Gabriel"), None, 500).await.unwrap();
    assert_eq!(capped.len(), 200, "limit above 200 clamps down");

    let floored = ledger.list_alerts(Some("Gabriel"), None, 0).await.unwrap();
    assert_eq!(floored.len(), 1, "limit 0 clamps up to 1");
}

#[tokio::test]
async fn delete_with_no_matches_reports_zero() {
    let store = Arc::new(InMemoryStore::new());
    let ledger = ledger_over(&store);

    let deleted = ledger.delete_alerts("Gabriel", None).await.unwrap();
    assert_eq!(deleted, 0);
}

#[tokio::test]
async fn bulk_delete_is_best_effort_and_counts_only_removals() {
    let store = Arc::new(InMemoryStore::new());
    let ledger = ledger_over(&store);

    ledger.append_alert(alert("Gabriel")).await.unwrap();
    let stuck = ledger.append_alert(alert("Gabriel")).await.unwrap();
    ledger.append_alert(alert("Gabriel")).await.unwrap();
    store.refuse_delete(stuck);

    let deleted = ledger.delete_alerts("Gabriel", None).await.unwrap();
    assert_eq!(deleted, 2, "the refused document is skipped, not fatal");
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn delete_by_id_resolves_the_partition_and_reports_absence() {
    let store = Arc::new(InMemoryStore::new());
    let ledger = ledger_over(&store);

    let id = ledger.append_alert(alert("Gabriel")).await.unwrap();
    assert!(ledger.delete_alert_by_id(id).await.unwrap());
    assert!(!ledger.delete_alert_by_id(id).await.unwrap(), "already gone");
    assert!(!ledger.delete_alert_by_id(Uuid::new_v4()).await.unwrap());
}

#[tokio::test]
async fn delete_by_id_refuses_a_document_without_a_partition_key() {
    let store = Arc::new(InMemoryStore::new());
    let ledger = ledger_over(&store);

    // Seed a malformed document directly, bypassing append validation.
    let mut record = alert("Gabriel");
    record.id = Uuid::new_v4();
    record.subject = String::new();
    let id = record.id;
    store.seed(StoredDocument::Alert(record));

    let err = ledger.delete_alert_by_id(id).await.unwrap_err();
    assert!(matches!(err, PortError::InvalidRecord(_)));
}

#[tokio::test]
async fn deactivation_is_soft_and_hides_the_reminder() {
    let store = Arc::new(InMemoryStore::new());
    let ledger = ledger_over(&store);

    let record = reminder("Olga", "ibuprofen");
    let id = record.id;
    ledger.append_reminder(record).await.unwrap();
    assert_eq!(ledger.active_reminders().await.unwrap().len(), 1);

    ledger.deactivate_reminder(id, "Olga").await.unwrap();
    assert!(ledger.active_reminders().await.unwrap().is_empty());
    // The document still exists; it was deactivated, not removed.
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn reminder_with_inverted_dates_is_rejected() {
    let store = Arc::new(InMemoryStore::new());
    let ledger = ledger_over(&store);

    let mut record = reminder("Olga", "aspirin");
    record.end_date = Some(record.start_date - chrono::Duration::days(1));
    let err = ledger.append_reminder(record).await.unwrap_err();
    assert!(matches!(err, PortError::InvalidRecord(_)));
}
