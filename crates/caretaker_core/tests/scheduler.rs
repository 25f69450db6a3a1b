//! Scheduler tests: single-flight across manual and scheduled ticks,
//! idempotent re-registration, and status reporting.

mod common;

use std::sync::Arc;
use std::time::Duration;

use caretaker_core::domain::PipelineConfig;
use caretaker_core::ledger::Ledger;
use caretaker_core::pipeline::{AlertPipeline, PipelineResult};
use caretaker_core::scheduler::{AlertScheduler, TickOutcome};
use common::{InMemoryStore, StubBlobs, StubTts, StubWeather};
use tempfile::TempDir;

fn config(subject: &str) -> PipelineConfig {
    PipelineConfig {
        subject: subject.to_string(),
        target_average: 25.0,
        margin: 3.0,
        include_temperature: false,
        latitude: 9.9281,
        longitude: -84.0907,
    }
}

fn slow_pipeline(scratch: &TempDir, delay: Duration) -> Arc<AlertPipeline> {
    let store = Arc::new(InMemoryStore::new());
    let weather = StubWeather {
        temperature: Some(24.0),
        delay,
    };
    Arc::new(
        AlertPipeline::new(
            Arc::new(weather),
            Arc::new(StubTts { fail: false }),
            Arc::new(StubBlobs::working()),
            Ledger::new(store),
            scratch.path(),
        )
        .expect("pipeline"),
    )
}

#[tokio::test]
async fn concurrent_manual_runs_share_the_single_flight_slot() {
    let scratch = TempDir::new().unwrap();
    let pipeline = slow_pipeline(&scratch, Duration::from_millis(200));
    let scheduler = AlertScheduler::new(pipeline, config("Gabriel"));

    let in_flight = {
        let scheduler = Arc::clone(&scheduler);
        tokio::spawn(async move { scheduler.run_once().await })
    };
    // Give the first run time to take the slot and park in the weather call.
    tokio::time::sleep(Duration::from_millis(50)).await;

    let second = scheduler.run_once().await;
    assert!(
        matches!(second, TickOutcome::Skipped),
        "a run while another is in flight must be skipped, not queued"
    );

    let first = in_flight.await.unwrap();
    assert!(matches!(
        first,
        TickOutcome::Completed(PipelineResult::Normal { .. })
    ));

    // With the slot free again, a new run proceeds.
    let third = scheduler.run_once().await;
    assert!(matches!(third, TickOutcome::Completed(_)));
}

#[tokio::test]
async fn disabled_until_enabled_and_status_reflects_it() {
    let scratch = TempDir::new().unwrap();
    let pipeline = slow_pipeline(&scratch, Duration::ZERO);
    let scheduler = AlertScheduler::new(pipeline, config("Gabriel"));

    let status = scheduler.status();
    assert!(!status.enabled);
    assert_eq!(status.subject, "Gabriel");
    assert!(status.next_fire_time.is_none());

    scheduler.enable(config("Gabriel"), 15);
    let status = scheduler.status();
    assert!(status.enabled);
    assert_eq!(status.interval_minutes, 15);
    assert!(status.next_fire_time.is_some());

    scheduler.disable();
    assert!(!scheduler.status().enabled);
    assert!(scheduler.status().next_fire_time.is_none());
}

#[tokio::test]
async fn re_enabling_replaces_the_registration() {
    let scratch = TempDir::new().unwrap();
    let pipeline = slow_pipeline(&scratch, Duration::ZERO);
    let scheduler = AlertScheduler::new(pipeline, config("Gabriel"));

    scheduler.enable(config("Gabriel"), 15);
    scheduler.enable(config("Olga"), 30);

    let status = scheduler.status();
    assert_eq!(status.interval_minutes, 30);
    assert_eq!(status.subject, "Olga", "re-enable rebinds the configuration");

    scheduler.disable();
}

#[tokio::test]
async fn manual_run_uses_the_bound_configuration() {
    let scratch = TempDir::new().unwrap();
    let pipeline = slow_pipeline(&scratch, Duration::ZERO);
    let scheduler = AlertScheduler::new(pipeline, config("Gabriel"));

    let outcome = scheduler.run_once().await;
    let TickOutcome::Completed(PipelineResult::Normal { target_average, .. }) = outcome else {
        panic!("expected a completed normal run");
    };
    assert_eq!(target_average, 25.0);
}
