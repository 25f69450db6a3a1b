//! Alert production pipeline tests: per-stage failure tagging, the
//! empty-audio-url guarantee, and unconditional scratch cleanup.

mod common;

use std::sync::Arc;

use caretaker_core::domain::{AlertCategory, PipelineConfig};
use caretaker_core::ledger::Ledger;
use caretaker_core::pipeline::{AlertPipeline, PipelineResult, PipelineStage};
use common::{InMemoryStore, StubBlobs, StubTts, StubWeather};
use tempfile::TempDir;

fn config() -> PipelineConfig {
    PipelineConfig {
        subject: "Gabriel".to_string(),
        target_average: 25.0,
        margin: 3.0,
        include_temperature: true,
        latitude: 9.9281,
        longitude: -84.0907,
    }
}

struct Harness {
    store: Arc<InMemoryStore>,
    pipeline: AlertPipeline,
    scratch: TempDir,
}

fn harness(weather: StubWeather, tts: StubTts, blobs: StubBlobs) -> Harness {
    let store = Arc::new(InMemoryStore::new());
    let scratch = TempDir::new().expect("scratch dir");
    let pipeline = AlertPipeline::new(
        Arc::new(weather),
        Arc::new(tts),
        Arc::new(blobs),
        Ledger::new(store.clone()),
        scratch.path(),
    )
    .expect("pipeline");
    Harness {
        store,
        pipeline,
        scratch,
    }
}

fn scratch_is_empty(scratch: &TempDir) -> bool {
    std::fs::read_dir(scratch.path())
        .expect("read scratch dir")
        .next()
        .is_none()
}

#[tokio::test]
async fn in_range_temperature_produces_nothing() {
    let h = harness(
        StubWeather::reporting(24.0),
        StubTts { fail: false },
        StubBlobs::working(),
    );

    let result = h.pipeline.produce(&config()).await;
    assert!(matches!(result, PipelineResult::Normal { temperature, .. } if temperature == 24.0));
    assert_eq!(h.store.len(), 0, "no record written for a normal reading");
    assert!(scratch_is_empty(&h.scratch));
}

#[tokio::test]
async fn cold_reading_persists_a_below_range_alert() {
    let h = harness(
        StubWeather::reporting(21.0),
        StubTts { fail: false },
        StubBlobs::working(),
    );

    let result = h.pipeline.produce(&config()).await;
    let PipelineResult::Produced {
        category,
        temperature,
        audio_url,
        ..
    } = result
    else {
        panic!("expected Produced, got {result:?}");
    };
    assert_eq!(category, AlertCategory::BelowRange);
    assert_eq!(temperature, 21.0);
    assert!(!audio_url.is_empty());

    let stored = Ledger::new(h.store.clone())
        .list_alerts(Some("Gabriel"), None, 10)
        .await
        .expect("list alerts");
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].category, AlertCategory::BelowRange);
    assert!(!stored[0].audio_url.is_empty());
    assert!(scratch_is_empty(&h.scratch));
}

#[tokio::test]
async fn hot_reading_is_above_range() {
    let h = harness(
        StubWeather::reporting(28.0),
        StubTts { fail: false },
        StubBlobs::working(),
    );

    let result = h.pipeline.produce(&config()).await;
    assert!(matches!(
        result,
        PipelineResult::Produced {
            category: AlertCategory::AboveRange,
            ..
        }
    ));
}

#[tokio::test]
async fn weather_failure_is_tagged_lookup() {
    let h = harness(
        StubWeather::failing(),
        StubTts { fail: false },
        StubBlobs::working(),
    );

    let result = h.pipeline.produce(&config()).await;
    assert!(matches!(
        result,
        PipelineResult::Failed {
            stage: PipelineStage::Lookup,
            category: None,
            ..
        }
    ));
    assert_eq!(h.store.len(), 0);
}

#[tokio::test]
async fn synthesis_failure_is_tagged_and_writes_nothing() {
    let h = harness(
        StubWeather::reporting(21.0),
        StubTts { fail: true },
        StubBlobs::working(),
    );

    let result = h.pipeline.produce(&config()).await;
    assert!(matches!(
        result,
        PipelineResult::Failed {
            stage: PipelineStage::Synthesis,
            category: Some(AlertCategory::BelowRange),
            ..
        }
    ));
    assert_eq!(h.store.len(), 0);
    assert!(scratch_is_empty(&h.scratch));
}

#[tokio::test]
async fn publish_failure_cleans_the_scratch_file() {
    let h = harness(
        StubWeather::reporting(21.0),
        StubTts { fail: false },
        StubBlobs::failing(),
    );

    let result = h.pipeline.produce(&config()).await;
    assert!(matches!(
        result,
        PipelineResult::Failed {
            stage: PipelineStage::Publish,
            ..
        }
    ));
    assert_eq!(h.store.len(), 0);
    assert!(
        scratch_is_empty(&h.scratch),
        "transient audio must not survive a publish failure"
    );
}

#[tokio::test]
async fn persist_failure_is_tagged_and_blob_is_left_in_place() {
    let store = Arc::new(InMemoryStore::new());
    store.set_fail_inserts(true);
    let scratch = TempDir::new().expect("scratch dir");
    let blobs = Arc::new(StubBlobs::working());
    let pipeline = AlertPipeline::new(
        Arc::new(StubWeather::reporting(29.5)),
        Arc::new(StubTts { fail: false }),
        blobs.clone(),
        Ledger::new(store.clone()),
        scratch.path(),
    )
    .expect("pipeline");

    let result = pipeline.produce(&config()).await;
    assert!(matches!(
        result,
        PipelineResult::Failed {
            stage: PipelineStage::Persist,
            category: Some(AlertCategory::AboveRange),
            ..
        }
    ));
    // The published artifact is deliberately not retracted.
    assert_eq!(blobs.published.lock().unwrap().len(), 1);
    assert!(scratch_is_empty(&scratch));
}
