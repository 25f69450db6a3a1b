//! crates/caretaker_core/src/pipeline.rs
//!
//! The alert production pipeline: evaluate the current temperature, and on
//! an out-of-range reading synthesize an audio artifact, publish it to blob
//! storage, and persist an alert record.
//!
//! Every failure is captured in the returned [`PipelineResult`]; nothing is
//! raised past this boundary. The transient synthesis file never outlives a
//! single `produce` call, on any exit path.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::domain::{AlertCategory, AlertRecord, PipelineConfig, TempClass};
use crate::evaluator::{build_alert_content, classify};
use crate::ledger::Ledger;
use crate::ports::{BlobStorage, TextToSpeechService, WeatherService};

/// The stage at which a pipeline run gave up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Lookup,
    Synthesis,
    Publish,
    Persist,
}

/// The outcome of one `produce` call.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PipelineResult {
    /// Temperature is inside the range; nothing was synthesized, published,
    /// or persisted. The expected common case.
    Normal {
        temperature: f64,
        target_average: f64,
        margin: f64,
    },
    /// Full success: the alert record is persisted and its audio artifact is
    /// reachable at `audio_url`.
    Produced {
        alert_id: Uuid,
        category: AlertCategory,
        temperature: f64,
        message: String,
        audio_url: String,
    },
    /// The run failed at `stage`. Fields established before the failing
    /// stage are carried so operators can tell what was being produced.
    Failed {
        stage: PipelineStage,
        category: Option<AlertCategory>,
        temperature: Option<f64>,
        message: Option<String>,
    },
}

impl PipelineResult {
    fn failed_at(
        stage: PipelineStage,
        category: AlertCategory,
        temperature: f64,
        message: &str,
    ) -> Self {
        PipelineResult::Failed {
            stage,
            category: Some(category),
            temperature: Some(temperature),
            message: Some(message.to_string()),
        }
    }
}

/// Removes the transient synthesis file when the guard leaves scope, which
/// covers every exit path of `produce` after the file has been written.
struct ScratchFile {
    path: PathBuf,
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %self.path.display(), error = %e,
                    "could not remove transient audio file");
            }
        }
    }
}

/// Orchestrates lookup -> classify -> synthesize -> publish -> persist.
pub struct AlertPipeline {
    weather: Arc<dyn WeatherService>,
    tts: Arc<dyn TextToSpeechService>,
    blobs: Arc<dyn BlobStorage>,
    ledger: Ledger,
    scratch_dir: PathBuf,
}

impl AlertPipeline {
    /// Creates the pipeline and its scratch directory for transient audio.
    pub fn new(
        weather: Arc<dyn WeatherService>,
        tts: Arc<dyn TextToSpeechService>,
        blobs: Arc<dyn BlobStorage>,
        ledger: Ledger,
        scratch_dir: impl AsRef<Path>,
    ) -> std::io::Result<Self> {
        let scratch_dir = scratch_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&scratch_dir)?;
        Ok(Self {
            weather,
            tts,
            blobs,
            ledger,
            scratch_dir,
        })
    }

    /// Runs one evaluation. Infallible at the signature level: every
    /// upstream failure is folded into the result. No stage is retried; the
    /// caller's cadence is the retry policy.
    pub async fn produce(&self, config: &PipelineConfig) -> PipelineResult {
        // Stage 1: current temperature. A lookup failure ends the run before
        // any category is known.
        let temperature = match self
            .weather
            .current_temperature(config.latitude, config.longitude)
            .await
        {
            Ok(t) => t,
            Err(e) => {
                warn!(error = %e, "weather lookup failed");
                return PipelineResult::Failed {
                    stage: PipelineStage::Lookup,
                    category: None,
                    temperature: None,
                    message: None,
                };
            }
        };

        // Stage 2: classify. In range means done, and cheap: one upstream
        // call, nothing persisted or published.
        let category = match classify(temperature, config.target_average, config.margin) {
            TempClass::Normal => {
                debug!(temperature, "temperature within normal range, no alert");
                return PipelineResult::Normal {
                    temperature,
                    target_average: config.target_average,
                    margin: config.margin,
                };
            }
            TempClass::OutOfRange(c) => c,
        };

        // Stage 3: message and artifact name.
        let content = build_alert_content(category, temperature, config.include_temperature);

        // Stage 4: synthesize and park the bytes in the scratch directory.
        // Nothing exists yet on a synthesis failure, so there is nothing to
        // clean up.
        let audio = match self.tts.synthesize(&content.message).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(error = %e, category = %category, "speech synthesis failed");
                return PipelineResult::failed_at(
                    PipelineStage::Synthesis,
                    category,
                    temperature,
                    &content.message,
                );
            }
        };
        let scratch_path = self.scratch_dir.join(&content.artifact_name);
        if let Err(e) = tokio::fs::write(&scratch_path, &audio).await {
            warn!(error = %e, path = %scratch_path.display(),
                "could not write transient audio file");
            return PipelineResult::failed_at(
                PipelineStage::Synthesis,
                category,
                temperature,
                &content.message,
            );
        }
        // From here on, the scratch file is removed whichever way we leave.
        let _scratch = ScratchFile {
            path: scratch_path,
        };

        // Stage 5: publish to durable storage. An empty URL from the store
        // is treated the same as a publish failure.
        let audio_url = match self.blobs.publish(&audio, &content.artifact_name).await {
            Ok(url) if !url.is_empty() => url,
            Ok(_) => {
                warn!(category = %category, "blob publish returned an empty URL");
                return PipelineResult::failed_at(
                    PipelineStage::Publish,
                    category,
                    temperature,
                    &content.message,
                );
            }
            Err(e) => {
                warn!(error = %e, category = %category, "blob publish failed");
                return PipelineResult::failed_at(
                    PipelineStage::Publish,
                    category,
                    temperature,
                    &content.message,
                );
            }
        };

        // Stage 6: persist the alert record. A failure here deliberately
        // leaves the published blob in place: an orphan artifact is the
        // accepted cost of not running a compensating transaction.
        let record = AlertRecord {
            id: Uuid::nil(),
            subject: config.subject.clone(),
            category,
            current_temperature: temperature,
            target_average: config.target_average,
            margin: config.margin,
            message: content.message.clone(),
            audio_url: audio_url.clone(),
            active: true,
            created_at: Utc::now(),
        };
        let alert_id = match self.ledger.append_alert(record).await {
            Ok(id) => id,
            Err(e) => {
                warn!(error = %e, category = %category, "alert persistence failed");
                return PipelineResult::failed_at(
                    PipelineStage::Persist,
                    category,
                    temperature,
                    &content.message,
                );
            }
        };

        PipelineResult::Produced {
            alert_id,
            category,
            temperature,
            message: content.message,
            audio_url,
        }
    }
}
