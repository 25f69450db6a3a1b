//! crates/caretaker_core/src/scheduler.rs
//!
//! Drives the alert pipeline unattended on a fixed interval. One recurring
//! job at most; a due tick that finds the previous one still running is
//! skipped, never queued, and a tick that was missed entirely (process
//! paused, clock skew) is dropped rather than fired late.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::domain::PipelineConfig;
use crate::pipeline::{AlertPipeline, PipelineResult};

/// The outcome of one scheduled or manual tick.
#[derive(Debug)]
pub enum TickOutcome {
    Completed(PipelineResult),
    /// Another tick was still running; this one was not executed.
    Skipped,
}

/// Point-in-time view of the scheduler, for the status endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct SchedulerStatus {
    pub enabled: bool,
    pub interval_minutes: u64,
    pub subject: String,
    pub next_fire_time: Option<DateTime<Utc>>,
}

struct SchedulerInner {
    enabled: bool,
    interval_minutes: u64,
    config: PipelineConfig,
    next_fire: Option<DateTime<Utc>>,
    handle: Option<JoinHandle<()>>,
    cancel: Option<CancellationToken>,
}

/// The periodic driver of [`AlertPipeline::produce`].
///
/// Construction binds a pipeline and an initial configuration but does not
/// start anything; the scheduler stays disabled until [`enable`] is called.
///
/// [`enable`]: AlertScheduler::enable
pub struct AlertScheduler {
    pipeline: Arc<AlertPipeline>,
    inner: Mutex<SchedulerInner>,
    /// Single-flight slot shared by scheduled and manual ticks. Held across
    /// the whole pipeline run; `try_lock` failure means "skip".
    run_slot: Arc<tokio::sync::Mutex<()>>,
}

impl AlertScheduler {
    pub fn new(pipeline: Arc<AlertPipeline>, config: PipelineConfig) -> Arc<Self> {
        Arc::new(Self {
            pipeline,
            inner: Mutex::new(SchedulerInner {
                enabled: false,
                interval_minutes: 0,
                config,
                next_fire: None,
                handle: None,
                cancel: None,
            }),
            run_slot: Arc::new(tokio::sync::Mutex::new(())),
        })
    }

    /// Starts (or re-configures) the recurring job. Calling this while a job
    /// is already registered replaces it; there is never more than one.
    pub fn enable(self: &Arc<Self>, config: PipelineConfig, interval_minutes: u64) {
        let interval_minutes = interval_minutes.max(1);
        let mut inner = self.inner.lock().expect("scheduler state poisoned");

        // Tear down any previous registration before installing the new one.
        if let Some(cancel) = inner.cancel.take() {
            cancel.cancel();
        }
        if let Some(handle) = inner.handle.take() {
            handle.abort();
        }

        let cancel = CancellationToken::new();
        let period = Duration::from_secs(interval_minutes * 60);
        let handle = tokio::spawn(Self::run_loop(
            Arc::clone(self),
            config.clone(),
            period,
            cancel.clone(),
        ));

        inner.enabled = true;
        inner.interval_minutes = interval_minutes;
        inner.config = config;
        inner.next_fire = Some(Utc::now() + chrono::Duration::from_std(period).unwrap_or_default());
        inner.handle = Some(handle);
        inner.cancel = Some(cancel);
        info!(interval_minutes, "alert scheduler enabled");
    }

    /// Cancels the recurring job, if any.
    pub fn disable(&self) {
        let mut inner = self.inner.lock().expect("scheduler state poisoned");
        if let Some(cancel) = inner.cancel.take() {
            cancel.cancel();
        }
        if let Some(handle) = inner.handle.take() {
            handle.abort();
        }
        inner.enabled = false;
        inner.next_fire = None;
        info!("alert scheduler disabled");
    }

    async fn run_loop(
        scheduler: Arc<Self>,
        config: PipelineConfig,
        period: Duration,
        cancel: CancellationToken,
    ) {
        let mut ticker = tokio::time::interval(period);
        // Ticks that pile up while we were paused collapse into one; a tick
        // more than a period late is dropped, not fired in a burst.
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // interval() fires immediately; consume that so the first real tick
        // lands one full period after enable().
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    // The next boundary is fixed by the schedule, not by how
                    // long this run takes; publish it before running.
                    scheduler.note_fired(period);
                    let outcome = scheduler.tick(&config).await;
                    match outcome {
                        TickOutcome::Skipped => {
                            warn!("scheduled tick skipped: previous run still in flight");
                        }
                        TickOutcome::Completed(result) => log_result(&result),
                    }
                }
            }
        }
    }

    /// One single-flight pipeline run. Shared by the loop and `run_once`.
    async fn tick(&self, config: &PipelineConfig) -> TickOutcome {
        let Ok(_guard) = self.run_slot.try_lock() else {
            return TickOutcome::Skipped;
        };
        TickOutcome::Completed(self.pipeline.produce(config).await)
    }

    /// Manual, on-demand invocation. Bypasses the schedule but shares the
    /// single-flight slot with scheduled ticks.
    pub async fn run_once(&self) -> TickOutcome {
        let config = {
            let inner = self.inner.lock().expect("scheduler state poisoned");
            inner.config.clone()
        };
        self.tick(&config).await
    }

    fn note_fired(&self, period: Duration) {
        let mut inner = self.inner.lock().expect("scheduler state poisoned");
        inner.next_fire =
            Some(Utc::now() + chrono::Duration::from_std(period).unwrap_or_default());
    }

    pub fn status(&self) -> SchedulerStatus {
        let inner = self.inner.lock().expect("scheduler state poisoned");
        SchedulerStatus {
            enabled: inner.enabled,
            interval_minutes: inner.interval_minutes,
            subject: inner.config.subject.clone(),
            next_fire_time: inner.next_fire,
        }
    }
}

/// Records the tick result without letting any outcome unwind the loop.
fn log_result(result: &PipelineResult) {
    match result {
        PipelineResult::Normal { temperature, .. } => {
            info!(temperature, "tick: temperature normal, no alert");
        }
        PipelineResult::Produced {
            alert_id,
            category,
            audio_url,
            ..
        } => {
            info!(%alert_id, %category, audio_url, "tick: alert produced");
        }
        PipelineResult::Failed { stage, .. } => {
            error!(?stage, "tick: pipeline failed");
        }
    }
}
