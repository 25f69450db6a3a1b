//! crates/caretaker_core/src/evaluator.rs
//!
//! Temperature classification and alert content building. Both are pure
//! functions; the pipeline composes them with the fallible stages.

use uuid::Uuid;

use crate::domain::{AlertCategory, TempClass};

/// Classifies `current` against the target range.
///
/// Returns `Normal` iff `target - margin < current < target + margin`; the
/// boundaries themselves are out of range. The caller guarantees
/// `margin > 0`; a non-positive margin is a contract violation upstream,
/// not a condition handled here.
pub fn classify(current: f64, target: f64, margin: f64) -> TempClass {
    if target - margin < current && current < target + margin {
        TempClass::Normal
    } else if current <= target - margin {
        TempClass::OutOfRange(AlertCategory::BelowRange)
    } else {
        TempClass::OutOfRange(AlertCategory::AboveRange)
    }
}

/// The spoken message and artifact name for one alert.
#[derive(Debug, Clone)]
pub struct AlertContent {
    pub message: String,
    /// `{tag}_{suffix}.wav`; the random suffix keeps concurrent productions
    /// for the same subject from colliding in blob storage. Uniqueness is
    /// best-effort, not coordinated.
    pub artifact_name: String,
}

/// Builds the message and artifact name for `category`.
///
/// Message templates are fixed per category; the temperature suffix (one
/// decimal place) is appended only when `include_temperature` is set.
pub fn build_alert_content(
    category: AlertCategory,
    temperature: f64,
    include_temperature: bool,
) -> AlertContent {
    let base = match category {
        AlertCategory::BelowRange => "It's cold outside, put on a warm coat.",
        AlertCategory::AboveRange => "It's hot outside, wear light clothing.",
    };
    let message = if include_temperature {
        format!("{base} Current temperature {temperature:.1} degrees.")
    } else {
        base.to_string()
    };

    let suffix = &Uuid::new_v4().simple().to_string()[..6];
    let artifact_name = format!("{}_{}.wav", category.tag(), suffix);

    AlertContent {
        message,
        artifact_name,
    }
}
