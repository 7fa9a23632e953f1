pub mod aggregator;
pub mod chunker;
pub mod formulas;

use serde::Serialize;
use thiserror::Error;
use log::{debug, info, warn};
use crate::config::BaselineConfig;
use crate::input::PatientTimeline;

use aggregator::{sample_variance, Aggregator};

pub const MIN_CHUNK_SIZE: usize = 10;

/// Why no baseline could be derived for a patient.
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
pub enum BaselineFailure {
    #[error("timeline has no measurements")]
    EmptyTimeline,

    #[error("none of the {windows} windows qualified")]
    NoQualifyingWindow { windows: usize },

    #[error("supplied baseline is not a positive finite number")]
    NotProvided,
}

#[derive(Debug, Clone)]
pub struct PatientBaseline {
    pub patient_id: String,
    pub outcome: Result<f64, BaselineFailure>,
}

impl PatientBaseline {
    pub fn value(&self) -> Option<f64> {
        self.outcome.as_ref().ok().copied()
    }

    /// Tabular form: an undeterminable baseline is written as +infinity.
    pub fn sentinel_value(&self) -> f64 {
        self.value().unwrap_or(f64::INFINITY)
    }
}

pub struct BaselineEstimator {
    penalty: f64,
    min_chunk_size: usize,
    aggregator: Box<dyn Aggregator>,
}

impl BaselineEstimator {
    pub fn new(config: &BaselineConfig) -> Self {
        Self {
            penalty: config.chunk_penalty,
            min_chunk_size: config.min_chunk_size,
            aggregator: config.aggregation.aggregator(),
        }
    }

    pub fn estimate(&self, values: &[f64]) -> Result<f64, BaselineFailure> {
        estimate_single(values, self.penalty, self.min_chunk_size, self.aggregator.as_ref())
    }
}

/// Window length for a series: `round(len * penalty)` (ties to even), at least `min_size`.
pub fn chunk_size(len: usize, penalty: f64, min_size: usize) -> usize {
    let size = (len as f64 * penalty).round_ties_even() as usize;
    size.max(min_size)
}

/// Searches the overlapping windows for the one with both the lowest level and the lowest
/// variance. A window replaces the current best only if it improves both at once.
pub fn estimate_single(
    values: &[f64],
    penalty: f64,
    min_chunk_size: usize,
    aggregator: &dyn Aggregator,
) -> Result<f64, BaselineFailure> {
    if values.is_empty() {
        return Err(BaselineFailure::EmptyTimeline);
    }

    let windows = chunker::chunk(values, chunk_size(values.len(), penalty, min_chunk_size));

    let mut best_level = f64::INFINITY;
    let mut best_variance = f64::INFINITY;
    let mut found = false;

    for window in &windows {
        if window.len() < 2 {
            if windows.len() == 1 {
                best_level = window[0];
                found = true;
            }
            continue;
        }

        let level = aggregator.aggregate(window);
        let variance = sample_variance(window);

        if variance < best_variance && level < best_level {
            best_level = level;
            best_variance = variance;
            found = true;
        }
    }

    if found {
        Ok(best_level)
    } else {
        Err(BaselineFailure::NoQualifyingWindow { windows: windows.len() })
    }
}

pub fn estimate_all(timelines: &[PatientTimeline], config: &BaselineConfig) -> Vec<PatientBaseline> {
    let estimator = BaselineEstimator::new(config);
    info!(
        "Estimating baselines for {} patients ({} aggregation, penalty {})",
        timelines.len(),
        estimator.aggregator.name(),
        config.chunk_penalty
    );

    timelines.iter()
        .map(|timeline| {
            let outcome = estimator.estimate(&timeline.values());
            match &outcome {
                Ok(value) => debug!("Patient {}: baseline {:.3}", timeline.patient_id, value),
                Err(reason) => warn!(
                    "Patient {}: baseline undeterminable ({})",
                    timeline.patient_id, reason
                ),
            }

            PatientBaseline {
                patient_id: timeline.patient_id.clone(),
                outcome,
            }
        })
        .collect()
}
