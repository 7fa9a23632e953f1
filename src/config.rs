use serde::{Deserialize, Serialize};
use std::path::Path;
use crate::baseline::MIN_CHUNK_SIZE;
use crate::baseline::aggregator::{Aggregator, Mean, Median};
use crate::detection::permanent_loss::{DEFAULT_ABNORMAL_FRACTION, MIN_FOLLOW_UP_READINGS};
use crate::error::{AkiError, AkiResult};

/// Upper bound for every day-valued window and horizon
pub const MAX_WINDOW_DAYS: i64 = 3650;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub baseline: BaselineConfig,
    pub detection: DetectionConfig,
    pub suppression: SuppressionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BaselineConfig {
    pub chunk_penalty: f64,    // Fraction of the series used as window length
    pub min_chunk_size: usize,
    pub aggregation: AggregationMethod,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregationMethod {
    Mean,
    Median,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    pub rise_threshold: f64,   // Absolute rise in mg/dl
    pub rise_window_days: i64,
    pub relative_window_days: i64,
    pub min_lookback_readings: usize,
    pub permanent_loss: PermanentLossConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PermanentLossConfig {
    pub enabled: bool,
    pub short_horizon_days: i64,
    pub long_horizon_days: i64,
    pub abnormal_fraction: f64,
    pub min_readings: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SuppressionConfig {
    pub enabled: bool,
    pub window_days: i64,
}

impl Default for BaselineConfig {
    fn default() -> Self {
        Self {
            chunk_penalty: 0.5,
            min_chunk_size: MIN_CHUNK_SIZE,
            aggregation: AggregationMethod::Mean,
        }
    }
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            rise_threshold: 0.3,
            rise_window_days: 2,
            relative_window_days: 7,
            min_lookback_readings: 2,
            permanent_loss: PermanentLossConfig::default(),
        }
    }
}

impl Default for PermanentLossConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            short_horizon_days: 30,
            long_horizon_days: 90,
            abnormal_fraction: DEFAULT_ABNORMAL_FRACTION,
            min_readings: MIN_FOLLOW_UP_READINGS,
        }
    }
}

impl Default for SuppressionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            window_days: 7,
        }
    }
}

impl AggregationMethod {
    pub fn aggregator(&self) -> Box<dyn Aggregator> {
        match self {
            AggregationMethod::Mean => Box::new(Mean),
            AggregationMethod::Median => Box::new(Median),
        }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> AkiResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> AkiResult<()> {
        self.validate_baseline()?;
        self.validate_detection()?;

        check_days("suppression.window_days", self.suppression.window_days)?;

        Ok(())
    }

    fn validate_baseline(&self) -> AkiResult<()> {
        let penalty = self.baseline.chunk_penalty;
        if !(penalty > 0.0 && penalty <= 1.0) {
            return Err(AkiError::InvalidConfig(
                format!("Chunk penalty must be in (0, 1], got {}", penalty)
            ));
        }

        if self.baseline.min_chunk_size == 0 {
            return Err(AkiError::InvalidConfig(
                "Minimum chunk size must be at least 1".to_string()
            ));
        }

        Ok(())
    }

    fn validate_detection(&self) -> AkiResult<()> {
        let detection = &self.detection;

        if !(detection.rise_threshold > 0.0) {
            return Err(AkiError::InvalidConfig(
                "Rise threshold must be positive".to_string()
            ));
        }

        check_days("detection.rise_window_days", detection.rise_window_days)?;
        check_days("detection.relative_window_days", detection.relative_window_days)?;

        let loss = &detection.permanent_loss;
        if loss.short_horizon_days <= 0 || loss.long_horizon_days <= 0 {
            return Err(AkiError::InvalidConfig(
                "Permanent loss horizons must be positive".to_string()
            ));
        }

        check_days("permanent_loss.long_horizon_days", loss.long_horizon_days)?;

        if loss.short_horizon_days > loss.long_horizon_days {
            return Err(AkiError::InvalidConfig(format!(
                "Short permanent loss horizon ({} days) exceeds the long horizon ({} days)",
                loss.short_horizon_days, loss.long_horizon_days
            )));
        }

        if !(loss.abnormal_fraction > 0.0 && loss.abnormal_fraction <= 1.0) {
            return Err(AkiError::InvalidConfig(
                format!("Abnormal fraction must be in (0, 1], got {}", loss.abnormal_fraction)
            ));
        }

        Ok(())
    }
}

fn check_days(name: &str, days: i64) -> AkiResult<()> {
    if !(0..=MAX_WINDOW_DAYS).contains(&days) {
        return Err(AkiError::InvalidConfig(
            format!("{} must be between 0 and {} days, got {}", name, MAX_WINDOW_DAYS, days)
        ));
    }
    Ok(())
}
