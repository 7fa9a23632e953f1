pub mod variability;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use rand::{Rng, SeedableRng};
use rand::rngs::StdRng;
use log::{debug, info};
use crate::error::{AkiError, AkiResult};
use crate::input::Measurement;

pub use variability::*;

/// Lowest creatinine the generator emits (mg/dl)
const ASSAY_FLOOR: f64 = 0.1;

#[derive(Debug, Clone)]
pub struct SyntheticConfig {
    pub patients: usize,
    pub readings_per_patient: usize,
    pub baseline_median: f64,      // mg/dl
    pub baseline_cv_percent: f64,  // Between-patient variability
    pub assay_sd: f64,             // Proportional residual error
    pub max_gap_days: i64,
    pub aki_probability: f64,
    pub persistent_probability: f64,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            patients: 20,
            readings_per_patient: 40,
            baseline_median: 0.9,
            baseline_cv_percent: 20.0,
            assay_sd: 0.05,
            max_gap_days: 3,
            aki_probability: 0.4,
            persistent_probability: 0.3,
        }
    }
}

/// Shape of the injury episode applied to one synthetic patient.
#[derive(Debug, Clone, Copy)]
struct Episode {
    onset: usize,
    peak_factor: f64,
    persistent: bool,
}

impl Episode {
    const RAMP: usize = 3;
    const RECOVERY: usize = 4;

    /// Multiplier of the true baseline at reading `index`.
    fn factor(&self, index: usize) -> f64 {
        if index < self.onset {
            return 1.0;
        }

        let since = index - self.onset;
        if since < Self::RAMP {
            return 1.0 + (self.peak_factor - 1.0) * (since + 1) as f64 / Self::RAMP as f64;
        }
        if self.persistent {
            return self.peak_factor;
        }

        let recovering = since - Self::RAMP;
        if recovering < Self::RECOVERY {
            let remaining = (Self::RECOVERY - recovering - 1) as f64 / Self::RECOVERY as f64;
            1.0 + (self.peak_factor - 1.0) * remaining
        } else {
            1.0
        }
    }
}

pub struct CohortGenerator {
    config: SyntheticConfig,
    rng: StdRng,
}

impl CohortGenerator {
    pub fn new(config: SyntheticConfig, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };

        Self { config, rng }
    }

    pub fn generate(&mut self) -> AkiResult<Vec<Measurement>> {
        if self.config.max_gap_days < 1 {
            return Err(AkiError::Validation("Sampling gap must be at least one day".to_string()));
        }

        info!("Generating synthetic creatinine histories for {} patients", self.config.patients);

        let mut measurements = Vec::with_capacity(self.config.patients * self.config.readings_per_patient);
        for patient in 1..=self.config.patients {
            measurements.extend(self.generate_patient(patient)?);
        }

        Ok(measurements)
    }

    fn generate_patient(&mut self, patient: usize) -> AkiResult<Vec<Measurement>> {
        let patient_id = format!("P{:04}", patient);
        let n = self.config.readings_per_patient;

        let true_baseline = draw_true_baseline(
            self.config.baseline_median,
            self.config.baseline_cv_percent,
            &mut self.rng,
        )?;

        let episode = if n >= 6 && self.rng.gen_bool(self.config.aki_probability) {
            Some(Episode {
                onset: self.rng.gen_range(n / 3..2 * n / 3),
                peak_factor: self.rng.gen_range(1.6..3.5),
                persistent: self.rng.gen_bool(self.config.persistent_probability),
            })
        } else {
            None
        };
        debug!("Patient {}: baseline {:.3}, episode {:?}", patient_id, true_baseline, episode);

        let mut timestamp = start_date() + Duration::hours(self.rng.gen_range(0..24 * 30));
        let mut readings = Vec::with_capacity(n);

        for index in 0..n {
            let factor = episode.map_or(1.0, |e| e.factor(index));
            let observed = apply_assay_error(
                true_baseline * factor,
                self.config.assay_sd,
                ASSAY_FLOOR,
                &mut self.rng,
            )?;

            readings.push(Measurement {
                patient_id: patient_id.clone(),
                timestamp,
                cr_value: (observed * 100.0).round() / 100.0,
            });

            timestamp += Duration::days(self.rng.gen_range(1..=self.config.max_gap_days));
        }

        Ok(readings)
    }
}

fn start_date() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2020, 1, 1)
        .and_then(|date| date.and_hms_opt(8, 0, 0))
        .unwrap_or_default()
}
