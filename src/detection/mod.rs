pub mod compliance;
pub mod level;
pub mod permanent_loss;
pub mod rules;
pub mod summary;
pub mod suppression;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use log::{debug, info, warn};
use crate::baseline::PatientBaseline;
use crate::config::{Config, PermanentLossConfig};
use crate::input::{Measurement, PatientTimeline};

pub use compliance::Compliance;
pub use level::AkiLevel;
pub use summary::DetectionSummary;

use permanent_loss::check_permanent_loss;
use rules::RuleSet;

/// Graded reading of one patient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AkiEvent {
    pub patient_id: String,
    pub timestamp: NaiveDateTime,
    pub cr_value: f64,
    pub level: AkiLevel,
    pub compliance: Compliance,
}

#[derive(Debug, Clone, Serialize)]
pub struct SkippedPatient {
    pub patient_id: String,
    pub reason: String,
}

/// Events of all analysed patients plus the patients that could not be analysed.
#[derive(Debug, Default)]
pub struct DetectionRun {
    pub events: Vec<AkiEvent>,
    pub patients_analysed: usize,
    pub skipped: Vec<SkippedPatient>,
}

pub struct AkiDetector {
    rules: RuleSet,
    min_lookback_readings: usize,
    permanent_loss: PermanentLossConfig,
    suppression_enabled: bool,
    suppression_window_days: i64,
}

impl AkiDetector {
    pub fn new(config: &Config) -> Self {
        Self {
            rules: RuleSet::from_config(&config.detection),
            min_lookback_readings: config.detection.min_lookback_readings,
            permanent_loss: config.detection.permanent_loss.clone(),
            suppression_enabled: config.suppression.enabled,
            suppression_window_days: config.suppression.window_days,
        }
    }

    /// Grades every reading of a patient, then suppresses duplicates if enabled.
    pub fn detect_patient(&self, timeline: &PatientTimeline, baseline: f64) -> Vec<AkiEvent> {
        let mut events = self.evaluate_patient(timeline, baseline);
        if self.suppression_enabled {
            suppression::suppress_duplicates(&mut events, self.suppression_window_days);
        }
        events
    }

    /// Grades every reading of a patient without duplicate suppression. One event per reading.
    pub fn evaluate_patient(&self, timeline: &PatientTimeline, baseline: f64) -> Vec<AkiEvent> {
        let readings = &timeline.measurements;
        let mut events = Vec::with_capacity(readings.len());

        for index in 0..readings.len() {
            let current = &readings[index];
            let level = self.grade_reading(readings, index, baseline);

            events.push(AkiEvent {
                patient_id: timeline.patient_id.clone(),
                timestamp: current.timestamp,
                cr_value: current.cr_value,
                level,
                compliance: compliance::classify(baseline, current.cr_value),
            });
        }

        events
    }

    fn grade_reading(&self, readings: &[Measurement], index: usize, baseline: f64) -> AkiLevel {
        let current = &readings[index];
        let days_before = |m: &Measurement| (current.timestamp - m.timestamp).num_days();

        // Trailing lookback including the current reading
        let start = readings[..=index]
            .partition_point(|m| days_before(m) > self.rules.relative_window_days);
        let lookback = &readings[start..=index];

        let mut level = lookback.iter()
            .map(|past| self.rules.absolute_rise(current.cr_value, past.cr_value, days_before(past)))
            .max()
            .unwrap_or(AkiLevel::NoRisk);

        let rising = lookback.iter().all(|past| past.cr_value <= current.cr_value);
        if rising && lookback.len() >= self.min_lookback_readings {
            let relative = lookback.iter()
                .map(|past| self.rules.relative_rise(baseline, current.cr_value, days_before(past)))
                .max()
                .unwrap_or(AkiLevel::NoRisk);
            level = level.max(relative);
        }

        if level.is_injury() && self.permanent_loss.enabled {
            level = self.escalate(&readings[index..], current.timestamp, baseline, level);
        }

        level
    }

    fn escalate(
        &self,
        follow_up: &[Measurement],
        current_date: NaiveDateTime,
        baseline: f64,
        level: AkiLevel,
    ) -> AkiLevel {
        let loss = &self.permanent_loss;
        let sustained = |horizon_days| check_permanent_loss(
            follow_up,
            current_date,
            baseline,
            horizon_days,
            loss.abnormal_fraction,
            loss.min_readings,
        );

        if sustained(loss.long_horizon_days) {
            AkiLevel::EndStage
        } else if sustained(loss.short_horizon_days) {
            AkiLevel::Loss
        } else {
            level
        }
    }

    /// Runs detection for every patient with a usable baseline. Patients without one are skipped
    /// and reported; they never abort the batch.
    pub fn detect_all(
        &self,
        timelines: &[PatientTimeline],
        baselines: &[PatientBaseline],
    ) -> DetectionRun {
        info!("Running AKI detection for {} patients", timelines.len());

        let by_patient: HashMap<&str, &PatientBaseline> = baselines.iter()
            .map(|b| (b.patient_id.as_str(), b))
            .collect();

        let mut run = DetectionRun::default();

        for timeline in timelines {
            let baseline = match by_patient.get(timeline.patient_id.as_str()) {
                Some(baseline) => baseline,
                None => {
                    warn!("Patient {}: no baseline available, skipping", timeline.patient_id);
                    run.skipped.push(SkippedPatient {
                        patient_id: timeline.patient_id.clone(),
                        reason: "no baseline available".to_string(),
                    });
                    continue;
                }
            };

            let value = match &baseline.outcome {
                Ok(value) => *value,
                Err(reason) => {
                    warn!("Patient {}: baseline undeterminable, skipping", timeline.patient_id);
                    run.skipped.push(SkippedPatient {
                        patient_id: timeline.patient_id.clone(),
                        reason: reason.to_string(),
                    });
                    continue;
                }
            };

            let events = self.detect_patient(timeline, value);
            debug!(
                "Patient {}: {} readings, {} graded as injury",
                timeline.patient_id,
                events.len(),
                events.iter().filter(|e| e.level.is_injury()).count()
            );

            run.events.extend(events);
            run.patients_analysed += 1;
        }

        info!(
            "Detection completed: {} patients analysed, {} skipped",
            run.patients_analysed,
            run.skipped.len()
        );
        run
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::baseline::BaselineFailure;
    use crate::synthetic::{CohortGenerator, SyntheticConfig};
    use chrono::{Duration, NaiveDate};

    fn day(offset: i64) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2022, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap()
            + Duration::days(offset)
    }

    fn timeline(points: &[(i64, f64)]) -> PatientTimeline {
        let measurements = points.iter()
            .map(|&(offset, cr_value)| Measurement {
                patient_id: "p1".to_string(),
                timestamp: day(offset),
                cr_value,
            })
            .collect();
        PatientTimeline::new("p1".to_string(), measurements)
    }

    fn levels(events: &[AkiEvent]) -> Vec<AkiLevel> {
        events.iter().map(|e| e.level).collect()
    }

    fn raw_detector() -> AkiDetector {
        let mut config = Config::default();
        config.suppression.enabled = false;
        AkiDetector::new(&config)
    }

    #[test]
    fn test_absolute_rise_within_two_days() {
        let events = raw_detector().evaluate_patient(&timeline(&[(0, 1.0), (1, 1.5)]), 1.0);
        assert_eq!(levels(&events), vec![AkiLevel::NoRisk, AkiLevel::Risk]);
    }

    #[test]
    fn test_day_deltas_truncate_to_whole_days() {
        let at = |offset: Duration| Measurement {
            patient_id: "p1".to_string(),
            timestamp: day(0) + offset,
            cr_value: 1.35,
        };
        let start = Measurement { patient_id: "p1".to_string(), timestamp: day(0), cr_value: 1.0 };

        // 2 days 23 hours still counts as 2 days
        let late = PatientTimeline::new(
            "p1".to_string(),
            vec![start.clone(), at(Duration::days(2) + Duration::hours(23))],
        );
        let events = raw_detector().evaluate_patient(&late, 1.0);
        assert_eq!(events[1].level, AkiLevel::Risk);

        let too_late = PatientTimeline::new("p1".to_string(), vec![start, at(Duration::days(3))]);
        let events = raw_detector().evaluate_patient(&too_late, 1.0);
        assert_eq!(events[1].level, AkiLevel::NoRisk);
    }

    #[test]
    fn test_rise_outside_two_days_needs_relative_rule() {
        // 0.4 rise over 3 days, below 1.5x baseline
        let events = raw_detector().evaluate_patient(&timeline(&[(0, 1.0), (3, 1.4)]), 1.0);
        assert_eq!(levels(&events), vec![AkiLevel::NoRisk, AkiLevel::NoRisk]);
    }

    #[test]
    fn test_relative_rise_failure() {
        let events = raw_detector()
            .evaluate_patient(&timeline(&[(0, 1.0), (2, 1.2), (5, 3.5)]), 1.0);
        assert_eq!(events[2].level, AkiLevel::Failure);
        assert_eq!(events[2].compliance, Compliance::AboveNormal);
    }

    #[test]
    fn test_relative_rule_skipped_when_lookback_not_rising() {
        // 2.2 within 7 days falls to 2.1: the earlier higher value blocks the relative rule
        let events = raw_detector()
            .evaluate_patient(&timeline(&[(0, 2.2), (4, 2.1)]), 1.0);
        assert_eq!(events[1].level, AkiLevel::NoRisk);
    }

    #[test]
    fn test_relative_rule_needs_two_readings() {
        let events = raw_detector().evaluate_patient(&timeline(&[(0, 2.5)]), 1.0);
        assert_eq!(levels(&events), vec![AkiLevel::NoRisk]);
    }

    #[test]
    fn test_lookback_drops_readings_older_than_seven_days() {
        // the 2.9 reading on day 0 is outside the lookback of day 8
        let events = raw_detector()
            .evaluate_patient(&timeline(&[(0, 2.9), (6, 1.0), (8, 2.5)]), 1.0);
        assert_eq!(events[2].level, AkiLevel::Injury);
    }

    #[test]
    fn test_sustained_elevation_escalates_to_loss() {
        let points = [(0, 1.0), (1, 1.1), (2, 2.5), (12, 2.6), (25, 2.7), (60, 1.0), (80, 1.0)];
        let events = raw_detector().evaluate_patient(&timeline(&points), 1.0);
        assert_eq!(events[2].level, AkiLevel::Loss);
    }

    #[test]
    fn test_long_horizon_escalates_to_end_stage() {
        let points = [(0, 1.0), (1, 1.1), (2, 2.5), (40, 2.6), (70, 2.7), (88, 2.8)];
        let events = raw_detector().evaluate_patient(&timeline(&points), 1.0);
        assert_eq!(events[2].level, AkiLevel::EndStage);
    }

    #[test]
    fn test_escalation_can_be_disabled() {
        let mut config = Config::default();
        config.suppression.enabled = false;
        config.detection.permanent_loss.enabled = false;

        let points = [(0, 1.0), (1, 1.1), (2, 2.5), (12, 2.6), (25, 2.7)];
        let events = AkiDetector::new(&config).evaluate_patient(&timeline(&points), 1.0);
        assert_eq!(events[2].level, AkiLevel::Injury);
    }

    #[test]
    fn test_suppression_keeps_highest_value() {
        let detector = AkiDetector::new(&Config::default());
        let points = [(0, 1.0), (1, 1.0), (3, 2.0), (5, 2.5), (40, 1.0)];
        let raw = raw_detector().evaluate_patient(&timeline(&points), 1.0);
        assert_eq!(raw[2].level, AkiLevel::Injury);
        assert_eq!(raw[3].level, AkiLevel::Injury);

        let events = detector.detect_patient(&timeline(&points), 1.0);
        assert_eq!(events[2].level, AkiLevel::NoRisk);
        assert_eq!(events[3].level, AkiLevel::Injury);
    }

    #[test]
    fn test_detect_all_skips_failed_baselines() {
        let mut other = timeline(&[(0, 1.0), (1, 1.6)]);
        other.patient_id = "p2".to_string();
        for m in &mut other.measurements {
            m.patient_id = "p2".to_string();
        }

        let baselines = vec![
            PatientBaseline {
                patient_id: "p1".to_string(),
                outcome: Err(BaselineFailure::NoQualifyingWindow { windows: 0 }),
            },
            PatientBaseline { patient_id: "p2".to_string(), outcome: Ok(1.0) },
        ];

        let run = AkiDetector::new(&Config::default())
            .detect_all(&[timeline(&[(0, 1.0)]), other], &baselines);

        assert_eq!(run.patients_analysed, 1);
        assert_eq!(run.skipped.len(), 1);
        assert_eq!(run.skipped[0].patient_id, "p1");
        assert_eq!(run.events.len(), 2);
        assert!(run.events.iter().all(|e| e.patient_id == "p2"));
    }

    #[test]
    fn test_suppression_properties_on_synthetic_cohort() {
        let synthetic = SyntheticConfig { patients: 25, ..SyntheticConfig::default() };
        let measurements = CohortGenerator::new(synthetic, Some(7)).generate().unwrap();
        let timelines = crate::input::group_timelines(measurements);
        let baselines = crate::baseline::estimate_all(&timelines, &Config::default().baseline);

        let detector = raw_detector();
        for (timeline, baseline) in timelines.iter().zip(&baselines) {
            let Some(value) = baseline.value() else { continue };

            let raw = detector.evaluate_patient(timeline, value);
            let mut once = raw.clone();
            suppression::suppress_duplicates(&mut once, 7);
            let mut twice = once.clone();
            suppression::suppress_duplicates(&mut twice, 7);

            assert_eq!(once, twice);
            for (before, after) in raw.iter().zip(&once) {
                assert!(after.level <= before.level);
                assert_eq!(after.timestamp, before.timestamp);
            }
        }
    }
}
