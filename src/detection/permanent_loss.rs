use chrono::NaiveDateTime;
use crate::input::Measurement;
use super::compliance::{classify, Compliance};

pub const DEFAULT_ABNORMAL_FRACTION: f64 = 0.8;
pub const MIN_FOLLOW_UP_READINGS: usize = 3;

/// Decides whether creatinine stayed elevated after an injury.
///
/// `readings` is the time-sorted suffix of the timeline starting at the injury. The walk stops at
/// the first reading past `horizon_days` or at a repeated timestamp; at least `min_readings`
/// collected readings are required, and at least `abnormal_fraction` of them must be above the
/// normal band.
pub fn check_permanent_loss(
    readings: &[Measurement],
    current_date: NaiveDateTime,
    baseline: f64,
    horizon_days: i64,
    abnormal_fraction: f64,
    min_readings: usize,
) -> bool {
    let mut dates_seen: Vec<NaiveDateTime> = Vec::new();
    let mut abnormal = 0usize;

    for reading in readings {
        let delta_days = (reading.timestamp - current_date).num_days();
        if delta_days > horizon_days || dates_seen.contains(&reading.timestamp) {
            break;
        }

        dates_seen.push(reading.timestamp);
        if classify(baseline, reading.cr_value) == Compliance::AboveNormal {
            abnormal += 1;
        }
    }

    let collected = dates_seen.len();
    collected >= min_readings.max(1)
        && abnormal as f64 / collected as f64 >= abnormal_fraction
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn day(offset: i64) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2022, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap()
            + Duration::days(offset)
    }

    fn series(points: &[(i64, f64)]) -> Vec<Measurement> {
        points.iter()
            .map(|&(offset, cr_value)| Measurement {
                patient_id: "p".to_string(),
                timestamp: day(offset),
                cr_value,
            })
            .collect()
    }

    fn check(readings: &[Measurement], horizon_days: i64) -> bool {
        check_permanent_loss(
            readings,
            day(0),
            1.0,
            horizon_days,
            DEFAULT_ABNORMAL_FRACTION,
            MIN_FOLLOW_UP_READINGS,
        )
    }

    #[test]
    fn test_sustained_elevation_is_loss() {
        let readings = series(&[(0, 2.5), (10, 2.4), (20, 2.6), (29, 2.2)]);
        assert!(check(&readings, 30));
    }

    #[test]
    fn test_recovery_is_not_loss() {
        let readings = series(&[(0, 2.5), (10, 1.1), (20, 1.0), (29, 0.9)]);
        assert!(!check(&readings, 30));
    }

    #[test]
    fn test_requires_three_readings() {
        let readings = series(&[(0, 2.5), (10, 2.4)]);
        assert!(!check(&readings, 30));
    }

    #[test]
    fn test_walk_stops_at_horizon() {
        // only two readings fall inside 30 days; the long horizon sees all four
        let readings = series(&[(0, 2.5), (12, 2.4), (45, 2.6), (80, 2.3)]);
        assert!(!check(&readings, 30));
        assert!(check(&readings, 90));
    }

    #[test]
    fn test_fraction_threshold_is_inclusive() {
        // 4 of 5 abnormal = 0.8
        let readings = series(&[(0, 2.5), (5, 2.4), (10, 1.0), (15, 2.6), (20, 2.2)]);
        assert!(check(&readings, 30));
    }

    #[test]
    fn test_repeated_timestamp_ends_walk() {
        let readings = series(&[(0, 2.5), (5, 2.4), (5, 2.4), (10, 2.6)]);
        assert!(!check(&readings, 30));
    }
}
