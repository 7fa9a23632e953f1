use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use log::{debug, info};
use crate::error::{AkiError, AkiResult};

pub const PATIENT_ID_COLUMN: &str = "PatientID";
pub const CR_VALUE_COLUMN: &str = "Cr_Value";
pub const DATE_COLUMN: &str = "Date";
pub const BASELINE_COLUMN: &str = "Create_Baseline";

const DATE_TIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// A single serum creatinine reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub patient_id: String,
    pub timestamp: NaiveDateTime,
    pub cr_value: f64, // mg/dl
}

/// All readings of one patient, strictly ascending by timestamp.
#[derive(Debug, Clone)]
pub struct PatientTimeline {
    pub patient_id: String,
    pub measurements: Vec<Measurement>,
}

#[derive(Debug, Deserialize)]
struct MeasurementRecord {
    #[serde(rename = "PatientID")]
    patient_id: String,
    #[serde(rename = "Cr_Value")]
    cr_value: String,
    #[serde(rename = "Date")]
    date: String,
}

#[derive(Debug, Deserialize)]
struct BaselineRecord {
    #[serde(rename = "PatientID")]
    patient_id: String,
    #[serde(rename = "Create_Baseline")]
    baseline: String,
}

impl PatientTimeline {
    /// Sorts by timestamp and collapses duplicate timestamps, keeping the first-seen reading.
    pub fn new(patient_id: String, mut measurements: Vec<Measurement>) -> Self {
        measurements.sort_by_key(|m| m.timestamp);

        let before = measurements.len();
        measurements.dedup_by(|later, earlier| later.timestamp == earlier.timestamp);
        if measurements.len() < before {
            debug!(
                "Patient {}: collapsed {} duplicate timestamps",
                patient_id,
                before - measurements.len()
            );
        }

        Self { patient_id, measurements }
    }

    pub fn values(&self) -> Vec<f64> {
        self.measurements.iter().map(|m| m.cr_value).collect()
    }
}

pub fn load_measurements<P: AsRef<Path>>(path: P) -> AkiResult<Vec<Measurement>> {
    let file = std::fs::File::open(path)?;
    read_measurements(file)
}

pub fn read_measurements<R: std::io::Read>(reader: R) -> AkiResult<Vec<Measurement>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    require_columns(reader.headers()?, &[PATIENT_ID_COLUMN, CR_VALUE_COLUMN, DATE_COLUMN])?;

    let mut measurements = Vec::new();
    for (index, record) in reader.deserialize::<MeasurementRecord>().enumerate() {
        let row = index + 1;
        let record = record?;

        if record.patient_id.is_empty() {
            return Err(AkiError::InvalidInput {
                row,
                message: format!("{} is empty", PATIENT_ID_COLUMN),
            });
        }

        let cr_value = parse_creatinine(&record.cr_value, row)?;
        let timestamp = parse_timestamp(&record.date).ok_or_else(|| AkiError::InvalidInput {
            row,
            message: format!("unparseable {} '{}'", DATE_COLUMN, record.date),
        })?;

        measurements.push(Measurement {
            patient_id: record.patient_id,
            timestamp,
            cr_value,
        });
    }

    info!("Read {} creatinine measurements", measurements.len());
    Ok(measurements)
}

/// Groups measurements per patient in order of first appearance.
pub fn group_timelines(measurements: Vec<Measurement>) -> Vec<PatientTimeline> {
    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Vec<Measurement>> = HashMap::new();

    for measurement in measurements {
        if !groups.contains_key(&measurement.patient_id) {
            order.push(measurement.patient_id.clone());
        }
        groups.entry(measurement.patient_id.clone())
            .or_default()
            .push(measurement);
    }

    order.into_iter()
        .map(|patient_id| {
            let readings = groups.remove(&patient_id).unwrap_or_default();
            PatientTimeline::new(patient_id, readings)
        })
        .collect()
}

/// Loads an externally computed baseline table. Non-finite values mark undeterminable baselines.
pub fn load_baselines<P: AsRef<Path>>(path: P) -> AkiResult<Vec<(String, Option<f64>)>> {
    let file = std::fs::File::open(path)?;
    read_baselines(file)
}

pub fn read_baselines<R: std::io::Read>(reader: R) -> AkiResult<Vec<(String, Option<f64>)>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    require_columns(reader.headers()?, &[PATIENT_ID_COLUMN, BASELINE_COLUMN])?;

    let mut baselines = Vec::new();
    for (index, record) in reader.deserialize::<BaselineRecord>().enumerate() {
        let row = index + 1;
        let record = record?;
        let value: f64 = record.baseline.parse().map_err(|_| AkiError::InvalidInput {
            row,
            message: format!("non-numeric {} '{}'", BASELINE_COLUMN, record.baseline),
        })?;

        let value = if value.is_finite() && value > 0.0 { Some(value) } else { None };
        baselines.push((record.patient_id, value));
    }

    Ok(baselines)
}

pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }

    for format in DATE_TIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(dt);
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

fn parse_creatinine(raw: &str, row: usize) -> AkiResult<f64> {
    let value: f64 = raw.parse().map_err(|_| AkiError::InvalidInput {
        row,
        message: format!("non-numeric {} '{}'", CR_VALUE_COLUMN, raw),
    })?;

    if !value.is_finite() || value <= 0.0 {
        return Err(AkiError::InvalidInput {
            row,
            message: format!("{} must be a positive number, got {}", CR_VALUE_COLUMN, raw),
        });
    }

    Ok(value)
}

fn require_columns(headers: &csv::StringRecord, required: &[&str]) -> AkiResult<()> {
    for column in required {
        if !headers.iter().any(|header| header == *column) {
            return Err(AkiError::MissingColumn(column.to_string()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_and_groups_in_first_appearance_order() {
        let data = "PatientID,Cr_Value,Date,Ward\n\
                    b,1.1,2021-03-02,ICU\n\
                    a,0.9,2021-03-01,ICU\n\
                    b,1.0,2021-03-01,ICU\n";

        let measurements = read_measurements(data.as_bytes()).unwrap();
        assert_eq!(measurements.len(), 3);

        let timelines = group_timelines(measurements);
        assert_eq!(timelines.len(), 2);
        assert_eq!(timelines[0].patient_id, "b");
        assert_eq!(timelines[1].patient_id, "a");
        assert_eq!(timelines[0].values(), vec![1.0, 1.1]);
    }

    #[test]
    fn test_duplicate_timestamps_keep_first_seen() {
        let data = "PatientID,Cr_Value,Date\n\
                    p1,1.0,2021-03-01 08:00:00\n\
                    p1,2.0,2021-03-01 08:00:00\n\
                    p1,1.2,2021-02-28 08:00:00\n";

        let timelines = group_timelines(read_measurements(data.as_bytes()).unwrap());
        assert_eq!(timelines[0].values(), vec![1.2, 1.0]);
    }

    #[test]
    fn test_missing_column_fails_fast() {
        let data = "PatientID,Value,Date\np1,1.0,2021-03-01\n";
        let err = read_measurements(data.as_bytes()).unwrap_err();
        assert!(matches!(err, AkiError::MissingColumn(ref c) if c == "Cr_Value"));
    }

    #[test]
    fn test_non_numeric_creatinine_is_rejected_with_row() {
        let data = "PatientID,Cr_Value,Date\np1,1.0,2021-03-01\np1,high,2021-03-02\n";
        let err = read_measurements(data.as_bytes()).unwrap_err();
        assert!(matches!(err, AkiError::InvalidInput { row: 2, .. }));
    }

    #[test]
    fn test_non_positive_creatinine_is_rejected() {
        let data = "PatientID,Cr_Value,Date\np1,-0.4,2021-03-01\n";
        assert!(matches!(
            read_measurements(data.as_bytes()),
            Err(AkiError::InvalidInput { row: 1, .. })
        ));
    }

    #[test]
    fn test_unparseable_date_is_rejected() {
        let data = "PatientID,Cr_Value,Date\np1,1.0,yesterday\n";
        assert!(matches!(
            read_measurements(data.as_bytes()),
            Err(AkiError::InvalidInput { row: 1, .. })
        ));
    }

    #[test]
    fn test_timestamp_formats() {
        let midnight = parse_timestamp("2021-03-01").unwrap();
        assert_eq!(midnight.to_string(), "2021-03-01 00:00:00");
        assert!(parse_timestamp("2021-03-01T12:30:00").is_some());
        assert!(parse_timestamp("2021-03-01 12:30:00").is_some());
        assert_eq!(
            parse_timestamp("2021-03-01T12:30:00+02:00").unwrap().to_string(),
            "2021-03-01 10:30:00"
        );
    }

    #[test]
    fn test_baseline_table_marks_infinite_as_undetermined() {
        let data = "PatientID,Create_Baseline\np1,0.9\np2,inf\n";
        let baselines = read_baselines(data.as_bytes()).unwrap();
        assert_eq!(baselines[0], ("p1".to_string(), Some(0.9)));
        assert_eq!(baselines[1], ("p2".to_string(), None));
    }
}
