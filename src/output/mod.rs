use crate::baseline::PatientBaseline;
use crate::detection::{AkiEvent, AkiLevel, DetectionRun, DetectionSummary};
use crate::error::AkiResult;
use crate::input::{Measurement, BASELINE_COLUMN, CR_VALUE_COLUMN, DATE_COLUMN, PATIENT_ID_COLUMN};
use std::path::Path;
use std::fs::File;
use log::info;

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// How the `AKI_Level` column is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelFormat {
    Numeric,
    Rifle,
}

pub fn save_results<P: AsRef<Path>>(
    baselines: &[PatientBaseline],
    run: &DetectionRun,
    output_dir: P,
    level_format: LevelFormat,
) -> AkiResult<()> {
    let output_path = output_dir.as_ref();

    save_baselines(baselines, output_path.join("baselines.csv"))?;
    save_events(&run.events, output_path.join("aki_events.csv"), level_format)?;

    let summary = DetectionSummary::from_run(run);
    save_summary(&summary, output_path.join("detection_summary.json"))?;
    generate_report(&summary, output_path)?;

    info!("All results saved to {:?}", output_path);
    Ok(())
}

pub fn save_baselines<P: AsRef<Path>>(baselines: &[PatientBaseline], path: P) -> AkiResult<()> {
    let mut writer = csv::Writer::from_path(path)?;
    write_baselines(baselines, &mut writer)?;
    writer.flush()?;
    Ok(())
}

fn write_baselines<W: std::io::Write>(
    baselines: &[PatientBaseline],
    writer: &mut csv::Writer<W>,
) -> AkiResult<()> {
    writer.write_record([PATIENT_ID_COLUMN, BASELINE_COLUMN])?;

    for baseline in baselines {
        writer.write_record(&[
            baseline.patient_id.clone(),
            baseline.sentinel_value().to_string(),
        ])?;
    }

    Ok(())
}

pub fn save_events<P: AsRef<Path>>(events: &[AkiEvent], path: P, level_format: LevelFormat) -> AkiResult<()> {
    let mut writer = csv::Writer::from_path(path)?;
    write_events(events, &mut writer, level_format)?;
    writer.flush()?;
    Ok(())
}

fn write_events<W: std::io::Write>(
    events: &[AkiEvent],
    writer: &mut csv::Writer<W>,
    level_format: LevelFormat,
) -> AkiResult<()> {
    writer.write_record([PATIENT_ID_COLUMN, DATE_COLUMN, CR_VALUE_COLUMN, "AKI_Level", "Compliance"])?;

    for event in events {
        let level = match level_format {
            LevelFormat::Numeric => event.level.as_u8().to_string(),
            LevelFormat::Rifle => event.level.label().to_string(),
        };

        writer.write_record(&[
            event.patient_id.clone(),
            event.timestamp.format(DATE_FORMAT).to_string(),
            event.cr_value.to_string(),
            level,
            event.compliance.to_string(),
        ])?;
    }

    Ok(())
}

pub fn save_measurements<P: AsRef<Path>>(measurements: &[Measurement], path: P) -> AkiResult<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record([PATIENT_ID_COLUMN, CR_VALUE_COLUMN, DATE_COLUMN])?;

    for measurement in measurements {
        writer.write_record(&[
            measurement.patient_id.clone(),
            measurement.cr_value.to_string(),
            measurement.timestamp.format(DATE_FORMAT).to_string(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

fn save_summary<P: AsRef<Path>>(summary: &DetectionSummary, path: P) -> AkiResult<()> {
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, summary)?;
    Ok(())
}

/// Markdown overview of a detection run
pub fn generate_report<P: AsRef<Path>>(summary: &DetectionSummary, output_dir: P) -> AkiResult<()> {
    let report_path = output_dir.as_ref().join("detection_report.md");

    let level_rows: String = AkiLevel::ALL.iter()
        .map(|&level| format!("| {} {} | {} |\n", level.as_u8(), level, summary.count(level)))
        .collect();

    let skipped_rows: String = if summary.patients_skipped.is_empty() {
        "None\n".to_string()
    } else {
        summary.patients_skipped.iter()
            .map(|s| format!("- `{}`: {}\n", s.patient_id, s.reason))
            .collect()
    };

    let report_content = format!(
        r#"# AKI Detection Report

## Overview
- **Patients analysed**: {}
- **Patients skipped**: {}
- **Readings graded**: {}
- **Patients with at least one AKI event**: {}

## Events per Level
| Level | Readings |
|-------|----------|
{}
## Skipped Patients
{}
## Files Generated
- `baselines.csv`: Statistical creatinine baseline per patient (`inf` when undeterminable)
- `aki_events.csv`: Graded readings after duplicate suppression
- `detection_summary.json`: Machine-readable version of this report
"#,
        summary.patients_analysed,
        summary.patients_skipped.len(),
        summary.events,
        summary.patients_with_injury,
        level_rows,
        skipped_rows,
    );

    std::fs::write(report_path, report_content)?;
    Ok(())
}
