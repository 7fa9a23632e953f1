use super::{AkiLevel, DetectionRun, SkippedPatient};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

#[derive(Debug, Serialize)]
pub struct DetectionSummary {
    pub patients_analysed: usize,
    pub patients_skipped: Vec<SkippedPatient>,
    pub events: usize,
    pub events_per_level: BTreeMap<String, usize>,
    pub patients_with_injury: usize,
}

impl DetectionSummary {
    pub fn from_run(run: &DetectionRun) -> Self {
        let mut per_level: BTreeMap<u8, usize> = AkiLevel::ALL.iter()
            .map(|level| (level.as_u8(), 0))
            .collect();
        for event in &run.events {
            *per_level.entry(event.level.as_u8()).or_insert(0) += 1;
        }

        let injured: HashSet<&str> = run.events.iter()
            .filter(|e| e.level.is_injury())
            .map(|e| e.patient_id.as_str())
            .collect();

        Self {
            patients_analysed: run.patients_analysed,
            patients_skipped: run.skipped.clone(),
            events: run.events.len(),
            events_per_level: per_level.into_iter()
                .filter_map(|(level, count)| {
                    AkiLevel::from_u8(level).map(|l| (format!("{} {}", level, l.label()), count))
                })
                .collect(),
            patients_with_injury: injured.len(),
        }
    }

    pub fn count(&self, level: AkiLevel) -> usize {
        let key = format!("{} {}", level.as_u8(), level.label());
        self.events_per_level.get(&key).copied().unwrap_or(0)
    }
}
