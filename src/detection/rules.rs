use crate::config::DetectionConfig;
use super::AkiLevel;

/// Thresholds of the two rise rules.
#[derive(Debug, Clone, Copy)]
pub struct RuleSet {
    pub rise_threshold: f64,
    pub rise_window_days: i64,
    pub relative_window_days: i64,
}

impl Default for RuleSet {
    fn default() -> Self {
        Self {
            rise_threshold: 0.3,
            rise_window_days: 2,
            relative_window_days: 7,
        }
    }
}

impl RuleSet {
    pub fn from_config(config: &DetectionConfig) -> Self {
        Self {
            rise_threshold: config.rise_threshold,
            rise_window_days: config.rise_window_days,
            relative_window_days: config.relative_window_days,
        }
    }

    /// Absolute rise against one earlier reading inside the short window.
    pub fn absolute_rise(&self, current: f64, past: f64, delta_days: i64) -> AkiLevel {
        if current - past >= self.rise_threshold && delta_days <= self.rise_window_days {
            AkiLevel::Risk
        } else {
            AkiLevel::NoRisk
        }
    }

    /// Rise relative to the baseline inside the medium window.
    ///
    /// The bands are closed intervals; values strictly between `1.99×` and `2.0×`, or between
    /// `2.99×` and `3.0×`, grade as no injury.
    pub fn relative_rise(&self, baseline: f64, current: f64, delta_days: i64) -> AkiLevel {
        if delta_days > self.relative_window_days {
            return AkiLevel::NoRisk;
        }

        if current >= baseline * 3.0 {
            AkiLevel::Failure
        } else if current >= baseline * 2.0 && current <= baseline * 2.99 {
            AkiLevel::Injury
        } else if current >= baseline * 1.5 && current <= baseline * 1.99 {
            AkiLevel::Risk
        } else {
            AkiLevel::NoRisk
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule_48h(current: f64, past: f64, delta_days: i64) -> AkiLevel {
        RuleSet::default().absolute_rise(current, past, delta_days)
    }

    fn rule_7day(baseline: f64, current: f64, delta_days: i64) -> AkiLevel {
        RuleSet::default().relative_rise(baseline, current, delta_days)
    }

    #[test]
    fn test_48h_rule() {
        assert_eq!(rule_48h(1.5, 1.0, 1), AkiLevel::Risk);
        assert_eq!(rule_48h(1.3, 1.0, 2), AkiLevel::Risk);
        assert_eq!(rule_48h(1.2, 1.0, 1), AkiLevel::NoRisk);
        assert_eq!(rule_48h(1.5, 1.0, 3), AkiLevel::NoRisk);
    }

    #[test]
    fn test_7day_bands() {
        assert_eq!(rule_7day(1.0, 3.5, 4), AkiLevel::Failure);
        assert_eq!(rule_7day(1.0, 3.0, 7), AkiLevel::Failure);
        assert_eq!(rule_7day(1.0, 2.5, 0), AkiLevel::Injury);
        assert_eq!(rule_7day(1.0, 1.5, 0), AkiLevel::Risk);
        assert_eq!(rule_7day(1.0, 1.4, 0), AkiLevel::NoRisk);
        assert_eq!(rule_7day(1.0, 3.5, 8), AkiLevel::NoRisk);
    }

    #[test]
    fn test_7day_band_gaps_grade_as_no_injury() {
        assert_eq!(rule_7day(1.0, 1.995, 1), AkiLevel::NoRisk);
        assert_eq!(rule_7day(1.0, 2.995, 1), AkiLevel::NoRisk);
    }

    #[test]
    fn test_custom_threshold() {
        let rules = RuleSet { rise_threshold: 0.5, ..RuleSet::default() };
        assert_eq!(rules.absolute_rise(1.4, 1.0, 1), AkiLevel::NoRisk);
        assert_eq!(rules.absolute_rise(1.6, 1.0, 1), AkiLevel::Risk);
    }
}
