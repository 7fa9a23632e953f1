/// Reduces a window of creatinine values to one representative level.
pub trait Aggregator {
    fn aggregate(&self, values: &[f64]) -> f64;
    fn name(&self) -> &'static str;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Mean;

#[derive(Debug, Clone, Copy, Default)]
pub struct Median;

impl Aggregator for Mean {
    fn aggregate(&self, values: &[f64]) -> f64 {
        if values.is_empty() {
            return f64::NAN;
        }
        values.iter().sum::<f64>() / values.len() as f64
    }

    fn name(&self) -> &'static str {
        "mean"
    }
}

impl Aggregator for Median {
    fn aggregate(&self, values: &[f64]) -> f64 {
        if values.is_empty() {
            return f64::NAN;
        }

        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));

        let mid = sorted.len() / 2;
        if sorted.len() % 2 == 0 {
            (sorted[mid - 1] + sorted[mid]) / 2.0
        } else {
            sorted[mid]
        }
    }

    fn name(&self) -> &'static str {
        "median"
    }
}

/// Unbiased sample variance (n - 1 denominator).
pub fn sample_variance(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return f64::NAN;
    }

    let mean = Mean.aggregate(values);
    values.iter()
        .map(|v| (v - mean).powi(2))
        .sum::<f64>() / (values.len() - 1) as f64
}
