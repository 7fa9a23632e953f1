use rand_distr::{Normal, LogNormal, Distribution};
use crate::error::{AkiError, AkiResult};

/// Draws a patient's true creatinine baseline (mg/dl).
///
/// Baselines are right-skewed across a cohort, so the draw is log-normal with the cohort median
/// `median` and a coefficient of variation of `cv_percent`.
pub fn draw_true_baseline<R: rand::Rng>(median: f64, cv_percent: f64, rng: &mut R) -> AkiResult<f64> {
    if median <= 0.0 {
        return Err(AkiError::Validation("Baseline median must be positive".to_string()));
    }
    if cv_percent <= 0.0 {
        return Ok(median);
    }

    let cv = cv_percent / 100.0;
    let sigma = (1.0 + cv * cv).ln().sqrt();
    let distribution = LogNormal::new(median.ln(), sigma)
        .map_err(|_| AkiError::Random)?;
    Ok(distribution.sample(rng))
}

/// Proportional assay error: Y = F * (1 + EPS)
pub fn apply_assay_error<R: rand::Rng>(
    true_value: f64,
    proportional_sd: f64,
    floor: f64,
    rng: &mut R,
) -> AkiResult<f64> {
    if proportional_sd <= 0.0 {
        return Ok(true_value.max(floor));
    }

    let normal = Normal::new(0.0, proportional_sd)
        .map_err(|_| AkiError::Random)?;
    let epsilon = normal.sample(rng);

    Ok((true_value * (1.0 + epsilon)).max(floor))
}
