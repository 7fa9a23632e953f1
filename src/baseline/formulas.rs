//! Reference creatinine baselines derived from demographics alone.
//!
//! These are used when a patient's history is too sparse for the statistical estimator.
//! References: Zavada et al., NDT 2010 (gender-fixed, revised, MDRD back-calculation) and
//! Levey et al., Ann Intern Med 2009 (CKD-EPI).

use crate::error::{AkiError, AkiResult};

/// Assumed eGFR (ml/min/1.73 m²) for MDRD back-calculation.
const ASSUMED_GFR: f64 = 75.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sex {
    Male,
    Female,
}

impl Sex {
    /// Accepts `m`, `male`, `f`, `female` in any case.
    pub fn parse(raw: &str) -> AkiResult<Self> {
        match raw.trim().to_lowercase().as_str() {
            "m" | "male" => Ok(Sex::Male),
            "f" | "female" => Ok(Sex::Female),
            other => Err(AkiError::Validation(format!("Unknown sex '{}'", other))),
        }
    }

    fn is_female(self) -> bool {
        self == Sex::Female
    }
}

/// Baseline in mg/dl depending on sex only.
pub fn gender_fixed_baseline(sex: Sex) -> f64 {
    match sex {
        Sex::Male => 1.0,
        Sex::Female => 0.8,
    }
}

/// Baseline in mg/dl adjusted for sex, ethnicity and age.
pub fn revised_baseline(age: f64, sex: Sex, is_black: bool) -> f64 {
    let female = if sex.is_female() { 1.0 } else { 0.0 };
    let black = if is_black { 1.0 } else { 0.0 };
    0.74 - 0.2 * female + 0.08 * black + 0.003 * age
}

/// MDRD equation solved for creatinine at an assumed eGFR of 75.
pub fn mdrd_baseline(age: f64, sex: Sex, is_black: bool) -> AkiResult<f64> {
    if age <= 0.0 {
        return Err(AkiError::Validation("Age must be positive".to_string()));
    }

    let mut denominator = 186.0 * age.powf(-0.203);
    if sex.is_female() {
        denominator *= 0.742;
    }
    if is_black {
        denominator *= 1.210;
    }

    Ok((ASSUMED_GFR / denominator).powf(-1.0 / 1.154))
}

/// CKD-EPI (2009) estimated GFR in ml/min/1.73 m² for a creatinine value in mg/dl.
pub fn ckd_epi_gfr(age: f64, sex: Sex, is_black: bool, cr_value: f64) -> AkiResult<f64> {
    if cr_value <= 0.0 {
        return Err(AkiError::Validation("Creatinine must be positive".to_string()));
    }

    let (kappa, alpha) = match sex {
        Sex::Female => (0.7, -0.329),
        Sex::Male => (0.9, -0.411),
    };

    let ratio = cr_value / kappa;
    let mut gfr = 141.0
        * ratio.min(1.0).powf(alpha)
        * ratio.max(1.0).powf(-1.209)
        * 0.993_f64.powf(age);

    if sex.is_female() {
        gfr *= 1.018;
    }
    if is_black {
        gfr *= 1.159;
    }

    Ok(gfr)
}
