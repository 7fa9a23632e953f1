use serde::{Deserialize, Serialize};
use std::fmt;

const LOWER_BOUND: f64 = 0.699;
const UPPER_BOUND: f64 = 1.5;

/// Position of a reading relative to the normal band around the baseline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Compliance {
    BelowNormal,
    Normal,
    AboveNormal,
}

/// Classifies `value` against `baseline`.
///
/// Below `0.699 × baseline` is low and above `1.5 × baseline` is high. Everything in between,
/// including the narrow gaps at `[0.699, 0.7]` and `[1.499, 1.5]` and both exact bounds, counts
/// as normal.
pub fn classify(baseline: f64, value: f64) -> Compliance {
    if value < baseline * LOWER_BOUND {
        Compliance::BelowNormal
    } else if value > baseline * UPPER_BOUND {
        Compliance::AboveNormal
    } else {
        Compliance::Normal
    }
}

impl fmt::Display for Compliance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Compliance::BelowNormal => "BelowNormal",
            Compliance::Normal => "Normal",
            Compliance::AboveNormal => "AboveNormal",
        };
        write!(f, "{}", name)
    }
}
