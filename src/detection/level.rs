use serde::{Deserialize, Serialize};
use std::fmt;

/// RIFLE-style severity of a creatinine reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AkiLevel {
    NoRisk = 0,
    Risk = 1,
    Injury = 2,
    Failure = 3,
    /// Sustained elevation over the short horizon
    Loss = 4,
    /// Sustained elevation over the long horizon
    EndStage = 5,
}

impl AkiLevel {
    pub const ALL: [AkiLevel; 6] = [
        AkiLevel::NoRisk,
        AkiLevel::Risk,
        AkiLevel::Injury,
        AkiLevel::Failure,
        AkiLevel::Loss,
        AkiLevel::EndStage,
    ];

    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn from_u8(level: u8) -> Option<Self> {
        Self::ALL.get(level as usize).copied()
    }

    pub fn label(self) -> &'static str {
        match self {
            AkiLevel::NoRisk => "No Risk",
            AkiLevel::Risk => "Risk",
            AkiLevel::Injury => "Injury",
            AkiLevel::Failure => "Failure",
            AkiLevel::Loss => "Loss of kidney function",
            AkiLevel::EndStage => "End-stage kidney disease",
        }
    }

    pub fn is_injury(self) -> bool {
        self > AkiLevel::NoRisk
    }
}

impl fmt::Display for AkiLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}
