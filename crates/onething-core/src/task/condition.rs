use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::model::Difficulty;
use crate::error::ValidationError;

/// Self-reported energy level for the day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConditionLevel {
    Great,
    Okay,
    Tired,
    Struggling,
}

impl ConditionLevel {
    pub const ALL: [ConditionLevel; 4] = [
        ConditionLevel::Great,
        ConditionLevel::Okay,
        ConditionLevel::Tired,
        ConditionLevel::Struggling,
    ];

    /// Hardest difficulty this condition admits, or `None` for no limit.
    pub fn max_difficulty(self) -> Option<Difficulty> {
        match self {
            ConditionLevel::Great | ConditionLevel::Okay => None,
            ConditionLevel::Tired => Some(Difficulty::Medium),
            ConditionLevel::Struggling => Some(Difficulty::Easy),
        }
    }

    pub fn admits(self, difficulty: Difficulty) -> bool {
        self.max_difficulty().map_or(true, |max| difficulty <= max)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ConditionLevel::Great => "great",
            ConditionLevel::Okay => "okay",
            ConditionLevel::Tired => "tired",
            ConditionLevel::Struggling => "struggling",
        }
    }
}

impl fmt::Display for ConditionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConditionLevel {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ConditionLevel::ALL
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ValidationError::InvalidValue {
                field: "condition".into(),
                message: format!("expected one of great, okay, tired, struggling; got '{s}'"),
            })
    }
}
