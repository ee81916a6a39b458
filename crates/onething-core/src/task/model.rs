use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Broad grouping used for display and catalog browsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskCategory {
    SelfCare,
    Chore,
    Work,
    Social,
    Health,
    Fun,
}

impl TaskCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            TaskCategory::SelfCare => "self-care",
            TaskCategory::Chore => "chore",
            TaskCategory::Work => "work",
            TaskCategory::Social => "social",
            TaskCategory::Health => "health",
            TaskCategory::Fun => "fun",
        }
    }
}

impl fmt::Display for TaskCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskCategory {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "self-care" | "selfcare" => Ok(TaskCategory::SelfCare),
            "chore" => Ok(TaskCategory::Chore),
            "work" => Ok(TaskCategory::Work),
            "social" => Ok(TaskCategory::Social),
            "health" => Ok(TaskCategory::Health),
            "fun" => Ok(TaskCategory::Fun),
            other => Err(ValidationError::InvalidValue {
                field: "category".into(),
                message: format!("unknown category '{other}'"),
            }),
        }
    }
}

/// Effort level, serialized as 1, 2 or 3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Difficulty {
    Easy = 1,
    Medium = 2,
    Hard = 3,
}

impl TryFrom<u8> for Difficulty {
    type Error = ValidationError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Difficulty::Easy),
            2 => Ok(Difficulty::Medium),
            3 => Ok(Difficulty::Hard),
            other => Err(ValidationError::InvalidValue {
                field: "difficulty".into(),
                message: format!("must be 1, 2 or 3; got {other}"),
            }),
        }
    }
}

impl From<Difficulty> for u8 {
    fn from(d: Difficulty) -> u8 {
        d as u8
    }
}

/// A single thing to do.
///
/// `completed_at` moves from `None` to a timestamp exactly once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    pub emoji: String,
    pub category: TaskCategory,
    pub difficulty: Difficulty,
    pub coin_reward: u64,
    pub estimated_minutes: u32,
    pub completed_at: Option<DateTime<FixedOffset>>,
    pub created_at: DateTime<FixedOffset>,
    pub is_custom: bool,
}

impl Task {
    pub fn is_completed(&self) -> bool {
        self.completed_at.is_some()
    }

    /// Whether the task was completed on the given local calendar day.
    pub fn completed_on(&self, day: NaiveDate) -> bool {
        self.completed_at.is_some_and(|at| at.date_naive() == day)
    }
}

/// Fields supplied when adding a task; id and timestamps are assigned by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTask {
    pub title: String,
    pub emoji: String,
    pub category: TaskCategory,
    pub difficulty: Difficulty,
    pub coin_reward: u64,
    pub estimated_minutes: u32,
    pub is_custom: bool,
}

impl NewTask {
    /// A user-created task.
    pub fn custom(
        title: impl Into<String>,
        category: TaskCategory,
        difficulty: Difficulty,
        estimated_minutes: u32,
    ) -> Self {
        let coin_reward = match difficulty {
            Difficulty::Easy => 5,
            Difficulty::Medium => 15,
            Difficulty::Hard => 30,
        };
        Self {
            title: title.into(),
            emoji: "✏️".into(),
            category,
            difficulty,
            coin_reward,
            estimated_minutes,
            is_custom: true,
        }
    }

    /// Materialize into a stored task.
    pub fn into_task(self, id: String, created_at: DateTime<FixedOffset>) -> Task {
        Task {
            id,
            title: self.title,
            emoji: self.emoji,
            category: self.category,
            difficulty: self.difficulty,
            coin_reward: self.coin_reward,
            estimated_minutes: self.estimated_minutes,
            completed_at: None,
            created_at,
            is_custom: self.is_custom,
        }
    }

    /// # Errors
    /// Rejects a blank title or a zero time estimate.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::InvalidValue {
                field: "title".into(),
                message: "must not be empty".into(),
            });
        }
        if self.estimated_minutes == 0 {
            return Err(ValidationError::InvalidValue {
                field: "estimated_minutes".into(),
                message: "must be greater than zero".into(),
            });
        }
        Ok(())
    }
}
