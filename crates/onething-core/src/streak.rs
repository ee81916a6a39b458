//! Daily completion streaks.
//!
//! One completion per local calendar day advances the streak. Missing a day
//! resets it to 1 on the next completion, since that day itself counts.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::clock::Clock;
use crate::error::Result;
use crate::storage::{Persisted, StateStore};

pub const STREAK_KEY: &str = "onething-streak";

/// A streak length that earns a one-off bonus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StreakMilestone {
    pub days: u32,
    pub bonus: u64,
    pub message: &'static str,
}

/// Ascending milestone table.
pub const STREAK_MILESTONES: [StreakMilestone; 5] = [
    StreakMilestone {
        days: 3,
        bonus: 15,
        message: "Three days in a row! A habit is forming!",
    },
    StreakMilestone {
        days: 7,
        bonus: 30,
        message: "A whole week! Amazing!",
    },
    StreakMilestone {
        days: 14,
        bonus: 50,
        message: "Two weeks straight! Unstoppable!",
    },
    StreakMilestone {
        days: 30,
        bonus: 100,
        message: "A full month! You're a legend!",
    },
    StreakMilestone {
        days: 100,
        bonus: 300,
        message: "100 days! A true master!",
    },
];

pub fn milestone_for(days: u32) -> Option<StreakMilestone> {
    STREAK_MILESTONES.iter().copied().find(|m| m.days == days)
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StreakState {
    pub current_streak: u32,
    pub longest_streak: u32,
    pub last_completion_date: Option<NaiveDate>,
}

/// Outcome of [`StreakTracker::check_and_update`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StreakUpdate {
    pub streak: u32,
    pub milestone: Option<StreakMilestone>,
    /// A streak longer than one day was lost before this completion.
    pub broken: bool,
}

pub struct StreakTracker {
    state: Persisted<StreakState>,
    clock: Arc<dyn Clock>,
}

impl StreakTracker {
    pub fn new(backend: Arc<dyn StateStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Persisted::new(STREAK_KEY, backend),
            clock,
        }
    }

    pub fn hydrate(&mut self) -> Result<()> {
        self.state.hydrate()
    }

    pub fn is_hydrated(&self) -> bool {
        self.state.is_hydrated()
    }

    pub fn state(&self) -> Result<&StreakState> {
        self.state.get()
    }

    pub fn current(&self) -> Result<u32> {
        Ok(self.state.get()?.current_streak)
    }

    /// Register today's completion. Call once per completed task.
    ///
    /// Never grants coins; a returned milestone is for the caller to pay out.
    pub fn check_and_update(&mut self) -> Result<StreakUpdate> {
        let today = self.clock.today();
        let yesterday = self.clock.yesterday();
        let prev = self.state.get()?.clone();

        if prev.last_completion_date == Some(today) {
            return Ok(StreakUpdate {
                streak: prev.current_streak,
                milestone: None,
                broken: false,
            });
        }

        let (streak, broken) = if prev.last_completion_date == Some(yesterday) {
            (prev.current_streak + 1, false)
        } else {
            (
                1,
                prev.current_streak > 1 && prev.last_completion_date.is_some(),
            )
        };
        let milestone = milestone_for(streak);

        self.state.update(|s| {
            s.current_streak = streak;
            s.longest_streak = s.longest_streak.max(streak);
            s.last_completion_date = Some(today);
        })?;

        if broken {
            info!(previous = prev.current_streak, "streak broken");
        }
        if let Some(m) = milestone {
            info!(days = m.days, bonus = m.bonus, "streak milestone reached");
        }
        Ok(StreakUpdate {
            streak,
            milestone,
            broken,
        })
    }
}
