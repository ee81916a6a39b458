use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::catalog::{Achievement, AchievementRule, ACHIEVEMENTS};
use crate::clock::Clock;
use crate::error::Result;
use crate::storage::{Persisted, StateStore};

pub const ACHIEVEMENTS_KEY: &str = "onething-achievements";

/// Cross-store snapshot taken at evaluation time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AchievementStats {
    pub total_completed: u32,
    pub current_streak: u32,
    pub total_coins: u64,
    pub room_level: u8,
    pub friend_count: u32,
    pub has_custom_task: bool,
    pub current_hour: u32,
}

impl AchievementRule {
    pub fn holds(&self, stats: &AchievementStats) -> bool {
        match *self {
            AchievementRule::TotalCompleted(n) => stats.total_completed >= n,
            AchievementRule::CurrentStreak(n) => stats.current_streak >= n,
            AchievementRule::TotalCoins(n) => stats.total_coins >= n,
            AchievementRule::RoomLevel(n) => stats.room_level >= n,
            AchievementRule::FriendCount(n) => stats.friend_count >= n,
            AchievementRule::HasCustomTask => stats.has_custom_task,
            AchievementRule::EarlyBird(hour) => stats.current_hour < hour,
            AchievementRule::NightOwl => stats.current_hour < 5,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UnlockState {
    /// In unlock order.
    pub unlocked_ids: Vec<String>,
    pub unlocked_at: BTreeMap<String, DateTime<FixedOffset>>,
}

/// Persistent record of which badges have been earned.
pub struct AchievementBook {
    state: Persisted<UnlockState>,
    clock: Arc<dyn Clock>,
}

impl AchievementBook {
    pub fn new(backend: Arc<dyn StateStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Persisted::new(ACHIEVEMENTS_KEY, backend),
            clock,
        }
    }

    pub fn hydrate(&mut self) -> Result<()> {
        self.state.hydrate()
    }

    pub fn is_hydrated(&self) -> bool {
        self.state.is_hydrated()
    }

    pub fn state(&self) -> Result<&UnlockState> {
        self.state.get()
    }

    pub fn is_unlocked(&self, id: &str) -> Result<bool> {
        Ok(self.state.get()?.unlocked_ids.iter().any(|u| u == id))
    }

    /// Unlock every not-yet-earned badge whose rule holds for `stats`.
    ///
    /// Returns the newly unlocked badges in table order. Paying out rewards is
    /// the caller's job.
    pub fn check(&mut self, stats: &AchievementStats) -> Result<Vec<&'static Achievement>> {
        let state = self.state.get()?;
        let newly: Vec<&'static Achievement> = ACHIEVEMENTS
            .iter()
            .filter(|a| !state.unlocked_ids.iter().any(|u| u == a.id))
            .filter(|a| a.rule.holds(stats))
            .collect();

        if newly.is_empty() {
            return Ok(newly);
        }

        let now = self.clock.now();
        self.state.update(|s| {
            for a in &newly {
                s.unlocked_ids.push(a.id.to_string());
                s.unlocked_at.insert(a.id.to_string(), now);
            }
        })?;
        for a in &newly {
            info!(id = a.id, reward = a.reward, "achievement unlocked");
        }
        Ok(newly)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::storage::MemoryStore;

    fn book() -> AchievementBook {
        let clock = FixedClock::at("2024-03-01T12:00:00+09:00");
        let mut b = AchievementBook::new(Arc::new(MemoryStore::new()), Arc::new(clock));
        b.hydrate().unwrap();
        b
    }

    fn noon() -> AchievementStats {
        AchievementStats {
            current_hour: 12,
            ..Default::default()
        }
    }

    #[test]
    fn jump_unlocks_both_thresholds_once() {
        let mut b = book();
        let stats = AchievementStats {
            total_completed: 12,
            ..noon()
        };
        let ids: Vec<_> = b.check(&stats).unwrap().iter().map(|a| a.id).collect();
        assert_eq!(ids, vec!["first_task", "task_10"]);
        assert!(b.check(&stats).unwrap().is_empty());
        assert_eq!(b.state().unwrap().unlocked_ids.len(), 2);
        assert!(b.state().unwrap().unlocked_at.contains_key("task_10"));
    }

    #[test]
    fn nothing_at_noon_with_empty_stats() {
        let mut b = book();
        assert!(b.check(&noon()).unwrap().is_empty());
    }

    #[test]
    fn early_hours_unlock_both_time_badges() {
        let mut b = book();
        let stats = AchievementStats {
            current_hour: 3,
            ..Default::default()
        };
        let ids: Vec<_> = b.check(&stats).unwrap().iter().map(|a| a.id).collect();
        assert_eq!(ids, vec!["early_bird", "night_owl"]);
    }

    #[test]
    fn six_am_is_early_but_not_night() {
        let rule_early = AchievementRule::EarlyBird(7);
        let stats = AchievementStats {
            current_hour: 6,
            ..Default::default()
        };
        assert!(rule_early.holds(&stats));
        assert!(!AchievementRule::NightOwl.holds(&stats));
    }

    #[test]
    fn room_friend_coin_and_custom_rules() {
        let mut b = book();
        let stats = AchievementStats {
            total_coins: 120,
            room_level: 3,
            friend_count: 1,
            has_custom_task: true,
            ..noon()
        };
        let ids: Vec<_> = b.check(&stats).unwrap().iter().map(|a| a.id).collect();
        assert_eq!(ids, vec!["coin_100", "room_lv3", "friend_1", "custom_todo"]);
        assert!(b.is_unlocked("room_lv3").unwrap());
        assert!(!b.is_unlocked("room_lv6").unwrap());
    }
}
