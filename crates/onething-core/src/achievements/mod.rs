//! Badges unlocked from accumulated stats.

mod catalog;
mod engine;

pub use catalog::{achievement, Achievement, AchievementRule, Rarity, ACHIEVEMENTS};
pub use engine::{AchievementBook, AchievementStats, UnlockState, ACHIEVEMENTS_KEY};
