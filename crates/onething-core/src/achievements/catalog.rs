use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Rarity {
    Common,
    Rare,
    Legendary,
}

/// Predicate an achievement is unlocked by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum AchievementRule {
    TotalCompleted(u32),
    CurrentStreak(u32),
    TotalCoins(u64),
    RoomLevel(u8),
    FriendCount(u32),
    HasCustomTask,
    /// Completed before this hour.
    EarlyBird(u32),
    /// Completed between midnight and 05:00.
    NightOwl,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Achievement {
    pub id: &'static str,
    pub title: &'static str,
    pub emoji: &'static str,
    pub description: &'static str,
    pub rule: AchievementRule,
    pub reward: u64,
    pub rarity: Rarity,
}

const fn badge(
    id: &'static str,
    title: &'static str,
    emoji: &'static str,
    description: &'static str,
    rule: AchievementRule,
    reward: u64,
    rarity: Rarity,
) -> Achievement {
    Achievement {
        id,
        title,
        emoji,
        description,
        rule,
        reward,
        rarity,
    }
}

/// Evaluation order is the table order.
pub const ACHIEVEMENTS: [Achievement; 15] = [
    badge("first_task", "First Step", "👣", "Completed your first task!", AchievementRule::TotalCompleted(1), 5, Rarity::Common),
    badge("task_10", "Ten Down", "🌟", "Completed 10 tasks!", AchievementRule::TotalCompleted(10), 20, Rarity::Common),
    badge("task_50", "Half Century", "💎", "Completed 50 tasks!", AchievementRule::TotalCompleted(50), 50, Rarity::Rare),
    badge("task_100", "Hundred Wins", "👑", "Completed 100 tasks!", AchievementRule::TotalCompleted(100), 100, Rarity::Legendary),
    badge("streak_3", "Three-Day Miracle", "🔥", "Three days in a row!", AchievementRule::CurrentStreak(3), 10, Rarity::Common),
    badge("streak_7", "Week Warrior", "⚔️", "Seven days in a row!", AchievementRule::CurrentStreak(7), 25, Rarity::Common),
    badge("streak_30", "Monthly Legend", "🏆", "Thirty days in a row!", AchievementRule::CurrentStreak(30), 100, Rarity::Legendary),
    badge("early_bird", "Early Bird", "🌅", "Finished a task before 7am!", AchievementRule::EarlyBird(7), 15, Rarity::Rare),
    badge("night_owl", "Night Owl", "🦉", "Finished a task after midnight!", AchievementRule::NightOwl, 15, Rarity::Rare),
    badge("coin_100", "Coin Collector", "💰", "Held 100 coins!", AchievementRule::TotalCoins(100), 10, Rarity::Common),
    badge("coin_500", "On the Way to Riches", "🤑", "Held 500 coins!", AchievementRule::TotalCoins(500), 30, Rarity::Rare),
    badge("room_lv3", "Decorator in Training", "🏠", "Reached room level 3!", AchievementRule::RoomLevel(3), 20, Rarity::Common),
    badge("room_lv6", "Interior Master", "🏰", "Reached room level 6!", AchievementRule::RoomLevel(6), 50, Rarity::Legendary),
    badge("friend_1", "First Friend", "🤝", "Added your first friend!", AchievementRule::FriendCount(1), 10, Rarity::Common),
    badge("custom_todo", "My Own Task", "✏️", "Added a custom task!", AchievementRule::HasCustomTask, 5, Rarity::Common),
];

pub fn achievement(id: &str) -> Option<&'static Achievement> {
    ACHIEVEMENTS.iter().find(|a| a.id == id)
}
