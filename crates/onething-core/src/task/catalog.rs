use super::model::{Difficulty, NewTask, TaskCategory};

const DEFAULTS: &[(&str, &str, TaskCategory, Difficulty, u64, u32)] = &[
    // self-care
    ("Drink a glass of water", "💧", TaskCategory::SelfCare, Difficulty::Easy, 5, 1),
    ("Wash your face", "🧼", TaskCategory::SelfCare, Difficulty::Easy, 5, 3),
    ("Brush your teeth", "🪥", TaskCategory::SelfCare, Difficulty::Easy, 5, 3),
    ("Stretch for 5 minutes", "🧘", TaskCategory::SelfCare, Difficulty::Easy, 10, 5),
    // chores
    ("Clear the top of your desk", "🗂️", TaskCategory::Chore, Difficulty::Easy, 10, 5),
    ("Do the dishes", "🍽️", TaskCategory::Chore, Difficulty::Medium, 15, 10),
    ("Start a load of laundry", "👕", TaskCategory::Chore, Difficulty::Medium, 10, 5),
    ("Take out the trash", "🗑️", TaskCategory::Chore, Difficulty::Easy, 10, 5),
    // work
    ("Reply to one email", "📧", TaskCategory::Work, Difficulty::Medium, 15, 5),
    ("Tidy up your to-do list", "📝", TaskCategory::Work, Difficulty::Medium, 10, 10),
    ("25 minutes of focused work", "🍅", TaskCategory::Work, Difficulty::Hard, 30, 25),
    // health
    ("Take a 10 minute walk", "🚶", TaskCategory::Health, Difficulty::Medium, 20, 10),
    ("Take your vitamins", "💊", TaskCategory::Health, Difficulty::Easy, 5, 1),
    // social
    ("Send a friend a quick hello", "💬", TaskCategory::Social, Difficulty::Medium, 15, 3),
    // fun
    ("Listen to one favourite song", "🎵", TaskCategory::Fun, Difficulty::Easy, 5, 4),
    ("Look out the window for a bit", "🪟", TaskCategory::Fun, Difficulty::Easy, 5, 2),
];

/// Built-in tasks seeded into an empty store on first start.
pub fn default_tasks() -> Vec<NewTask> {
    DEFAULTS
        .iter()
        .map(
            |&(title, emoji, category, difficulty, coin_reward, estimated_minutes)| NewTask {
                title: title.to_string(),
                emoji: emoji.to_string(),
                category,
                difficulty,
                coin_reward,
                estimated_minutes,
                is_custom: false,
            },
        )
        .collect()
}
