use onething_core::ACHIEVEMENTS;
use serde_json::json;

use super::{open_app, print_json, CliResult};

pub async fn run(unlocked_only: bool) -> CliResult {
    let app = open_app()?;
    let book = app.achievements().state()?;

    let rows: Vec<_> = ACHIEVEMENTS
        .iter()
        .filter_map(|a| {
            let unlocked_at = book.unlocked_at.get(a.id);
            if unlocked_only && unlocked_at.is_none() {
                return None;
            }
            Some(json!({
                "id": a.id,
                "title": a.title,
                "emoji": a.emoji,
                "description": a.description,
                "reward": a.reward,
                "rarity": a.rarity,
                "unlocked_at": unlocked_at,
            }))
        })
        .collect();
    print_json(&rows)?;

    app.shutdown().await;
    Ok(())
}
