use onething_core::streak::STREAK_MILESTONES;
use serde_json::json;

use super::{open_app, print_json, CliResult};

pub async fn run() -> CliResult {
    let app = open_app()?;
    let state = app.streak().state()?;
    let next = STREAK_MILESTONES
        .iter()
        .find(|m| m.days > state.current_streak);

    print_json(&json!({
        "current_streak": state.current_streak,
        "longest_streak": state.longest_streak,
        "last_completion_date": state.last_completion_date,
        "next_milestone": next,
    }))?;

    app.shutdown().await;
    Ok(())
}
