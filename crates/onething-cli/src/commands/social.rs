//! Remote profile and friends.
//!
//! Every command here needs `mirror.enabled`, `mirror.base_url` and
//! `mirror.anon_key` in the config; gameplay commands never do.

use clap::Subcommand;
use onething_core::FriendOutcome;
use serde_json::json;

use super::{open_app, print_json, CliResult};

#[derive(Subcommand)]
pub enum SocialAction {
    /// Create the remote profile and get a friend code
    Register {
        /// Name shown to friends
        nickname: String,
    },
    /// Show your profile and friend code
    Me,
    /// Add a friend by their 6-character code
    Add { code: String },
    /// List friends with how many tasks they finished today
    Friends,
    /// React to a friend's completed task
    React {
        /// Completion ID from the friend feed
        task_id: String,
        emoji: String,
    },
}

pub async fn run(action: SocialAction) -> CliResult {
    let mut app = open_app()?;

    let result: CliResult = match action {
        SocialAction::Register { nickname } => {
            if app.profile().is_registered()? {
                Err("already registered".into())
            } else if app.register(&nickname).await? {
                print_json(app.profile().profile()?)
            } else {
                Err("registration failed; check the mirror settings".into())
            }
        }
        SocialAction::Me => print_json(app.profile().profile()?),
        SocialAction::Add { code } => {
            let outcome = app.add_friend(&code).await?;
            print_json(&outcome)?;
            match outcome {
                FriendOutcome::Added { .. } => Ok(()),
                _ => Err("friend not added".into()),
            }
        }
        SocialAction::Friends => match app.friends().await? {
            Some(friends) => print_json(&friends),
            None => Err("friend list unavailable".into()),
        },
        SocialAction::React { task_id, emoji } => match app.react(&task_id, &emoji).await? {
            Some(counts) => print_json(&json!({ "task_id": task_id, "reactions": counts })),
            None => Err("reaction failed".into()),
        },
    };

    app.shutdown().await;
    result
}
