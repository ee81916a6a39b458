use clap::Subcommand;
use onething_core::ConditionLevel;
use serde_json::json;

use super::{open_app, print_json, CliResult};

#[derive(Subcommand)]
pub enum ConditionAction {
    /// Declare how you feel today (great, okay, tired, struggling)
    Set { level: ConditionLevel },
    /// Show today's condition and whether a check is still due
    Status,
}

pub async fn run(action: ConditionAction) -> CliResult {
    let mut app = open_app()?;

    match action {
        ConditionAction::Set { level } => {
            let current = app.tasks_mut().declare_condition(level)?;
            let task = match current.as_deref() {
                Some(id) => app.tasks().task(id)?.cloned(),
                None => None,
            };
            print_json(&json!({
                "condition": level,
                "current_task": task,
            }))?;
        }
        ConditionAction::Status => {
            let tasks = app.tasks();
            print_json(&json!({
                "condition": tasks.condition()?,
                "needs_check": tasks.needs_condition_check()?,
                "current_task": tasks.current_task()?,
            }))?;
        }
    }

    app.shutdown().await;
    Ok(())
}
