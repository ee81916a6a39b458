//! Task management commands for CLI.

use clap::Subcommand;
use onething_core::task::{Difficulty, NewTask, TaskCategory};
use serde_json::json;

use super::{open_app, print_json, CliResult};

#[derive(Subcommand)]
pub enum TaskAction {
    /// List tasks
    List {
        /// Only tasks the recommender would currently choose from
        #[arg(long)]
        candidates: bool,
        /// Include completed tasks
        #[arg(long)]
        all: bool,
    },
    /// Add a custom task
    Add {
        /// Task title
        title: String,
        /// self-care, chore, work, social, health or fun
        #[arg(long, default_value = "chore")]
        category: TaskCategory,
        /// 1 (easy), 2 (medium) or 3 (hard)
        #[arg(long, default_value = "1", value_parser = parse_difficulty)]
        difficulty: Difficulty,
        /// Estimated minutes
        #[arg(long, default_value = "5")]
        minutes: u32,
    },
    /// Delete a custom task
    Delete {
        /// Task ID
        id: String,
    },
    /// Show the current recommendation
    Current,
    /// Skip to another recommendation
    Next,
    /// Make a specific task the recommendation
    Pick {
        /// Task ID
        id: String,
    },
}

fn parse_difficulty(s: &str) -> Result<Difficulty, String> {
    let n: u8 = s.parse().map_err(|_| format!("expected 1, 2 or 3; got '{s}'"))?;
    Difficulty::try_from(n).map_err(|e| e.to_string())
}

pub async fn run(action: TaskAction) -> CliResult {
    let mut app = open_app()?;

    match action {
        TaskAction::List { candidates, all } => {
            let tasks = app.tasks();
            if candidates {
                print_json(&tasks.candidates()?)?;
            } else {
                let list: Vec<_> = tasks
                    .tasks()?
                    .iter()
                    .filter(|t| all || !t.is_completed())
                    .collect();
                print_json(&list)?;
            }
        }
        TaskAction::Add {
            title,
            category,
            difficulty,
            minutes,
        } => {
            let task = app
                .tasks_mut()
                .add_task(NewTask::custom(title, category, difficulty, minutes))?;
            print_json(&task)?;
        }
        TaskAction::Delete { id } => {
            if !app.tasks_mut().delete_task(&id)? {
                return Err(format!("not a custom task: {id}").into());
            }
            println!("deleted {id}");
        }
        TaskAction::Current => {
            print_json(&json!({ "current_task": app.tasks().current_task()? }))?;
        }
        TaskAction::Next => {
            let next = app.tasks_mut().recommend_next()?;
            let task = match next.as_deref() {
                Some(id) => app.tasks().task(id)?.cloned(),
                None => None,
            };
            print_json(&json!({ "current_task": task }))?;
        }
        TaskAction::Pick { id } => {
            if !app.tasks_mut().set_current(&id)? {
                return Err(format!("task not available: {id}").into());
            }
            print_json(&json!({ "current_task": app.tasks().current_task()? }))?;
        }
    }

    app.shutdown().await;
    Ok(())
}
