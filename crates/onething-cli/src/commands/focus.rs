//! Focus timer in the terminal.
//!
//! While a countdown runs, type `p` to pause, `r` to resume and `c` to give
//! up, each followed by Enter.

use std::io::{BufRead, Write};

use clap::Subcommand;
use onething_core::timer::{duration_options, recommended_minutes};
use onething_core::{run_focus, FocusControl, FocusEnvironment, FocusOutcome, FocusSession, Task};
use serde_json::json;
use tokio::sync::mpsc;

use super::{open_app, print_json, CliResult};

#[derive(Subcommand)]
pub enum FocusAction {
    /// Show the duration choices for a task
    Options {
        /// Task ID (default: the current recommendation)
        id: Option<String>,
    },
    /// Run a countdown and collect the reward when it finishes
    Run {
        /// Task ID (default: the current recommendation)
        id: Option<String>,
        /// Countdown length in minutes (default: the recommended option)
        #[arg(long)]
        minutes: Option<u32>,
    },
}

/// Terminal side channels: the bell stands in for vibration.
struct TerminalEnvironment;

impl FocusEnvironment for TerminalEnvironment {
    fn vibrate(&self, _pattern_ms: &[u64]) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let mut err = std::io::stderr();
        err.write_all(b"\x07")?;
        err.flush()?;
        Ok(())
    }
}

fn pick_task(app: &onething_core::App, id: Option<String>) -> Result<Task, Box<dyn std::error::Error>> {
    let task = match id {
        Some(id) => app.tasks().task(&id)?.cloned(),
        None => app.tasks().current_task()?.cloned(),
    };
    let task = task.ok_or("no task to focus on; declare today's condition first")?;
    if task.is_completed() {
        return Err(format!("already completed: {}", task.id).into());
    }
    Ok(task)
}

/// Forward typed commands to the driver from a plain thread.
fn spawn_stdin_controls() -> mpsc::UnboundedReceiver<FocusControl> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            let control = match line.trim() {
                "p" | "pause" => FocusControl::Pause,
                "r" | "resume" => FocusControl::Resume,
                "c" | "cancel" | "q" => FocusControl::Cancel,
                _ => continue,
            };
            if tx.send(control).is_err() {
                break;
            }
        }
    });
    rx
}

pub async fn run(action: FocusAction) -> CliResult {
    let mut app = open_app()?;

    match action {
        FocusAction::Options { id } => {
            let task = pick_task(&app, id)?;
            print_json(&json!({
                "task_id": task.id,
                "title": task.title,
                "options": duration_options(task.estimated_minutes),
                "recommended": recommended_minutes(task.estimated_minutes),
            }))?;
        }
        FocusAction::Run { id, minutes } => {
            let task = pick_task(&app, id)?;
            let mut session = FocusSession::new(&task, app.clock());
            let minutes = minutes.unwrap_or_else(|| session.recommended());
            if session.start(minutes).is_none() {
                return Err(format!("cannot focus for {minutes} minutes").into());
            }
            eprintln!("{} {} for {minutes} min (p/r/c + Enter)", task.emoji, task.title);

            let timer = app.config().timer.clone();
            let outcome = run_focus(
                &mut session,
                &TerminalEnvironment,
                &timer,
                spawn_stdin_controls(),
                |s, event| {
                    if event.is_none() {
                        eprint!("\r{}  {:<40}", s.display(), s.buddy_line());
                        let _ = std::io::stderr().flush();
                    }
                },
            )
            .await;
            eprintln!();

            match outcome {
                FocusOutcome::Finished => match app.complete_focus(&task.id)? {
                    Some(report) => print_json(&report)?,
                    None => return Err(format!("already completed: {}", task.id).into()),
                },
                FocusOutcome::Cancelled => {
                    app.cancel_focus(&task.id);
                    print_json(&json!({ "status": "cancelled", "task_id": task.id }))?;
                }
            }
        }
    }

    app.shutdown().await;
    Ok(())
}
