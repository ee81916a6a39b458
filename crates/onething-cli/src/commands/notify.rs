use clap::Subcommand;
use serde_json::json;

use super::{open_app, print_json, CliResult};

#[derive(Subcommand)]
pub enum NotifyAction {
    /// Show reminder settings
    Status,
    /// Turn the daily reminder on
    Enable,
    /// Turn the daily reminder off
    Disable,
    /// Set the reminder time
    Time {
        /// Local time as HH:MM
        #[arg(value_parser = parse_time)]
        at: (u32, u32),
    },
    /// Print the reminder if it is due right now, at most once a day
    Check,
}

fn parse_time(s: &str) -> Result<(u32, u32), String> {
    let (h, m) = s
        .split_once(':')
        .ok_or_else(|| format!("expected HH:MM; got '{s}'"))?;
    let h = h.parse().map_err(|_| format!("bad hour in '{s}'"))?;
    let m = m.parse().map_err(|_| format!("bad minute in '{s}'"))?;
    Ok((h, m))
}

pub async fn run(action: NotifyAction) -> CliResult {
    let mut app = open_app()?;

    match action {
        NotifyAction::Status => print_json(app.reminders().state()?)?,
        NotifyAction::Enable => {
            app.reminders_mut().set_enabled(true)?;
            print_json(app.reminders().state()?)?;
        }
        NotifyAction::Disable => {
            app.reminders_mut().set_enabled(false)?;
            print_json(app.reminders().state()?)?;
        }
        NotifyAction::Time { at: (hour, minute) } => {
            if !app.reminders_mut().set_reminder_time(hour, minute)? {
                return Err(format!("not a time of day: {hour}:{minute:02}").into());
            }
            print_json(app.reminders().state()?)?;
        }
        NotifyAction::Check => {
            let due = app.reminders().should_notify_now()?;
            if due {
                app.reminders_mut().mark_notified()?;
            }
            print_json(&json!({
                "due": due,
                "message": due.then_some("Today's one thing is waiting for you."),
            }))?;
        }
    }

    app.shutdown().await;
    Ok(())
}
