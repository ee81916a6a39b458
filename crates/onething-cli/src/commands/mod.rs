pub mod achievements;
pub mod coins;
pub mod condition;
pub mod config;
pub mod focus;
pub mod notify;
pub mod room;
pub mod shop;
pub mod social;
pub mod streak;
pub mod task;

use std::sync::Arc;

use onething_core::{App, Config, RestMirror};
use serde::Serialize;
use tracing::warn;

pub type CliResult = Result<(), Box<dyn std::error::Error>>;

/// Open the on-disk state, attaching the remote mirror when configured.
///
/// Must run inside the tokio runtime; the mirror's outbox worker is spawned
/// onto it.
pub fn open_app() -> Result<App, Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let mirror = if config.mirror.is_configured() {
        match RestMirror::from_config(&config.mirror) {
            Ok(mirror) => Some(mirror),
            Err(e) => {
                warn!(error = %e, "mirror disabled");
                None
            }
        }
    } else {
        None
    };

    let app = App::open(config)?;
    Ok(match mirror {
        Some(mirror) => app.with_mirror(Arc::new(mirror)),
        None => app,
    })
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Parse `x,y` into grid coordinates.
pub fn parse_cell(s: &str) -> Result<(i32, i32), String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected x,y; got '{s}'"))?;
    let x = x.trim().parse().map_err(|_| format!("bad column in '{s}'"))?;
    let y = y.trim().parse().map_err(|_| format!("bad row in '{s}'"))?;
    Ok((x, y))
}
