//! Local durable state.
//!
//! Each store serializes to one named record in an opaque key-value blob
//! store ([`StateStore`]). [`Persisted`] wraps a store's state with an explicit
//! hydration phase so callers can tell "empty by default" from "not loaded".

mod config;
pub mod database;
mod memory;
pub mod migrations;
mod persisted;

pub use config::{Config, MirrorConfig, RewardsConfig, TimerConfig};
pub use database::Database;
pub use memory::MemoryStore;
pub use persisted::{Hydration, Persisted};

use std::path::PathBuf;

use crate::error::Result;

/// Opaque key-value blob store backing every persisted store.
pub trait StateStore: Send + Sync {
    /// Read the record stored under `key`, if any.
    fn load(&self, key: &str) -> Result<Option<String>>;

    /// Replace the record stored under `key`.
    fn save(&self, key: &str, value: &str) -> Result<()>;
}

/// Returns `~/.config/onething[-dev]/` based on ONETHING_ENV.
///
/// Set ONETHING_ENV=dev to use development data directory. ONETHING_HOME
/// replaces the home directory as the base (useful for tests).
///
/// # Errors
/// Returns an error if creating the config directory fails.
pub fn data_dir() -> Result<PathBuf> {
    let base_dir = match std::env::var_os("ONETHING_HOME") {
        Some(home) => PathBuf::from(home),
        None => dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config"),
    };

    let env = std::env::var("ONETHING_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("onething-dev")
    } else {
        base_dir.join("onething")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
