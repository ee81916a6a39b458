//! # onething Core Library
//!
//! Business logic for onething: pick one task for today's energy level, focus
//! on it, and turn completions into coins, streaks, badges and a small room to
//! decorate. The `onething` CLI is a thin front end over the same library.
//!
//! ## Architecture
//!
//! - **Stores**: each piece of gameplay state ([`TaskStore`], [`CoinLedger`],
//!   [`StreakTracker`], [`AchievementBook`], [`RoomGrid`], [`ShopLedger`],
//!   [`ReminderSchedule`], [`ProfileStore`]) persists as one record in a
//!   [`StateStore`] and must be hydrated before use
//! - **Focus timer**: a caller-driven countdown ([`FocusSession`]) plus an
//!   async driver ([`run_focus`])
//! - **Orchestrator**: [`App`] runs the completion pipeline and the purchase
//!   flow across stores
//! - **Mirror**: best-effort copies to a remote backend through
//!   [`RemoteMirror`], queued by [`MirrorOutbox`]
//! - **Storage**: SQLite-backed key-value records and TOML configuration

pub mod achievements;
pub mod app;
pub mod clock;
pub mod error;
pub mod events;
pub mod ledger;
pub mod mirror;
pub mod notification;
pub mod profile;
pub mod room;
pub mod shop;
pub mod storage;
pub mod streak;
pub mod task;
pub mod timer;

pub use achievements::{Achievement, AchievementBook, AchievementStats, ACHIEVEMENTS};
pub use app::{App, CompletionReport, FriendOutcome, FriendSummary, PurchaseOutcome};
pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{ConfigError, CoreError, DatabaseError, MirrorError, ValidationError};
pub use events::Event;
pub use ledger::CoinLedger;
pub use mirror::{MirrorOutbox, RemoteMirror, RestMirror};
pub use notification::ReminderSchedule;
pub use profile::ProfileStore;
pub use room::{RoomGrid, RoomSnapshot};
pub use shop::{ShopItem, ShopLedger, SHOP_ITEMS};
pub use storage::{Config, Database, MemoryStore, StateStore};
pub use streak::StreakTracker;
pub use task::{ConditionLevel, Task, TaskStore};
pub use timer::{run_focus, FocusControl, FocusEnvironment, FocusOutcome, FocusSession};
