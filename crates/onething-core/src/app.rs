//! Orchestrator over every store.
//!
//! Front ends hold one [`App`]. It owns the stores, runs the completion
//! pipeline in its fixed order, and forwards copies of changes to the remote
//! mirror without ever waiting on it.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, FixedOffset, TimeZone};
use rand::SeedableRng;
use rand_pcg::Pcg64;
use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::achievements::{Achievement, AchievementBook, AchievementStats};
use crate::clock::{Clock, SystemClock};
use crate::error::Result;
use crate::ledger::CoinLedger;
use crate::mirror::{
    CompletionRecord, MirrorJob, MirrorOutbox, ReactionCount, RemoteMirror, RemoteProfile,
};
use crate::notification::ReminderSchedule;
use crate::profile::{parse_friend_code, ProfileStore};
use crate::room::RoomGrid;
use crate::shop::{shop_item, ShopLedger};
use crate::storage::{Config, Database, StateStore};
use crate::streak::{StreakTracker, StreakUpdate};
use crate::task::TaskStore;

/// How long [`App::shutdown`] waits for queued mirror writes.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

/// Everything one finished focus session paid out.
#[derive(Debug, Clone, Serialize)]
pub struct CompletionReport {
    pub task_id: String,
    pub title: String,
    pub base_reward: u64,
    pub first_of_day_bonus: u64,
    pub consecutive_bonus: u64,
    pub consecutive: u32,
    pub streak: StreakUpdate,
    pub unlocked: Vec<&'static Achievement>,
    /// Sum of every credit made by this completion.
    pub total_earned: u64,
    pub balance: u64,
    pub next_task_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PurchaseOutcome {
    /// Bought; `cell` is where it was auto-placed, if the room had space.
    Purchased { price: u64, cell: Option<(i32, i32)> },
    UnknownItem,
    AlreadyOwned,
    InsufficientCoins { price: u64, balance: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FriendOutcome {
    Added { nickname: String },
    InvalidCode,
    NotFound,
    OwnCode,
    AlreadyFriends,
    NotRegistered,
    /// No mirror, or the mirror failed.
    Unavailable,
}

/// A friend with how many tasks they finished today.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FriendSummary {
    pub profile: RemoteProfile,
    pub today_count: u32,
}

pub struct App {
    tasks: TaskStore,
    ledger: CoinLedger,
    streak: StreakTracker,
    achievements: AchievementBook,
    room: RoomGrid,
    shop: ShopLedger,
    reminders: ReminderSchedule,
    profile: ProfileStore,
    config: Config,
    clock: Arc<dyn Clock>,
    mirror: Option<Arc<dyn RemoteMirror>>,
    outbox: MirrorOutbox,
    worker: Option<JoinHandle<()>>,
}

impl App {
    pub fn new(backend: Arc<dyn StateStore>, clock: Arc<dyn Clock>, config: Config) -> Self {
        Self::assemble(
            backend.clone(),
            clock.clone(),
            config,
            TaskStore::new(backend.clone(), clock),
            ProfileStore::new(backend),
        )
    }

    /// Deterministic recommendations and friend codes.
    pub fn with_seed(
        backend: Arc<dyn StateStore>,
        clock: Arc<dyn Clock>,
        config: Config,
        seed: u64,
    ) -> Self {
        Self::assemble(
            backend.clone(),
            clock.clone(),
            config,
            TaskStore::seeded(backend.clone(), clock, seed),
            ProfileStore::with_rng(backend, Box::new(Pcg64::seed_from_u64(seed.wrapping_add(1)))),
        )
    }

    /// Open the on-disk database with the system clock and hydrate everything.
    pub fn open(config: Config) -> Result<Self> {
        let backend: Arc<dyn StateStore> = Arc::new(Database::open()?);
        let mut app = Self::new(backend, Arc::new(SystemClock), config);
        app.hydrate()?;
        Ok(app)
    }

    fn assemble(
        backend: Arc<dyn StateStore>,
        clock: Arc<dyn Clock>,
        config: Config,
        tasks: TaskStore,
        profile: ProfileStore,
    ) -> Self {
        Self {
            tasks,
            ledger: CoinLedger::new(backend.clone(), clock.clone()),
            streak: StreakTracker::new(backend.clone(), clock.clone()),
            achievements: AchievementBook::new(backend.clone(), clock.clone()),
            room: RoomGrid::new(backend.clone(), clock.clone()),
            shop: ShopLedger::new(backend.clone()),
            reminders: ReminderSchedule::new(backend, clock.clone()),
            profile,
            config,
            clock,
            mirror: None,
            outbox: MirrorOutbox::disabled(),
            worker: None,
        }
    }

    /// Attach a remote mirror and start its outbox worker.
    ///
    /// Must be called inside a tokio runtime.
    pub fn with_mirror(mut self, mirror: Arc<dyn RemoteMirror>) -> Self {
        let debounce = Duration::from_millis(self.config.mirror.debounce_ms);
        let (outbox, worker) = MirrorOutbox::spawn(mirror.clone(), debounce);
        self.mirror = Some(mirror);
        self.outbox = outbox;
        self.worker = Some(worker);
        self
    }

    /// Load every store and seed the task catalog on first run.
    pub fn hydrate(&mut self) -> Result<()> {
        self.tasks.hydrate()?;
        self.ledger.hydrate()?;
        self.streak.hydrate()?;
        self.achievements.hydrate()?;
        self.room.hydrate()?;
        self.shop.hydrate()?;
        self.reminders.hydrate()?;
        self.profile.hydrate()?;
        let seeded = self.tasks.seed_defaults()?;
        if seeded > 0 {
            info!(count = seeded, "seeded default tasks");
        }
        Ok(())
    }

    /// Stop accepting mirror jobs and wait for queued ones to drain.
    ///
    /// Jobs still queued after a grace period are abandoned.
    pub async fn shutdown(self) {
        let Self { outbox, worker, .. } = self;
        drop(outbox);
        let Some(mut worker) = worker else {
            return;
        };
        match tokio::time::timeout(SHUTDOWN_GRACE, &mut worker).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(error = %e, "mirror worker ended abnormally"),
            Err(_) => {
                warn!(
                    grace_secs = SHUTDOWN_GRACE.as_secs(),
                    "mirror worker did not drain; abandoning queued writes"
                );
                worker.abort();
            }
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn tasks(&self) -> &TaskStore {
        &self.tasks
    }

    pub fn ledger(&self) -> &CoinLedger {
        &self.ledger
    }

    pub fn streak(&self) -> &StreakTracker {
        &self.streak
    }

    pub fn achievements(&self) -> &AchievementBook {
        &self.achievements
    }

    pub fn room(&self) -> &RoomGrid {
        &self.room
    }

    pub fn shop(&self) -> &ShopLedger {
        &self.shop
    }

    pub fn reminders(&self) -> &ReminderSchedule {
        &self.reminders
    }

    pub fn profile(&self) -> &ProfileStore {
        &self.profile
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn clock(&self) -> Arc<dyn Clock> {
        self.clock.clone()
    }

    /// Live cross-store snapshot for achievement rules.
    pub fn stats(&self) -> Result<AchievementStats> {
        Ok(AchievementStats {
            total_completed: u32::try_from(self.tasks.total_completed()?).unwrap_or(u32::MAX),
            current_streak: self.streak.current()?,
            total_coins: self.ledger.balance()?,
            room_level: self.room.level()?,
            friend_count: self.profile.profile()?.friend_count,
            has_custom_task: self.tasks.has_custom_task()?,
            current_hour: self.clock.hour(),
        })
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Task operations that need no cross-store coordination.
    pub fn tasks_mut(&mut self) -> &mut TaskStore {
        &mut self.tasks
    }

    pub fn reminders_mut(&mut self) -> &mut ReminderSchedule {
        &mut self.reminders
    }

    /// Pay out a naturally finished focus session.
    ///
    /// Returns `None`, with nothing else touched, when the task is unknown or
    /// already completed.
    pub fn complete_focus(&mut self, task_id: &str) -> Result<Option<CompletionReport>> {
        let is_first_today =
            self.streak.state()?.last_completion_date != Some(self.clock.today());
        if !self.tasks.complete_task(task_id)? {
            return Ok(None);
        }
        let Some(task) = self.tasks.task(task_id)?.cloned() else {
            return Ok(None);
        };

        let rewards = &self.config.rewards;
        let consecutive = self.ledger.bump_consecutive()?;
        let first_of_day_bonus = if is_first_today {
            rewards.first_of_day_bonus
        } else {
            0
        };
        let consecutive_bonus = if rewards.consecutive_interval > 0
            && consecutive % rewards.consecutive_interval == 0
        {
            rewards.streak_of_three_bonus
        } else {
            0
        };
        let coins = task
            .coin_reward
            .saturating_add(first_of_day_bonus)
            .saturating_add(consecutive_bonus);
        self.ledger
            .earn(coins, &format!("Completed: {}", task.title))?;
        let mut total_earned = coins;

        let streak = self.streak.check_and_update()?;
        if let Some(milestone) = streak.milestone {
            self.ledger.earn(
                milestone.bonus,
                &format!("{}-day streak bonus", milestone.days),
            )?;
            total_earned = total_earned.saturating_add(milestone.bonus);
        }

        let stats = self.stats()?;
        let unlocked = self.achievements.check(&stats)?;
        for badge in &unlocked {
            self.ledger
                .earn(badge.reward, &format!("Achievement: {}", badge.title))?;
            total_earned = total_earned.saturating_add(badge.reward);
        }

        let next_task_id = self.tasks.recommend_next()?;

        if let Some(user_id) = self.profile.user_id()? {
            self.outbox.enqueue(MirrorJob::RecordCompletion {
                user_id: user_id.to_string(),
                record: CompletionRecord {
                    title: task.title.clone(),
                    emoji: task.emoji.clone(),
                },
            });
        }

        info!(task_id, total_earned, streak = streak.streak, "focus completed");
        Ok(Some(CompletionReport {
            task_id: task.id,
            title: task.title,
            base_reward: task.coin_reward,
            first_of_day_bonus,
            consecutive_bonus,
            consecutive,
            streak,
            unlocked,
            total_earned,
            balance: self.ledger.balance()?,
            next_task_id,
        }))
    }

    /// A given-up session costs nothing and changes nothing.
    pub fn cancel_focus(&self, task_id: &str) {
        debug!(task_id, "focus cancelled");
    }

    /// Buy an item and put it in the first free cell.
    pub fn purchase(&mut self, item_id: &str) -> Result<PurchaseOutcome> {
        let Some(item) = shop_item(item_id) else {
            return Ok(PurchaseOutcome::UnknownItem);
        };
        if self.shop.has_purchased(item.id)? {
            return Ok(PurchaseOutcome::AlreadyOwned);
        }
        if !self.ledger.spend(item.price, &format!("Bought: {}", item.name))? {
            return Ok(PurchaseOutcome::InsufficientCoins {
                price: item.price,
                balance: self.ledger.balance()?,
            });
        }
        self.shop.record_purchase(item.id)?;

        let cell = match self.room.first_free_cell()? {
            Some((x, y)) if self.room.place(item.id, x, y)? => Some((x, y)),
            _ => None,
        };
        if cell.is_some() {
            self.sync_room()?;
        }
        info!(item_id, price = item.price, ?cell, "item purchased");
        Ok(PurchaseOutcome::Purchased {
            price: item.price,
            cell,
        })
    }

    // ── Room ─────────────────────────────────────────────────────────

    /// Place an owned item. Items not bought from the shop, or already in
    /// the room, are refused.
    pub fn place_item(&mut self, item_id: &str, x: i32, y: i32) -> Result<bool> {
        if !self.shop.has_purchased(item_id)? {
            return Ok(false);
        }
        if self.room.placed_items()?.iter().any(|p| p.item_id == item_id) {
            return Ok(false);
        }
        self.room_changed(|room| room.place(item_id, x, y))
    }

    pub fn remove_item(&mut self, x: i32, y: i32) -> Result<bool> {
        self.room_changed(|room| room.remove(x, y))
    }

    pub fn move_item(&mut self, from: (i32, i32), to: (i32, i32)) -> Result<bool> {
        self.room_changed(|room| room.move_item(from.0, from.1, to.0, to.1))
    }

    pub fn swap_items(&mut self, from: (i32, i32), to: (i32, i32)) -> Result<bool> {
        self.room_changed(|room| room.swap(from.0, from.1, to.0, to.1))
    }

    pub fn set_room_colors(&mut self, wall: Option<&str>, floor: Option<&str>) -> Result<()> {
        if let Some(wall) = wall {
            self.room.set_wall_color(wall)?;
        }
        if let Some(floor) = floor {
            self.room.set_floor_color(floor)?;
        }
        if wall.is_some() || floor.is_some() {
            self.sync_room()?;
        }
        Ok(())
    }

    fn room_changed(&mut self, f: impl FnOnce(&mut RoomGrid) -> Result<bool>) -> Result<bool> {
        let changed = f(&mut self.room)?;
        if changed {
            self.sync_room()?;
        }
        Ok(changed)
    }

    /// Queue the current layout for the mirror, if registered.
    fn sync_room(&self) -> Result<()> {
        if let Some(user_id) = self.profile.user_id()? {
            self.outbox.enqueue(MirrorJob::UpsertRoom {
                user_id: user_id.to_string(),
                room: self.room.snapshot()?,
            });
        }
        Ok(())
    }

    // ── Social ───────────────────────────────────────────────────────

    /// Create the remote profile and publish the initial room.
    pub async fn register(&mut self, nickname: &str) -> Result<bool> {
        let Some(mirror) = self.mirror.clone() else {
            return Ok(false);
        };
        if !self.profile.register(mirror.as_ref(), nickname).await? {
            return Ok(false);
        }
        self.sync_room()?;
        Ok(true)
    }

    pub async fn add_friend(&mut self, code: &str) -> Result<FriendOutcome> {
        let Some(code) = parse_friend_code(code) else {
            return Ok(FriendOutcome::InvalidCode);
        };
        let Some(user_id) = self.profile.user_id()?.map(str::to_string) else {
            return Ok(FriendOutcome::NotRegistered);
        };
        let Some(mirror) = self.mirror.clone() else {
            return Ok(FriendOutcome::Unavailable);
        };

        let friend = match mirror.find_profile_by_code(&code).await {
            Ok(Some(friend)) => friend,
            Ok(None) => return Ok(FriendOutcome::NotFound),
            Err(e) => {
                warn!(error = %e, "friend lookup failed");
                return Ok(FriendOutcome::Unavailable);
            }
        };
        if friend.id == user_id {
            return Ok(FriendOutcome::OwnCode);
        }

        let friends = match mirror.list_friends(&user_id).await {
            Ok(friends) => friends,
            Err(e) => {
                warn!(error = %e, "friend list failed");
                return Ok(FriendOutcome::Unavailable);
            }
        };
        if friends.iter().any(|f| f.id == friend.id) {
            return Ok(FriendOutcome::AlreadyFriends);
        }
        if let Err(e) = mirror.create_friendship(&user_id, &friend.id).await {
            warn!(error = %e, "friendship insert failed");
            return Ok(FriendOutcome::Unavailable);
        }

        let count = u32::try_from(friends.len() + 1).unwrap_or(u32::MAX);
        self.profile.set_friend_count(count)?;
        info!(friend = %friend.nickname, "friend added");
        Ok(FriendOutcome::Added {
            nickname: friend.nickname,
        })
    }

    /// Friends with today's completion counts. Refreshes the cached count.
    ///
    /// Returns `None` when the list could not be fetched.
    pub async fn friends(&mut self) -> Result<Option<Vec<FriendSummary>>> {
        let (Some(user_id), Some(mirror)) = (
            self.profile.user_id()?.map(str::to_string),
            self.mirror.clone(),
        ) else {
            return Ok(None);
        };

        let friends = match mirror.list_friends(&user_id).await {
            Ok(friends) => friends,
            Err(e) => {
                warn!(error = %e, "friend list failed");
                return Ok(None);
            }
        };
        self.profile
            .set_friend_count(u32::try_from(friends.len()).unwrap_or(u32::MAX))?;

        let ids: Vec<String> = friends.iter().map(|f| f.id.clone()).collect();
        let completions = match mirror.completed_tasks_since(&ids, self.start_of_today()).await {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, "friend completions failed");
                Vec::new()
            }
        };

        Ok(Some(
            friends
                .into_iter()
                .map(|profile| {
                    let today_count = completions
                        .iter()
                        .filter(|c| c.user_id == profile.id)
                        .count();
                    FriendSummary {
                        profile,
                        today_count: u32::try_from(today_count).unwrap_or(u32::MAX),
                    }
                })
                .collect(),
        ))
    }

    /// React to a friend's completion and return the new tallies.
    pub async fn react(&self, task_id: &str, emoji: &str) -> Result<Option<Vec<ReactionCount>>> {
        let (Some(user_id), Some(mirror)) = (self.profile.user_id()?, self.mirror.as_ref()) else {
            return Ok(None);
        };
        if let Err(e) = mirror.add_reaction(user_id, task_id, emoji).await {
            warn!(error = %e, "reaction failed");
            return Ok(None);
        }
        match mirror.reaction_counts(task_id).await {
            Ok(counts) => Ok(Some(counts)),
            Err(e) => {
                warn!(error = %e, "reaction tally failed");
                Ok(None)
            }
        }
    }

    fn start_of_today(&self) -> DateTime<FixedOffset> {
        let now = self.clock.now();
        self.clock
            .today()
            .and_hms_opt(0, 0, 0)
            .and_then(|midnight| now.offset().from_local_datetime(&midnight).single())
            .unwrap_or(now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::storage::MemoryStore;

    fn app(at: &str) -> (App, FixedClock) {
        let clock = FixedClock::at(at);
        let mut app = App::with_seed(
            Arc::new(MemoryStore::new()),
            Arc::new(clock.clone()),
            Config::default(),
            42,
        );
        app.hydrate().unwrap();
        (app, clock)
    }

    fn recommend(app: &mut App) -> String {
        app.tasks_mut()
            .declare_condition(crate::task::ConditionLevel::Okay)
            .unwrap()
            .unwrap()
    }

    #[test]
    fn first_completion_pays_reward_bonus_and_badge() {
        let (mut app, _) = app("2024-03-01T12:00:00+09:00");
        let id = recommend(&mut app);
        let reward = app.tasks().task(&id).unwrap().unwrap().coin_reward;

        let report = app.complete_focus(&id).unwrap().unwrap();
        assert_eq!(report.first_of_day_bonus, 10);
        assert_eq!(report.consecutive_bonus, 0);
        assert_eq!(report.streak.streak, 1);
        assert!(report.streak.milestone.is_none());
        let ids: Vec<_> = report.unlocked.iter().map(|a| a.id).collect();
        assert_eq!(ids, vec!["first_task"]);
        assert_eq!(report.balance, reward + 10 + 5);
        assert_eq!(report.total_earned, report.balance);
        assert_ne!(report.next_task_id.as_deref(), Some(id.as_str()));
    }

    #[test]
    fn completing_twice_is_a_noop() {
        let (mut app, _) = app("2024-03-01T12:00:00+09:00");
        let id = recommend(&mut app);
        app.complete_focus(&id).unwrap().unwrap();
        let balance = app.ledger().balance().unwrap();
        assert!(app.complete_focus(&id).unwrap().is_none());
        assert!(app.complete_focus("todo_missing").unwrap().is_none());
        assert_eq!(app.ledger().balance().unwrap(), balance);
        assert_eq!(app.ledger().consecutive().unwrap(), 1);
    }

    #[test]
    fn third_completion_earns_consecutive_bonus() {
        let (mut app, _) = app("2024-03-01T12:00:00+09:00");
        let mut bonuses = Vec::new();
        for _ in 0..3 {
            let id = app.tasks().current_task().unwrap().map(|t| t.id.clone());
            let id = id.unwrap_or_else(|| recommend(&mut app));
            let report = app.complete_focus(&id).unwrap().unwrap();
            bonuses.push((report.first_of_day_bonus, report.consecutive_bonus));
        }
        assert_eq!(bonuses, vec![(10, 0), (0, 0), (0, 5)]);
    }

    #[test]
    fn cancel_changes_nothing() {
        let (mut app, _) = app("2024-03-01T12:00:00+09:00");
        let id = recommend(&mut app);
        app.cancel_focus(&id);
        assert_eq!(app.ledger().balance().unwrap(), 0);
        assert!(!app.tasks().task(&id).unwrap().unwrap().is_completed());
    }

    #[test]
    fn purchase_spends_records_and_places() {
        let (mut app, _) = app("2024-03-01T12:00:00+09:00");
        assert_eq!(
            app.purchase("item_cactus").unwrap(),
            PurchaseOutcome::InsufficientCoins { price: 10, balance: 0 }
        );
        assert!(!app.shop().has_purchased("item_cactus").unwrap());

        let id = recommend(&mut app);
        app.complete_focus(&id).unwrap();
        let before = app.ledger().balance().unwrap();

        assert_eq!(
            app.purchase("item_cactus").unwrap(),
            PurchaseOutcome::Purchased { price: 10, cell: Some((0, 0)) }
        );
        assert_eq!(app.ledger().balance().unwrap(), before - 10);
        assert_eq!(app.room().item_at(0, 0).unwrap(), Some("item_cactus"));
        assert_eq!(app.purchase("item_cactus").unwrap(), PurchaseOutcome::AlreadyOwned);
        assert_eq!(app.purchase("item_dragon").unwrap(), PurchaseOutcome::UnknownItem);
    }

    #[test]
    fn only_owned_items_can_be_placed() {
        let (mut app, _) = app("2024-03-01T12:00:00+09:00");
        assert!(!app.place_item("item_piano", 3, 3).unwrap());
        assert!(app.room().placed_items().unwrap().is_empty());
    }

    #[test]
    fn oversized_bonus_is_capped_not_overflowed() {
        let mut config = Config::default();
        config.rewards.first_of_day_bonus = u64::MAX;
        let clock = FixedClock::at("2024-03-01T12:00:00+09:00");
        let mut app = App::with_seed(Arc::new(MemoryStore::new()), Arc::new(clock), config, 42);
        app.hydrate().unwrap();

        let id = recommend(&mut app);
        let report = app.complete_focus(&id).unwrap().unwrap();
        assert_eq!(report.total_earned, u64::MAX);
        assert_eq!(report.balance, crate::ledger::MAX_TOTAL_EARNED);
        let s = app.ledger().state().unwrap();
        assert_eq!(s.balance, s.total_earned - s.total_spent);
    }

    #[test]
    fn owned_item_is_placed_at_most_once() {
        let (mut app, _) = app("2024-03-01T12:00:00+09:00");
        app.ledger.earn(100, "test").unwrap();
        assert!(matches!(
            app.purchase("item_cactus").unwrap(),
            PurchaseOutcome::Purchased { cell: Some((0, 0)), .. }
        ));

        for (x, y) in [(1, 0), (2, 0), (3, 3)] {
            assert!(!app.place_item("item_cactus", x, y).unwrap());
        }
        assert_eq!(app.room().placed_items().unwrap().len(), 1);
        assert_eq!(app.room().level().unwrap(), 1);

        assert!(app.remove_item(0, 0).unwrap());
        assert!(app.place_item("item_cactus", 4, 2).unwrap());
        assert_eq!(app.room().item_at(4, 2).unwrap(), Some("item_cactus"));
    }

    #[test]
    fn deleting_a_finished_task_keeps_the_day_bonus_spent() {
        use crate::task::{Difficulty, NewTask, TaskCategory};

        let (mut app, clock) = app("2024-03-01T12:00:00+09:00");
        let add = |app: &mut App, title: &str| {
            app.tasks_mut()
                .add_task(NewTask::custom(title, TaskCategory::Chore, Difficulty::Easy, 5))
                .unwrap()
                .id
        };

        let first = add(&mut app, "Fold laundry");
        assert_eq!(app.complete_focus(&first).unwrap().unwrap().first_of_day_bonus, 10);
        assert!(app.tasks_mut().delete_task(&first).unwrap());
        assert!(app.tasks().today_completed().unwrap().is_empty());

        let second = add(&mut app, "Wipe the desk");
        assert_eq!(app.complete_focus(&second).unwrap().unwrap().first_of_day_bonus, 0);

        clock.advance_days(1);
        let third = add(&mut app, "Water plants");
        assert_eq!(app.complete_focus(&third).unwrap().unwrap().first_of_day_bonus, 10);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_gives_up_on_a_stalled_mirror() {
        use crate::error::MirrorError;
        use crate::mirror::RemoteCompletion;
        use crate::room::RoomSnapshot;
        use std::future::pending;

        struct Stalled;

        #[async_trait::async_trait]
        impl RemoteMirror for Stalled {
            async fn upsert_room(&self, _: &str, _: &RoomSnapshot) -> Result<(), MirrorError> {
                pending().await
            }
            async fn register_profile(&self, _: &str, _: &str) -> Result<RemoteProfile, MirrorError> {
                pending().await
            }
            async fn find_profile_by_code(
                &self,
                _: &str,
            ) -> Result<Option<RemoteProfile>, MirrorError> {
                pending().await
            }
            async fn create_friendship(&self, _: &str, _: &str) -> Result<(), MirrorError> {
                pending().await
            }
            async fn list_friends(&self, _: &str) -> Result<Vec<RemoteProfile>, MirrorError> {
                pending().await
            }
            async fn record_completed_task(
                &self,
                _: &str,
                _: &CompletionRecord,
            ) -> Result<(), MirrorError> {
                pending().await
            }
            async fn completed_tasks_since(
                &self,
                _: &[String],
                _: DateTime<FixedOffset>,
            ) -> Result<Vec<RemoteCompletion>, MirrorError> {
                pending().await
            }
            async fn reaction_counts(&self, _: &str) -> Result<Vec<ReactionCount>, MirrorError> {
                pending().await
            }
            async fn add_reaction(&self, _: &str, _: &str, _: &str) -> Result<(), MirrorError> {
                pending().await
            }
        }

        let (app, _) = app("2024-03-01T12:00:00+09:00");
        let app = app.with_mirror(Arc::new(Stalled));
        assert!(app.outbox.enqueue(MirrorJob::RecordCompletion {
            user_id: "u-1".into(),
            record: CompletionRecord {
                title: "Drink water".into(),
                emoji: "💧".into(),
            },
        }));

        let started = tokio::time::Instant::now();
        app.shutdown().await;
        assert!(started.elapsed() >= SHUTDOWN_GRACE);
        assert!(started.elapsed() < SHUTDOWN_GRACE * 2);
    }

    #[test]
    fn streak_milestone_is_paid_on_day_three() {
        let (mut app, clock) = app("2024-03-01T12:00:00+09:00");
        let mut milestone_days = Vec::new();
        for _ in 0..3 {
            let id = recommend(&mut app);
            let report = app.complete_focus(&id).unwrap().unwrap();
            if let Some(m) = report.streak.milestone {
                milestone_days.push(m.days);
                assert!(report.unlocked.iter().any(|a| a.id == "streak_3"));
            }
            clock.advance_days(1);
        }
        assert_eq!(milestone_days, vec![3]);
    }

    #[test]
    fn stats_reflect_live_state() {
        let (mut app, _) = app("2024-03-01T06:30:00+09:00");
        let id = recommend(&mut app);
        let report = app.complete_focus(&id).unwrap().unwrap();
        assert!(report.unlocked.iter().any(|a| a.id == "early_bird"));
        let stats = app.stats().unwrap();
        assert_eq!(stats.total_completed, 1);
        assert_eq!(stats.current_hour, 6);
        assert_eq!(stats.total_coins, app.ledger().balance().unwrap());
    }

    #[tokio::test]
    async fn social_calls_without_mirror_degrade() {
        let (mut app, _) = app("2024-03-01T12:00:00+09:00");
        assert!(!app.register("mina").await.unwrap());
        assert_eq!(app.add_friend("ABC234").await.unwrap(), FriendOutcome::NotRegistered);
        assert_eq!(app.add_friend("bad").await.unwrap(), FriendOutcome::InvalidCode);
        assert!(app.friends().await.unwrap().is_none());
    }
}
