//! Task store: the catalog, today's condition, and the single recommendation.
//!
//! ## Recommendation
//!
//! ```text
//! available  = incomplete tasks not completed today
//! candidates = available narrowed by condition (fallback: available)
//! current    = uniform pick from candidates, or None when nothing is left
//! ```

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::NaiveDate;
use rand::{Rng, RngCore, SeedableRng};
use rand_pcg::Pcg64;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use super::catalog::default_tasks;
use super::condition::ConditionLevel;
use super::model::{NewTask, Task};
use crate::clock::Clock;
use crate::error::Result;
use crate::storage::{Persisted, StateStore};

pub const TASKS_KEY: &str = "onething-todos";

/// Persisted record of the task store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskState {
    pub tasks: Vec<Task>,
    pub current_task_id: Option<String>,
    pub today_condition: Option<ConditionLevel>,
    pub condition_set_date: Option<NaiveDate>,
    #[serde(default)]
    pub completed_today: BTreeSet<String>,
}

impl TaskState {
    fn is_available(&self, task: &Task) -> bool {
        !task.is_completed() && !self.completed_today.contains(&task.id)
    }

    fn available(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter().filter(move |t| self.is_available(t))
    }
}

pub struct TaskStore {
    state: Persisted<TaskState>,
    clock: Arc<dyn Clock>,
    rng: Box<dyn RngCore + Send>,
}

impl TaskStore {
    /// Store with an entropy-seeded random source.
    pub fn new(backend: Arc<dyn StateStore>, clock: Arc<dyn Clock>) -> Self {
        Self::with_rng(backend, clock, Box::new(Pcg64::from_entropy()))
    }

    /// Store with a fixed seed; recommendations are reproducible.
    pub fn seeded(backend: Arc<dyn StateStore>, clock: Arc<dyn Clock>, seed: u64) -> Self {
        Self::with_rng(backend, clock, Box::new(Pcg64::seed_from_u64(seed)))
    }

    pub fn with_rng(
        backend: Arc<dyn StateStore>,
        clock: Arc<dyn Clock>,
        rng: Box<dyn RngCore + Send>,
    ) -> Self {
        Self {
            state: Persisted::new(TASKS_KEY, backend),
            clock,
            rng,
        }
    }

    pub fn hydrate(&mut self) -> Result<()> {
        self.state.hydrate()
    }

    pub fn is_hydrated(&self) -> bool {
        self.state.is_hydrated()
    }

    pub fn state(&self) -> Result<&TaskState> {
        self.state.get()
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn tasks(&self) -> Result<&[Task]> {
        Ok(&self.state.get()?.tasks)
    }

    pub fn task(&self, id: &str) -> Result<Option<&Task>> {
        Ok(self.state.get()?.tasks.iter().find(|t| t.id == id))
    }

    pub fn current_task(&self) -> Result<Option<&Task>> {
        let state = self.state.get()?;
        Ok(state
            .current_task_id
            .as_deref()
            .and_then(|id| state.tasks.iter().find(|t| t.id == id)))
    }

    pub fn condition(&self) -> Result<Option<ConditionLevel>> {
        Ok(self.state.get()?.today_condition)
    }

    /// True when no condition has been declared for today.
    pub fn needs_condition_check(&self) -> Result<bool> {
        Ok(self.state.get()?.condition_set_date != Some(self.clock.today()))
    }

    /// Tasks whose completion falls on today's local date.
    pub fn today_completed(&self) -> Result<Vec<&Task>> {
        let today = self.clock.today();
        Ok(self
            .state
            .get()?
            .tasks
            .iter()
            .filter(|t| t.completed_on(today))
            .collect())
    }

    /// Tasks the recommender would currently choose between.
    pub fn candidates(&self) -> Result<Vec<&Task>> {
        let state = self.state.get()?;
        let available: Vec<&Task> = state.available().collect();
        let Some(level) = state.today_condition else {
            return Ok(available);
        };
        let narrowed: Vec<&Task> = available
            .iter()
            .copied()
            .filter(|t| level.admits(t.difficulty))
            .collect();
        Ok(if narrowed.is_empty() { available } else { narrowed })
    }

    pub fn total_completed(&self) -> Result<usize> {
        Ok(self
            .state
            .get()?
            .tasks
            .iter()
            .filter(|t| t.is_completed())
            .count())
    }

    pub fn has_custom_task(&self) -> Result<bool> {
        Ok(self.state.get()?.tasks.iter().any(|t| t.is_custom))
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Record today's condition, clear the same-day filter, and recommend.
    ///
    /// Returns the new recommendation.
    pub fn declare_condition(&mut self, level: ConditionLevel) -> Result<Option<String>> {
        let today = self.clock.today();
        self.state.update(|s| {
            s.today_condition = Some(level);
            s.condition_set_date = Some(today);
            s.completed_today.clear();
        })?;
        debug!(condition = %level, "condition declared");
        self.recommend_next()
    }

    /// Pick the next task for the current condition.
    pub fn recommend_next(&mut self) -> Result<Option<String>> {
        let ids: Vec<String> = self.candidates()?.iter().map(|t| t.id.clone()).collect();
        let pick = if ids.is_empty() {
            None
        } else {
            let index = self.rng.gen_range(0..ids.len());
            Some(ids[index].clone())
        };
        self.state.update(|s| s.current_task_id = pick.clone())?;
        debug!(task_id = ?pick, "recommended");
        Ok(pick)
    }

    /// Mark a task done. Unknown or already-completed ids are a no-op.
    pub fn complete_task(&mut self, id: &str) -> Result<bool> {
        let completable = self
            .task(id)?
            .is_some_and(|t| !t.is_completed());
        if !completable {
            debug!(task_id = id, "complete ignored");
            return Ok(false);
        }
        let now = self.clock.now();
        self.state.update(|s| {
            if let Some(task) = s.tasks.iter_mut().find(|t| t.id == id) {
                task.completed_at = Some(now);
            }
            s.completed_today.insert(id.to_string());
            s.current_task_id = None;
        })?;
        info!(task_id = id, "task completed");
        Ok(true)
    }

    /// Append a task to the catalog.
    ///
    /// # Errors
    /// Validation failure for a blank title or zero estimate.
    pub fn add_task(&mut self, new: NewTask) -> Result<Task> {
        new.validate()?;
        let task = new.into_task(format!("todo_{}", Uuid::new_v4().simple()), self.clock.now());
        self.state.update(|s| s.tasks.push(task.clone()))?;
        Ok(task)
    }

    /// Remove a custom task. Built-in tasks cannot be deleted.
    ///
    /// Deleting the current recommendation clears it.
    pub fn delete_task(&mut self, id: &str) -> Result<bool> {
        if !self.task(id)?.is_some_and(|t| t.is_custom) {
            return Ok(false);
        }
        self.state.update(|s| {
            s.tasks.retain(|t| t.id != id);
            s.completed_today.remove(id);
            if s.current_task_id.as_deref() == Some(id) {
                s.current_task_id = None;
            }
        })?;
        Ok(true)
    }

    /// Make a specific available task the recommendation.
    pub fn set_current(&mut self, id: &str) -> Result<bool> {
        let state = self.state.get()?;
        let available = state
            .tasks
            .iter()
            .any(|t| t.id == id && state.is_available(t));
        if !available {
            return Ok(false);
        }
        self.state
            .update(|s| s.current_task_id = Some(id.to_string()))?;
        Ok(true)
    }

    /// Seed the built-in catalog into an empty store.
    ///
    /// Returns how many tasks were added.
    pub fn seed_defaults(&mut self) -> Result<usize> {
        if !self.state.get()?.tasks.is_empty() {
            return Ok(0);
        }
        let defaults = default_tasks();
        let count = defaults.len();
        for new in defaults {
            self.add_task(new)?;
        }
        info!(count, "seeded default tasks");
        Ok(count)
    }
}
