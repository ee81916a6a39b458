//! Focus countdown for one task.
//!
//! Caller-driven like a metronome: each `tick()` is one elapsed second. No
//! persisted store is touched here; completion is reported as an event and the
//! orchestrator decides what it is worth.
//!
//! ```text
//! SelectingDuration -> Running <-> Paused
//!                      Running -> Finished
//! Running | Paused -> (cancelled) -> SelectingDuration
//! ```

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::clock::Clock;
use crate::events::Event;
use crate::task::Task;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FocusPhase {
    SelectingDuration,
    Running,
    Paused,
    Finished,
}

/// Selectable focus lengths in minutes for a task estimate.
pub fn duration_options(estimated_minutes: u32) -> [u32; 3] {
    match estimated_minutes {
        0..=5 => [5, 15, 25],
        6..=15 => [15, 25, 45],
        16..=30 => [25, 45, 60],
        _ => [45, 60, 90],
    }
}

pub fn recommended_minutes(estimated_minutes: u32) -> u32 {
    duration_options(estimated_minutes)[0]
}

const BUDDY_LINES: [&str; 4] = [
    "Focusing together...",
    "Working hard!",
    "You're doing great, keep going!",
    "Almost there!",
];
const BUDDY_ROTATE_SECS: u64 = 30;

pub struct FocusSession {
    task_id: String,
    task_title: String,
    estimated_minutes: u32,
    phase: FocusPhase,
    total_secs: u64,
    remaining_secs: u64,
    clock: Arc<dyn Clock>,
}

impl FocusSession {
    pub fn new(task: &Task, clock: Arc<dyn Clock>) -> Self {
        Self {
            task_id: task.id.clone(),
            task_title: task.title.clone(),
            estimated_minutes: task.estimated_minutes,
            phase: FocusPhase::SelectingDuration,
            total_secs: 0,
            remaining_secs: 0,
            clock,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    pub fn task_title(&self) -> &str {
        &self.task_title
    }

    pub fn phase(&self) -> FocusPhase {
        self.phase
    }

    pub fn total_secs(&self) -> u64 {
        self.total_secs
    }

    pub fn remaining_secs(&self) -> u64 {
        self.remaining_secs
    }

    pub fn options(&self) -> [u32; 3] {
        duration_options(self.estimated_minutes)
    }

    pub fn recommended(&self) -> u32 {
        recommended_minutes(self.estimated_minutes)
    }

    /// 0.0 before start, 1.0 when finished.
    pub fn progress(&self) -> f64 {
        if self.total_secs == 0 {
            return 0.0;
        }
        1.0 - self.remaining_secs as f64 / self.total_secs as f64
    }

    /// Remaining time as `MM:SS`.
    pub fn display(&self) -> String {
        format!("{:02}:{:02}", self.remaining_secs / 60, self.remaining_secs % 60)
    }

    /// Encouragement from the focus buddy; changes every 30 s of focus.
    pub fn buddy_line(&self) -> &'static str {
        let elapsed = self.total_secs - self.remaining_secs;
        BUDDY_LINES[((elapsed / BUDDY_ROTATE_SECS) as usize) % BUDDY_LINES.len()]
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Begin counting down. Only valid while selecting a duration and only
    /// for one of [`FocusSession::options`].
    pub fn start(&mut self, minutes: u32) -> Option<Event> {
        if self.phase != FocusPhase::SelectingDuration
            || minutes == 0
            || !self.options().contains(&minutes)
        {
            return None;
        }
        self.total_secs = u64::from(minutes) * 60;
        self.remaining_secs = self.total_secs;
        self.phase = FocusPhase::Running;
        debug!(task_id = %self.task_id, minutes, "focus started");
        Some(Event::FocusStarted {
            task_id: self.task_id.clone(),
            minutes,
            at: self.clock.now(),
        })
    }

    /// Advance by one second. Yields `FocusCompleted` exactly once.
    pub fn tick(&mut self) -> Option<Event> {
        if self.phase != FocusPhase::Running {
            return None;
        }
        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        if self.remaining_secs > 0 {
            return None;
        }
        self.phase = FocusPhase::Finished;
        debug!(task_id = %self.task_id, "focus finished");
        Some(Event::FocusCompleted {
            task_id: self.task_id.clone(),
            total_secs: self.total_secs,
            at: self.clock.now(),
        })
    }

    pub fn pause(&mut self) -> Option<Event> {
        self.pause_inner(false)
    }

    /// The app went to the background; a running countdown pauses.
    pub fn backgrounded(&mut self) -> Option<Event> {
        self.pause_inner(true)
    }

    pub fn resume(&mut self) -> Option<Event> {
        if self.phase != FocusPhase::Paused {
            return None;
        }
        self.phase = FocusPhase::Running;
        Some(Event::FocusResumed {
            task_id: self.task_id.clone(),
            remaining_secs: self.remaining_secs,
            at: self.clock.now(),
        })
    }

    /// Give up. Carries no penalty; the session returns to duration selection.
    pub fn cancel(&mut self) -> Option<Event> {
        if !matches!(self.phase, FocusPhase::Running | FocusPhase::Paused) {
            return None;
        }
        let remaining_secs = self.remaining_secs;
        self.phase = FocusPhase::SelectingDuration;
        self.total_secs = 0;
        self.remaining_secs = 0;
        debug!(task_id = %self.task_id, remaining_secs, "focus cancelled");
        Some(Event::FocusCancelled {
            task_id: self.task_id.clone(),
            remaining_secs,
            at: self.clock.now(),
        })
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn pause_inner(&mut self, backgrounded: bool) -> Option<Event> {
        if self.phase != FocusPhase::Running {
            return None;
        }
        self.phase = FocusPhase::Paused;
        Some(Event::FocusPaused {
            task_id: self.task_id.clone(),
            remaining_secs: self.remaining_secs,
            backgrounded,
            at: self.clock.now(),
        })
    }
}
