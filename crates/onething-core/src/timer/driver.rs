//! Async driver that ticks a [`FocusSession`] once per second.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{interval, MissedTickBehavior};
use tracing::debug;

use super::environment::{self, FocusEnvironment};
use super::session::{FocusPhase, FocusSession};
use crate::events::Event;
use crate::storage::TimerConfig;

/// User input while a countdown runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusControl {
    Pause,
    Resume,
    Cancel,
    Backgrounded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusOutcome {
    Finished,
    Cancelled,
}

/// Run a started session to its end.
///
/// Controls are applied as they arrive. `observe` sees every event the
/// session emits plus one call per elapsed second (with `None`). Only the
/// environment hooks enabled in `config` are used. If the
/// control channel closes while the session is paused nobody can resume it,
/// so it is cancelled.
pub async fn run_focus<F>(
    session: &mut FocusSession,
    env: &dyn FocusEnvironment,
    config: &TimerConfig,
    mut controls: mpsc::UnboundedReceiver<FocusControl>,
    mut observe: F,
) -> FocusOutcome
where
    F: FnMut(&FocusSession, Option<&Event>),
{
    if !matches!(session.phase(), FocusPhase::Running | FocusPhase::Paused) {
        return FocusOutcome::Cancelled;
    }

    environment::enter(env, config);
    let mut ticker = interval(Duration::from_secs(1));
    // Catch-up ticks after a stall still count as elapsed seconds.
    ticker.set_missed_tick_behavior(MissedTickBehavior::Burst);
    ticker.tick().await;

    let mut controls_open = true;
    let outcome = loop {
        let running = session.phase() == FocusPhase::Running;
        if !controls_open && !running {
            let event = session.cancel();
            observe(session, event.as_ref());
            break FocusOutcome::Cancelled;
        }

        tokio::select! {
            biased;
            control = controls.recv(), if controls_open => {
                let Some(control) = control else {
                    controls_open = false;
                    continue;
                };
                debug!(?control, "focus control");
                let event = match control {
                    FocusControl::Pause => session.pause(),
                    FocusControl::Backgrounded => session.backgrounded(),
                    FocusControl::Resume => {
                        let event = session.resume();
                        if event.is_some() {
                            ticker.reset();
                        }
                        event
                    }
                    FocusControl::Cancel => session.cancel(),
                };
                if let Some(event) = &event {
                    observe(session, Some(event));
                    if matches!(event, Event::FocusCancelled { .. }) {
                        break FocusOutcome::Cancelled;
                    }
                }
            }
            _ = ticker.tick(), if running => {
                let event = session.tick();
                observe(session, event.as_ref());
                if event.is_some() {
                    environment::finish(env, config);
                    break FocusOutcome::Finished;
                }
            }
        }
    };

    environment::leave(env, config);
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{Clock, FixedClock};
    use crate::timer::NoopEnvironment;
    use crate::task::{Difficulty, NewTask, TaskCategory};
    use std::sync::{Arc, Mutex};

    fn started(minutes: u32) -> FocusSession {
        let clock = FixedClock::at("2024-03-01T09:00:00+09:00");
        let task = NewTask::custom("Read", TaskCategory::Fun, Difficulty::Easy, 5)
            .into_task("todo_read".into(), clock.now());
        let mut s = FocusSession::new(&task, Arc::new(clock));
        s.start(minutes).unwrap();
        s
    }

    #[derive(Default)]
    struct Recording {
        calls: Mutex<Vec<String>>,
    }

    impl FocusEnvironment for Recording {
        fn keep_awake(&self, on: bool) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
            self.calls.lock().unwrap().push(format!("awake:{on}"));
            Err("wake lock unsupported".into())
        }

        fn set_fullscreen(&self, on: bool) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
            self.calls.lock().unwrap().push(format!("fullscreen:{on}"));
            Ok(())
        }

        fn vibrate(&self, pattern_ms: &[u64]) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
            self.calls.lock().unwrap().push(format!("vibrate:{}", pattern_ms.len()));
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn runs_to_completion() {
        let mut s = started(5);
        let env = Recording::default();
        let (_tx, rx) = mpsc::unbounded_channel();
        let mut ticks = 0;
        let outcome = run_focus(&mut s, &env, &TimerConfig::default(), rx, |_, event| {
            if event.is_none() {
                ticks += 1;
            }
        })
        .await;

        assert_eq!(outcome, FocusOutcome::Finished);
        assert_eq!(ticks, 299);
        assert_eq!(s.phase(), FocusPhase::Finished);
        assert_eq!(
            *env.calls.lock().unwrap(),
            vec!["awake:true", "vibrate:5", "awake:false"]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn disabled_hooks_are_never_called() {
        let quiet = TimerConfig {
            haptics: false,
            keep_awake: false,
            fullscreen: false,
        };
        let mut s = started(1);
        let env = Recording::default();
        let (_tx, rx) = mpsc::unbounded_channel();
        let outcome = run_focus(&mut s, &env, &quiet, rx, |_, _| {}).await;
        assert_eq!(outcome, FocusOutcome::Finished);
        assert!(env.calls.lock().unwrap().is_empty());

        let fullscreen_only = TimerConfig {
            fullscreen: true,
            ..quiet
        };
        let mut s = started(1);
        let env = Recording::default();
        let (tx, rx) = mpsc::unbounded_channel();
        tx.send(FocusControl::Cancel).unwrap();
        let outcome = run_focus(&mut s, &env, &fullscreen_only, rx, |_, _| {}).await;
        assert_eq!(outcome, FocusOutcome::Cancelled);
        assert_eq!(
            *env.calls.lock().unwrap(),
            vec!["fullscreen:true", "fullscreen:false"]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_stops_without_finishing() {
        let mut s = started(5);
        let (tx, rx) = mpsc::unbounded_channel();
        tx.send(FocusControl::Cancel).unwrap();
        let outcome = run_focus(&mut s, &NoopEnvironment, &TimerConfig::default(), rx, |_, _| {}).await;
        assert_eq!(outcome, FocusOutcome::Cancelled);
        assert_eq!(s.phase(), FocusPhase::SelectingDuration);
    }

    #[tokio::test(start_paused = true)]
    async fn pause_then_resume_still_finishes() {
        let mut s = started(5);
        let (tx, rx) = mpsc::unbounded_channel();
        tx.send(FocusControl::Pause).unwrap();
        tx.send(FocusControl::Resume).unwrap();
        let mut events = Vec::new();
        let outcome = run_focus(&mut s, &NoopEnvironment, &TimerConfig::default(), rx, |_, e| {
            if let Some(e) = e {
                events.push(e.clone());
            }
        })
        .await;
        drop(tx);

        assert_eq!(outcome, FocusOutcome::Finished);
        assert!(matches!(events[0], Event::FocusPaused { .. }));
        assert!(matches!(events[1], Event::FocusResumed { .. }));
        assert!(matches!(events[2], Event::FocusCompleted { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn backgrounded_with_no_controller_is_cancelled() {
        let mut s = started(5);
        let (tx, rx) = mpsc::unbounded_channel();
        tx.send(FocusControl::Backgrounded).unwrap();
        drop(tx);
        let outcome = run_focus(&mut s, &NoopEnvironment, &TimerConfig::default(), rx, |_, _| {}).await;
        assert_eq!(outcome, FocusOutcome::Cancelled);
    }

    #[tokio::test]
    async fn unstarted_session_is_not_run() {
        let clock = FixedClock::at("2024-03-01T09:00:00+09:00");
        let task = NewTask::custom("Read", TaskCategory::Fun, Difficulty::Easy, 5)
            .into_task("todo_read".into(), clock.now());
        let mut s = FocusSession::new(&task, Arc::new(clock));
        let (_tx, rx) = mpsc::unbounded_channel();
        let outcome = run_focus(&mut s, &NoopEnvironment, &TimerConfig::default(), rx, |_, _| {}).await;
        assert_eq!(outcome, FocusOutcome::Cancelled);
    }
}
