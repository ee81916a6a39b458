//! Device side channels used during a focus session.

use tracing::warn;

use crate::storage::TimerConfig;

/// Vibration pattern played when a countdown finishes, in milliseconds
/// (on, off, on, off, on).
pub const FINISH_VIBRATION: [u64; 5] = [200, 100, 200, 100, 300];

/// Screen and haptics hooks around a focus session.
///
/// Every hook is optional and best effort: a failure is logged and the
/// session carries on.
pub trait FocusEnvironment: Send + Sync {
    /// Hold or release the stay-awake lock.
    fn keep_awake(&self, _on: bool) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        Ok(()) // default no-op
    }

    fn set_fullscreen(&self, _on: bool) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        Ok(()) // default no-op
    }

    fn vibrate(&self, _pattern_ms: &[u64]) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        Ok(()) // default no-op
    }
}

/// Environment without any side channels.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopEnvironment;

impl FocusEnvironment for NoopEnvironment {}

pub(crate) fn best_effort(
    what: &str,
    result: Result<(), Box<dyn std::error::Error + Send + Sync>>,
) {
    if let Err(e) = result {
        warn!(hook = what, error = %e, "focus environment hook failed");
    }
}

/// Acquire the focus-mode side channels the user switched on.
pub(crate) fn enter(env: &dyn FocusEnvironment, config: &TimerConfig) {
    toggle(env, config, true);
}

/// Release them again.
pub(crate) fn leave(env: &dyn FocusEnvironment, config: &TimerConfig) {
    toggle(env, config, false);
}

fn toggle(env: &dyn FocusEnvironment, config: &TimerConfig, on: bool) {
    if config.keep_awake {
        best_effort("keep_awake", env.keep_awake(on));
    }
    if config.fullscreen {
        best_effort("fullscreen", env.set_fullscreen(on));
    }
}

/// Play the finish pattern unless haptics are off.
pub(crate) fn finish(env: &dyn FocusEnvironment, config: &TimerConfig) {
    if config.haptics {
        best_effort("vibrate", env.vibrate(&FINISH_VIBRATION));
    }
}
