mod driver;
mod environment;
mod session;

pub use driver::{run_focus, FocusControl, FocusOutcome};
pub use environment::{FocusEnvironment, NoopEnvironment, FINISH_VIBRATION};
pub use session::{duration_options, recommended_minutes, FocusPhase, FocusSession};
