mod engine;
mod phase;
mod session;

pub use engine::{is_long_break_due, TimerEngine, TICK};
pub use phase::{Phase, TimerConfig, TimerSnapshot};
pub use session::PomodoroSession;
