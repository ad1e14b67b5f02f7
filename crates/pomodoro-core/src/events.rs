use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::Phase;

/// Every state change in the timer produces an Event.
/// The CLI renders them; the notifier subscribes to them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    /// A countdown began from the Stopped phase or from a running phase
    /// without a live task.
    TimerStarted {
        phase: Phase,
        remaining_secs: u64,
        round: u32,
        at: DateTime<Utc>,
    },
    /// A paused countdown continued in the phase it was paused in.
    TimerResumed {
        phase: Phase,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    TimerPaused {
        /// Phase that was running when the pause happened.
        phase: Phase,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    TimerStopped {
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    /// One one-second decrement.
    Tick {
        phase: Phase,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    /// The countdown reached zero and the engine moved to the next phase.
    PhaseEnded {
        from: Phase,
        to: Phase,
        /// Round after the transition.
        round: u32,
        /// Length of the phase that was just entered.
        next_secs: u64,
        at: DateTime<Utc>,
    },
    /// A new settings snapshot replaced the previous one.
    SettingsApplied {
        work_secs: u64,
        short_break_secs: u64,
        long_break_secs: u64,
        long_break_interval: u32,
        at: DateTime<Utc>,
    },
}
