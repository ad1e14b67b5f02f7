use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::storage::ScheduleConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Working,
    ShortBreak,
    LongBreak,
    Paused,
    Stopped,
}

impl Phase {
    /// True for the three phases a countdown can run in.
    pub fn is_running(self) -> bool {
        matches!(self, Phase::Working | Phase::ShortBreak | Phase::LongBreak)
    }

    pub fn label(self) -> &'static str {
        match self {
            Phase::Working => "Working",
            Phase::ShortBreak => "Short Break",
            Phase::LongBreak => "Long Break",
            Phase::Paused => "Paused",
            Phase::Stopped => "Stopped",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Durations the engine counts down from.
///
/// A snapshot: settings changes replace it wholesale and never rescale a
/// countdown that is already running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerConfig {
    pub work: Duration,
    pub short_break: Duration,
    pub long_break: Duration,
    /// Completed work rounds between long breaks. Zero is treated as one.
    pub long_break_interval: u32,
}

impl TimerConfig {
    pub fn from_minutes(
        work: u32,
        short_break: u32,
        long_break: u32,
        long_break_interval: u32,
    ) -> Self {
        Self {
            work: minutes(work),
            short_break: minutes(short_break),
            long_break: minutes(long_break),
            long_break_interval,
        }
    }

    /// Duration a running phase starts from.
    pub fn duration_of(&self, phase: Phase) -> Duration {
        match phase {
            Phase::ShortBreak => self.short_break,
            Phase::LongBreak => self.long_break,
            Phase::Working | Phase::Paused | Phase::Stopped => self.work,
        }
    }
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self::from(&ScheduleConfig::default())
    }
}

impl From<&ScheduleConfig> for TimerConfig {
    fn from(schedule: &ScheduleConfig) -> Self {
        Self::from_minutes(
            schedule.work_time_minutes,
            schedule.short_break_time_minutes,
            schedule.long_break_time_minutes,
            schedule.long_break_interval,
        )
    }
}

fn minutes(value: u32) -> Duration {
    Duration::from_secs(u64::from(value).saturating_mul(60))
}

/// Read-only copy of the timer state published to observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerSnapshot {
    pub phase: Phase,
    pub remaining_secs: u64,
    /// Full length of the phase being counted (or resumed into).
    pub total_secs: u64,
    pub round: u32,
    pub paused: bool,
}

impl TimerSnapshot {
    /// `MM:SS` rendering of the remaining time.
    pub fn clock(&self) -> String {
        format!("{:02}:{:02}", self.remaining_secs / 60, self.remaining_secs % 60)
    }
}
