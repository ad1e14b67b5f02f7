//! Timer engine implementation.
//!
//! The engine is a pure state machine. It owns no task and no clock: the
//! countdown session calls `tick()` once per second while a phase is
//! running, and every command returns the events it produced.
//!
//! ## State Transitions
//!
//! ```text
//! Stopped -> Working -> (ShortBreak | LongBreak) -> Working -> ...
//!              any running phase <-> Paused
//!              any phase -> Stopped
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = TimerEngine::new(TimerConfig::default());
//! engine.start();
//! // Once per second:
//! let events = engine.tick(); // Contains PhaseEnded when a phase finishes
//! ```

use std::time::Duration;

use chrono::Utc;

use super::phase::{Phase, TimerConfig, TimerSnapshot};
use crate::events::Event;

/// Amount removed from the remaining time on every tick.
pub const TICK: Duration = Duration::from_secs(1);

/// Core timer engine.
#[derive(Debug, Clone)]
pub struct TimerEngine {
    config: TimerConfig,
    phase: Phase,
    /// Running phase to restore when leaving `Paused`.
    resume_phase: Option<Phase>,
    remaining: Duration,
    /// Length of the phase being counted, fixed when the phase is entered.
    phase_total: Duration,
    round: u32,
    paused: bool,
}

impl TimerEngine {
    /// Create a new engine in the `Stopped` phase with a full work interval.
    pub fn new(config: TimerConfig) -> Self {
        Self {
            config,
            phase: Phase::Stopped,
            resume_phase: None,
            remaining: config.work,
            phase_total: config.work,
            round: 1,
            paused: false,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn remaining_secs(&self) -> u64 {
        self.remaining.as_secs()
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn resume_phase(&self) -> Option<Phase> {
        self.resume_phase
    }

    pub fn config(&self) -> &TimerConfig {
        &self.config
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        TimerSnapshot {
            phase: self.phase,
            remaining_secs: self.remaining_secs(),
            total_secs: self.phase_total.as_secs(),
            round: self.round,
            paused: self.paused,
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Prepare the engine for a countdown.
    ///
    /// From `Stopped` a fresh work interval begins; from `Paused` the
    /// phase that was paused is restored with its remaining time; a
    /// running phase simply continues.
    pub fn start(&mut self) -> Event {
        self.paused = false;
        match self.phase {
            Phase::Stopped => {
                self.enter(Phase::Working, self.config.work);
                Event::TimerStarted {
                    phase: self.phase,
                    remaining_secs: self.remaining_secs(),
                    round: self.round,
                    at: Utc::now(),
                }
            }
            Phase::Paused => {
                self.phase = self.resume_phase.take().unwrap_or(Phase::Working);
                Event::TimerResumed {
                    phase: self.phase,
                    remaining_secs: self.remaining_secs(),
                    at: Utc::now(),
                }
            }
            Phase::Working | Phase::ShortBreak | Phase::LongBreak => Event::TimerStarted {
                phase: self.phase,
                remaining_secs: self.remaining_secs(),
                round: self.round,
                at: Utc::now(),
            },
        }
    }

    /// Freeze the running phase. `remaining` is kept as the resume point.
    pub fn pause(&mut self) -> Option<Event> {
        if !self.phase.is_running() {
            return None;
        }
        let phase = self.phase;
        self.resume_phase = Some(phase);
        self.phase = Phase::Paused;
        self.paused = true;
        Some(Event::TimerPaused {
            phase,
            remaining_secs: self.remaining_secs(),
            at: Utc::now(),
        })
    }

    /// Return to `Stopped` with a full work interval and round 1.
    pub fn stop(&mut self) -> Event {
        self.phase = Phase::Stopped;
        self.resume_phase = None;
        self.remaining = self.config.work;
        self.phase_total = self.config.work;
        self.round = 1;
        self.paused = false;
        Event::TimerStopped {
            remaining_secs: self.remaining_secs(),
            at: Utc::now(),
        }
    }

    /// Apply one one-second step.
    ///
    /// Does nothing unless a phase is running. When the remaining time
    /// reaches zero the end-of-phase transition runs in the same step.
    pub fn tick(&mut self) -> Vec<Event> {
        if !self.phase.is_running() || self.paused {
            return Vec::new();
        }

        let mut events = Vec::with_capacity(2);
        if !self.remaining.is_zero() {
            self.remaining = self.remaining.saturating_sub(TICK);
            events.push(Event::Tick {
                phase: self.phase,
                remaining_secs: self.remaining_secs(),
                at: Utc::now(),
            });
        }
        if self.remaining.is_zero() {
            events.push(self.end_phase());
        }
        events
    }

    /// Replace the configuration snapshot.
    ///
    /// A running or paused countdown keeps its remaining time; only the next
    /// phase entered picks up the new durations. While stopped the remaining
    /// time follows the new work duration.
    pub fn set_config(&mut self, config: TimerConfig) -> Event {
        self.config = config;
        if self.phase == Phase::Stopped {
            self.remaining = config.work;
            self.phase_total = config.work;
        }
        Event::SettingsApplied {
            work_secs: config.work.as_secs(),
            short_break_secs: config.short_break.as_secs(),
            long_break_secs: config.long_break.as_secs(),
            long_break_interval: config.long_break_interval,
            at: Utc::now(),
        }
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn end_phase(&mut self) -> Event {
        let from = self.phase;
        let to = match from {
            Phase::Working => {
                self.round = self.round.saturating_add(1);
                if is_long_break_due(self.round - 1, self.config.long_break_interval) {
                    Phase::LongBreak
                } else {
                    Phase::ShortBreak
                }
            }
            _ => Phase::Working,
        };
        self.enter(to, self.config.duration_of(to));
        tracing::info!(%from, %to, round = self.round, "phase ended");
        Event::PhaseEnded {
            from,
            to,
            round: self.round,
            next_secs: self.remaining_secs(),
            at: Utc::now(),
        }
    }

    fn enter(&mut self, phase: Phase, duration: Duration) {
        self.phase = phase;
        self.remaining = duration;
        self.phase_total = duration;
    }
}

/// Whether the break after the `completed`-th work phase is a long one.
pub fn is_long_break_due(completed: u32, interval: u32) -> bool {
    completed > 0 && completed % interval.max(1) == 0
}
