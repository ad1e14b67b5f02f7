//! # Pomodoro Core Library
//!
//! Business logic for the Pomodoro timer. The CLI binary is a thin
//! presentation layer over this crate.
//!
//! ## Architecture
//!
//! - **Timer Engine**: a pure phase state machine advanced one second at a
//!   time by `tick()`
//! - **Session**: owns the single cancellable countdown task that drives the
//!   engine and publishes snapshots and events
//! - **Storage**: TOML configuration and the observable settings store
//! - **Notifications**: phase-boundary notices posted to a pluggable sink
//!
//! ## Key Components
//!
//! - [`TimerEngine`]: Core timer state machine
//! - [`PomodoroSession`]: Countdown task and observers
//! - [`SettingsStore`]: Durable, observable tunables
//! - [`NotificationSink`]: Where phase notices go

pub mod error;
pub mod events;
pub mod notify;
pub mod storage;
pub mod timer;

pub use error::{ConfigError, CoreError, ValidationError};
pub use events::Event;
pub use notify::{
    spawn_notifier, DesktopNotifier, NoopNotifier, NotificationChannel, NotificationSink,
    PhaseNotice,
};
pub use storage::{
    parse_setting_input, Config, FileSettingsStore, MemorySettingsStore, SettingKey,
    SettingsForm, SettingsStore,
};
pub use timer::{Phase, PomodoroSession, TimerConfig, TimerEngine, TimerSnapshot};
