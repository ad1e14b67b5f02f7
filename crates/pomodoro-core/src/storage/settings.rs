//! Observable settings store.
//!
//! Each tunable is a `watch` cell: readers get the current value and can
//! await changes, writers persist first and publish second, so a value seen
//! by a subscriber is always durable.

use std::fmt;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tokio::sync::{watch, Mutex};

use super::config::{Config, ScheduleConfig};
use crate::error::{ConfigError, Result};
use crate::timer::TimerConfig;

/// The four persisted tunables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettingKey {
    WorkTimeMinutes,
    ShortBreakTimeMinutes,
    LongBreakTimeMinutes,
    LongBreakInterval,
}

impl SettingKey {
    pub const ALL: [SettingKey; 4] = [
        SettingKey::WorkTimeMinutes,
        SettingKey::ShortBreakTimeMinutes,
        SettingKey::LongBreakTimeMinutes,
        SettingKey::LongBreakInterval,
    ];

    /// Name of the entry in the `[schedule]` table.
    pub fn name(self) -> &'static str {
        match self {
            SettingKey::WorkTimeMinutes => "work_time_minutes",
            SettingKey::ShortBreakTimeMinutes => "short_break_time_minutes",
            SettingKey::LongBreakTimeMinutes => "long_break_time_minutes",
            SettingKey::LongBreakInterval => "long_break_interval",
        }
    }

    pub fn default_value(self) -> u32 {
        self.read(&ScheduleConfig::default())
    }

    pub(crate) fn index(self) -> usize {
        match self {
            SettingKey::WorkTimeMinutes => 0,
            SettingKey::ShortBreakTimeMinutes => 1,
            SettingKey::LongBreakTimeMinutes => 2,
            SettingKey::LongBreakInterval => 3,
        }
    }

    pub fn read(self, schedule: &ScheduleConfig) -> u32 {
        match self {
            SettingKey::WorkTimeMinutes => schedule.work_time_minutes,
            SettingKey::ShortBreakTimeMinutes => schedule.short_break_time_minutes,
            SettingKey::LongBreakTimeMinutes => schedule.long_break_time_minutes,
            SettingKey::LongBreakInterval => schedule.long_break_interval,
        }
    }

    fn write(self, schedule: &mut ScheduleConfig, value: u32) {
        let slot = match self {
            SettingKey::WorkTimeMinutes => &mut schedule.work_time_minutes,
            SettingKey::ShortBreakTimeMinutes => &mut schedule.short_break_time_minutes,
            SettingKey::LongBreakTimeMinutes => &mut schedule.long_break_time_minutes,
            SettingKey::LongBreakInterval => &mut schedule.long_break_interval,
        };
        *slot = value;
    }
}

impl fmt::Display for SettingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SettingKey {
    type Err = ConfigError;

    /// Accepts the bare name or the dotted `schedule.<name>` form.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.strip_prefix("schedule.").unwrap_or(s);
        SettingKey::ALL
            .into_iter()
            .find(|key| key.name() == name)
            .ok_or_else(|| ConfigError::UnknownKey(s.to_string()))
    }
}

/// Durable, observable key → positive integer mapping.
pub trait SettingsStore: Send + Sync + 'static {
    /// Subscribe to a tunable. The receiver starts at the current value.
    fn watch(&self, key: SettingKey) -> watch::Receiver<u32>;

    /// Persist `value` for `key` and publish it to subscribers.
    ///
    /// Zero is rejected with [`ConfigError::InvalidValue`]; the stored value
    /// is unchanged on any error.
    fn set(&self, key: SettingKey, value: u32) -> impl Future<Output = Result<()>> + Send;

    fn get(&self, key: SettingKey) -> u32 {
        *self.watch(key).borrow()
    }

    /// Current values as a timer configuration snapshot.
    fn timer_config(&self) -> TimerConfig {
        TimerConfig::from(&self.schedule())
    }

    fn schedule(&self) -> ScheduleConfig {
        let mut schedule = ScheduleConfig::default();
        for key in SettingKey::ALL {
            key.write(&mut schedule, self.get(key));
        }
        schedule
    }
}

fn validate(key: SettingKey, value: u32) -> Result<()> {
    if value == 0 {
        return Err(ConfigError::InvalidValue {
            key: key.name().to_string(),
            message: "must be a positive number".into(),
        }
        .into());
    }
    Ok(())
}

/// One `watch` sender per key.
#[derive(Debug)]
struct Cells {
    senders: [watch::Sender<u32>; 4],
}

impl Cells {
    fn new(schedule: &ScheduleConfig) -> Self {
        Self {
            senders: SettingKey::ALL.map(|key| watch::Sender::new(key.read(schedule))),
        }
    }

    fn subscribe(&self, key: SettingKey) -> watch::Receiver<u32> {
        self.senders[key.index()].subscribe()
    }

    fn publish(&self, key: SettingKey, value: u32) {
        // send_replace updates the cell even when nobody is subscribed yet.
        self.senders[key.index()].send_replace(value);
    }
}

/// Settings kept in memory only.
#[derive(Debug)]
pub struct MemorySettingsStore {
    cells: Cells,
}

impl MemorySettingsStore {
    /// Zero values in `schedule` are replaced with their defaults.
    pub fn new(mut schedule: ScheduleConfig) -> Self {
        schedule.sanitize();
        Self {
            cells: Cells::new(&schedule),
        }
    }
}

impl Default for MemorySettingsStore {
    fn default() -> Self {
        Self::new(ScheduleConfig::default())
    }
}

impl SettingsStore for MemorySettingsStore {
    fn watch(&self, key: SettingKey) -> watch::Receiver<u32> {
        self.cells.subscribe(key)
    }

    async fn set(&self, key: SettingKey, value: u32) -> Result<()> {
        validate(key, value)?;
        self.cells.publish(key, value);
        Ok(())
    }
}

/// Settings persisted to a TOML config file.
///
/// Every `set` rewrites the whole file before publishing, so values survive
/// process restarts. Sections other than `[schedule]` are preserved.
#[derive(Debug)]
pub struct FileSettingsStore {
    path: PathBuf,
    config: Mutex<Config>,
    cells: Cells,
}

impl FileSettingsStore {
    /// Open the store at `path`. A missing file means all defaults; it is
    /// created on the first write. Zero values in the file are published as
    /// their defaults.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let config = Config::load_from(&path)?;
        tracing::debug!(path = %path.display(), "opened settings store");
        Ok(Self {
            cells: Cells::new(&config.schedule),
            config: Mutex::new(config),
            path,
        })
    }

    /// Open the store at the default config location.
    pub fn open_default() -> Result<Self> {
        Self::open(Config::path()?)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Copy of the full configuration as last persisted.
    pub async fn config(&self) -> Config {
        self.config.lock().await.clone()
    }
}

impl SettingsStore for FileSettingsStore {
    fn watch(&self, key: SettingKey) -> watch::Receiver<u32> {
        self.cells.subscribe(key)
    }

    async fn set(&self, key: SettingKey, value: u32) -> Result<()> {
        validate(key, value)?;

        // Held across the write so concurrent sets land in order.
        let mut config = self.config.lock().await;
        let mut updated = config.clone();
        key.write(&mut updated.schedule, value);

        let content = updated.to_toml()?;
        let save_failed = |e: std::io::Error| ConfigError::SaveFailed {
            path: self.path.clone(),
            message: e.to_string(),
        };
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(save_failed)?;
        }
        tokio::fs::write(&self.path, content)
            .await
            .map_err(save_failed)?;

        *config = updated;
        self.cells.publish(key, value);
        tracing::info!(key = key.name(), value, "setting saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_parses_bare_and_dotted_names() {
        assert_eq!("work_time_minutes".parse::<SettingKey>().unwrap(), SettingKey::WorkTimeMinutes);
        assert_eq!(
            "schedule.long_break_interval".parse::<SettingKey>().unwrap(),
            SettingKey::LongBreakInterval
        );
        assert!("volume".parse::<SettingKey>().is_err());
    }

    #[test]
    fn key_defaults_match_documented_values() {
        let defaults: Vec<u32> = SettingKey::ALL.iter().map(|k| k.default_value()).collect();
        assert_eq!(defaults, vec![25, 5, 15, 4]);
    }

    #[tokio::test]
    async fn memory_store_publishes_to_watchers() {
        let store = MemorySettingsStore::default();
        let mut rx = store.watch(SettingKey::ShortBreakTimeMinutes);
        assert_eq!(*rx.borrow(), 5);

        store.set(SettingKey::ShortBreakTimeMinutes, 8).await.unwrap();
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), 8);
        assert_eq!(store.get(SettingKey::ShortBreakTimeMinutes), 8);
    }

    #[tokio::test]
    async fn set_without_subscribers_still_updates() {
        let store = MemorySettingsStore::default();
        store.set(SettingKey::LongBreakInterval, 2).await.unwrap();
        assert_eq!(store.get(SettingKey::LongBreakInterval), 2);
        assert_eq!(store.timer_config().long_break_interval, 2);
    }

    #[tokio::test]
    async fn zero_is_rejected_and_prior_value_kept() {
        let store = MemorySettingsStore::default();
        let err = store.set(SettingKey::WorkTimeMinutes, 0).await.unwrap_err();
        assert!(matches!(
            err,
            crate::error::CoreError::Config(ConfigError::InvalidValue { .. })
        ));
        assert_eq!(store.get(SettingKey::WorkTimeMinutes), 25);
    }

    #[tokio::test]
    async fn file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let store = FileSettingsStore::open(&path).unwrap();
        assert_eq!(store.get(SettingKey::WorkTimeMinutes), 25);
        store.set(SettingKey::WorkTimeMinutes, 40).await.unwrap();
        store.set(SettingKey::LongBreakInterval, 3).await.unwrap();
        drop(store);

        let reopened = FileSettingsStore::open(&path).unwrap();
        assert_eq!(reopened.get(SettingKey::WorkTimeMinutes), 40);
        assert_eq!(reopened.get(SettingKey::LongBreakInterval), 3);
        assert_eq!(reopened.get(SettingKey::ShortBreakTimeMinutes), 5);
    }

    #[tokio::test]
    async fn file_store_never_publishes_zero_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[schedule]\nwork_time_minutes = 0\nshort_break_time_minutes = 0\n",
        )
        .unwrap();

        let store = FileSettingsStore::open(&path).unwrap();
        assert_eq!(store.get(SettingKey::WorkTimeMinutes), 25);
        assert_eq!(store.get(SettingKey::ShortBreakTimeMinutes), 5);
        let config = store.timer_config();
        assert!(config.work.as_secs() > 0);
        assert!(config.short_break.as_secs() > 0);
    }

    #[test]
    fn memory_store_replaces_zero_values() {
        let schedule = ScheduleConfig {
            long_break_interval: 0,
            ..ScheduleConfig::default()
        };
        let store = MemorySettingsStore::new(schedule);
        assert_eq!(store.get(SettingKey::LongBreakInterval), 4);
    }

    #[tokio::test]
    async fn file_store_preserves_notification_section() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[notifications]\nenabled = false\n").unwrap();

        let store = FileSettingsStore::open(&path).unwrap();
        store.set(SettingKey::LongBreakTimeMinutes, 20).await.unwrap();

        let on_disk = Config::load_from(&path).unwrap();
        assert!(!on_disk.notifications.enabled);
        assert_eq!(on_disk.schedule.long_break_time_minutes, 20);
        assert!(!store.config().await.notifications.enabled);
    }
}
