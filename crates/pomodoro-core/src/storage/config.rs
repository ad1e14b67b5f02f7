//! TOML-based application configuration.
//!
//! Stores user preferences:
//! - Interval lengths (work, short break, long break) in minutes
//! - Long-break interval in completed rounds
//! - Notification preferences
//!
//! Configuration is stored at `~/.config/pomodoro/config.toml`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::data_dir;
use super::form::parse_setting_input;
use crate::error::{ConfigError, Result};

/// Schedule tunables. Every value is a positive integer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleConfig {
    #[serde(default = "default_work_time")]
    pub work_time_minutes: u32,
    #[serde(default = "default_short_break")]
    pub short_break_time_minutes: u32,
    #[serde(default = "default_long_break")]
    pub long_break_time_minutes: u32,
    #[serde(default = "default_long_break_interval")]
    pub long_break_interval: u32,
}

/// Notification configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationsConfig {
    /// Acts as the notification permission: when false nothing is posted.
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_true")]
    pub vibration: bool,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/pomodoro/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub notifications: NotificationsConfig,
}

// Default functions
pub(crate) fn default_work_time() -> u32 {
    25
}
pub(crate) fn default_short_break() -> u32 {
    5
}
pub(crate) fn default_long_break() -> u32 {
    15
}
pub(crate) fn default_long_break_interval() -> u32 {
    4
}
fn default_true() -> bool {
    true
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            work_time_minutes: default_work_time(),
            short_break_time_minutes: default_short_break(),
            long_break_time_minutes: default_long_break(),
            long_break_interval: default_long_break_interval(),
        }
    }
}

impl ScheduleConfig {
    /// Replace every zero with its default, logging each replacement.
    ///
    /// The file is user-editable, so a zero can arrive without passing the
    /// `set` validation. Returns whether anything was replaced.
    pub fn sanitize(&mut self) -> bool {
        let defaults = Self::default();
        let mut replaced = false;
        for (key, slot, default) in [
            (
                "work_time_minutes",
                &mut self.work_time_minutes,
                defaults.work_time_minutes,
            ),
            (
                "short_break_time_minutes",
                &mut self.short_break_time_minutes,
                defaults.short_break_time_minutes,
            ),
            (
                "long_break_time_minutes",
                &mut self.long_break_time_minutes,
                defaults.long_break_time_minutes,
            ),
            (
                "long_break_interval",
                &mut self.long_break_interval,
                defaults.long_break_interval,
            ),
        ] {
            if *slot == 0 {
                tracing::warn!(key, default, "non-positive setting in config file, using default");
                *slot = default;
                replaced = true;
            }
        }
        replaced
    }
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            vibration: true,
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(root: &mut serde_json::Value, key: &str, value: &str) -> Result<()> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if parts.peek().is_none() {
            return Err(unknown().into());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value
                            .trim()
                            .parse::<bool>()
                            .map_err(|e| invalid(e.to_string()))?,
                    ),
                    // Every numeric setting is a positive integer.
                    serde_json::Value::Number(_) => {
                        let n = parse_setting_input(value).map_err(|e| invalid(e.to_string()))?;
                        serde_json::Value::Number(n.into())
                    }
                    _ => return Err(unknown().into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown().into())
    }

    /// Default location of the config file.
    pub fn path() -> Result<PathBuf> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Read the file at `path`. A missing file yields the defaults;
    /// keys absent from the file, or set to zero, fall back to their
    /// defaults too.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let mut config: Self = toml::from_str(&content).map_err(ConfigError::from)?;
                config.schedule.sanitize();
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }
            .into()),
        }
    }

    /// Load from the default location.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::path()?)
    }

    /// Serialize to the TOML text written on save.
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Persist to `path`, creating its directory if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let content = self.to_toml()?;
        let save_failed = |e: std::io::Error| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(save_failed)?;
        }
        std::fs::write(path, content).map_err(save_failed)?;
        Ok(())
    }

    /// Persist to the default location.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::path()?)
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Object(_) => None,
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by dot-separated key. Does not save.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value is not valid for
    /// it. The config is left untouched on error.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let mut json = serde_json::to_value(&*self)?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        *self = serde_json::from_value(json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = cfg.to_toml().unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, cfg);
    }

    #[test]
    fn config_default_values() {
        let cfg = Config::default();
        assert_eq!(cfg.schedule.work_time_minutes, 25);
        assert_eq!(cfg.schedule.short_break_time_minutes, 5);
        assert_eq!(cfg.schedule.long_break_time_minutes, 15);
        assert_eq!(cfg.schedule.long_break_interval, 4);
        assert!(cfg.notifications.enabled);
        assert!(cfg.notifications.vibration);
    }

    #[test]
    fn missing_keys_fall_back_to_defaults() {
        let parsed: Config = toml::from_str("[schedule]\nwork_time_minutes = 50\n").unwrap();
        assert_eq!(parsed.schedule.work_time_minutes, 50);
        assert_eq!(parsed.schedule.short_break_time_minutes, 5);
        assert_eq!(parsed.schedule.long_break_interval, 4);
        assert!(parsed.notifications.enabled);
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("schedule.work_time_minutes").as_deref(), Some("25"));
        assert_eq!(cfg.get("notifications.enabled").as_deref(), Some("true"));
        assert!(cfg.get("schedule.missing_key").is_none());
        assert!(cfg.get("schedule").is_none());
    }

    #[test]
    fn set_updates_nested_number() {
        let mut cfg = Config::default();
        cfg.set("schedule.long_break_interval", "3").unwrap();
        assert_eq!(cfg.schedule.long_break_interval, 3);
    }

    #[test]
    fn set_updates_nested_bool() {
        let mut cfg = Config::default();
        cfg.set("notifications.enabled", "false").unwrap();
        assert!(!cfg.notifications.enabled);
    }

    #[test]
    fn set_rejects_non_positive_and_keeps_prior_value() {
        let mut cfg = Config::default();
        assert!(cfg.set("schedule.work_time_minutes", "0").is_err());
        assert!(cfg.set("schedule.work_time_minutes", "-5").is_err());
        assert!(cfg.set("schedule.work_time_minutes", "abc").is_err());
        assert_eq!(cfg.schedule.work_time_minutes, 25);
    }

    #[test]
    fn set_rejects_unknown_key() {
        let mut cfg = Config::default();
        let result = cfg.set("schedule.nonexistent_key", "1");
        assert!(matches!(
            result,
            Err(crate::error::CoreError::Config(ConfigError::UnknownKey(_)))
        ));
    }

    #[test]
    fn load_from_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config::load_from(&dir.path().join("config.toml")).unwrap();
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn save_then_load_preserves_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut cfg = Config::default();
        cfg.schedule.short_break_time_minutes = 7;
        cfg.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap(), cfg);
    }

    #[test]
    fn load_from_replaces_zero_values_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[schedule]\n\
             work_time_minutes = 0\n\
             short_break_time_minutes = 7\n\
             long_break_interval = 0\n",
        )
        .unwrap();

        let cfg = Config::load_from(&path).unwrap();
        assert_eq!(cfg.schedule.work_time_minutes, 25);
        assert_eq!(cfg.schedule.short_break_time_minutes, 7);
        assert_eq!(cfg.schedule.long_break_interval, 4);
    }

    #[test]
    fn sanitize_reports_whether_anything_changed() {
        let mut schedule = ScheduleConfig::default();
        assert!(!schedule.sanitize());
        schedule.long_break_time_minutes = 0;
        assert!(schedule.sanitize());
        assert_eq!(schedule.long_break_time_minutes, 15);
    }

    #[test]
    fn load_from_garbage_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "schedule = [").unwrap();
        assert!(matches!(
            Config::load_from(&path),
            Err(crate::error::CoreError::Config(ConfigError::ParseFailed(_)))
        ));
    }
}
