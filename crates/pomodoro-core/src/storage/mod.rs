mod config;
mod form;
mod settings;

pub use config::{Config, NotificationsConfig, ScheduleConfig};
pub use form::{parse_setting_input, SettingsForm};
pub use settings::{FileSettingsStore, MemorySettingsStore, SettingKey, SettingsStore};

use std::path::PathBuf;

use crate::error::Result;

/// Returns the directory holding `config.toml`.
///
/// `POMODORO_HOME` wins when set. Otherwise `~/.config/pomodoro[-dev]/`,
/// where POMODORO_ENV=dev selects the development directory.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf> {
    let dir = match std::env::var_os("POMODORO_HOME") {
        Some(home) => PathBuf::from(home),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");

            let env = std::env::var("POMODORO_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("pomodoro-dev")
            } else {
                base_dir.join("pomodoro")
            }
        }
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
