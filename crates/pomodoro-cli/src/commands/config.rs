use clap::Subcommand;
use pomodoro_core::{parse_setting_input, Config, FileSettingsStore, SettingKey, SettingsStore};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Get a config value
    Get {
        /// Config key (e.g. "schedule.work_time_minutes", "notifications.enabled")
        key: String,
    },
    /// Set a config value
    Set {
        /// Config key; the schedule keys may omit the "schedule." prefix
        key: String,
        /// New value
        value: String,
    },
    /// List all config values
    List,
    /// Reset config to defaults
    Reset,
    /// Print the config file location
    Path,
}

pub async fn run(action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ConfigAction::Get { key } => {
            let config = Config::load()?;
            let dotted = match key.parse::<SettingKey>() {
                Ok(setting) => format!("schedule.{}", setting.name()),
                Err(_) => key.clone(),
            };
            match config.get(&dotted) {
                Some(value) => println!("{value}"),
                None => return Err(format!("unknown key: {key}").into()),
            }
        }
        ConfigAction::Set { key, value } => {
            if let Ok(setting) = key.parse::<SettingKey>() {
                let minutes = parse_setting_input(&value)?;
                let store = FileSettingsStore::open_default()?;
                store.set(setting, minutes).await?;
            } else {
                let mut config = Config::load()?;
                config.set(&key, &value)?;
                config.save()?;
            }
            println!("ok");
        }
        ConfigAction::List => {
            let config = Config::load()?;
            let json = serde_json::to_string_pretty(&config)?;
            println!("{json}");
        }
        ConfigAction::Reset => {
            let config = Config::default();
            config.save()?;
            println!("config reset to defaults");
        }
        ConfigAction::Path => {
            println!("{}", Config::path()?.display());
        }
    }
    Ok(())
}
