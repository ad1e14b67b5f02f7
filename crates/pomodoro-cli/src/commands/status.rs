use pomodoro_core::{FileSettingsStore, SettingsStore, TimerEngine};

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let store = FileSettingsStore::open_default()?;
    let engine = TimerEngine::new(store.timer_config());
    let status = serde_json::json!({
        "config_path": store.path(),
        "settings": store.schedule(),
        "timer": engine.snapshot(),
    });
    println!("{}", serde_json::to_string_pretty(&status)?);
    Ok(())
}
