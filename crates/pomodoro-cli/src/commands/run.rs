//! Foreground timer: the home screen of the CLI.
//!
//! Reads one command per line from stdin and prints the timer on every
//! change. Settings edited here write through to the config file and reach
//! the running session on the next phase.

use std::io::Write;
use std::sync::Arc;

use clap::Args;
use pomodoro_core::{
    spawn_notifier, DesktopNotifier, Event, FileSettingsStore, NoopNotifier, NotificationChannel,
    PomodoroSession, SettingKey, SettingsForm, TimerSnapshot,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

#[derive(Args)]
pub struct RunArgs {
    /// Begin counting down immediately
    #[arg(long)]
    pub start: bool,
    /// Do not post desktop notifications
    #[arg(long)]
    pub no_notify: bool,
    /// Print every event as a JSON line instead of the clock
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, PartialEq, Eq)]
pub enum Command {
    Start,
    Pause,
    Stop,
    Status,
    Set { key: SettingKey, value: String },
    Help,
    Quit,
}

impl Command {
    pub fn parse(line: &str) -> Result<Option<Self>, String> {
        let mut words = line.split_whitespace();
        let Some(verb) = words.next() else {
            return Ok(None);
        };
        let command = match verb.to_ascii_lowercase().as_str() {
            "start" | "s" | "resume" => Command::Start,
            "pause" | "p" => Command::Pause,
            "stop" | "x" => Command::Stop,
            "status" | "?" => Command::Status,
            "help" | "h" => Command::Help,
            "quit" | "q" | "exit" => Command::Quit,
            "set" => {
                let key = words.next().ok_or("usage: set <key> <value>")?;
                let key = key.parse::<SettingKey>().map_err(|e| e.to_string())?;
                let value = words.collect::<Vec<_>>().join(" ");
                Command::Set { key, value }
            }
            other => return Err(format!("unknown command: {other} (try 'help')")),
        };
        Ok(Some(command))
    }
}

const HELP: &str = "commands: start | pause | stop | status | set <key> <value> | quit
keys: work_time_minutes short_break_time_minutes long_break_time_minutes long_break_interval";

pub fn status_line(snapshot: &TimerSnapshot) -> String {
    format!(
        "{:<11} {} | round {}",
        snapshot.phase.label(),
        snapshot.clock(),
        snapshot.round
    )
}

/// Human rendering of an event; `None` for events that only move the clock.
pub fn describe(event: &Event) -> Option<String> {
    match event {
        Event::TimerStarted { phase, .. } => Some(format!("started: {phase}")),
        Event::TimerResumed { phase, .. } => Some(format!("resumed: {phase}")),
        Event::TimerPaused { .. } => Some("paused".to_string()),
        Event::TimerStopped { .. } => Some("stopped".to_string()),
        Event::PhaseEnded { from, to, round, .. } => {
            Some(format!("{from} finished -> {to} (round {round})"))
        }
        Event::SettingsApplied { .. } => Some("settings updated".to_string()),
        Event::Tick { .. } => None,
    }
}

fn spawn_renderer(
    session: &PomodoroSession,
    mut events: broadcast::Receiver<Event>,
    json: bool,
) -> JoinHandle<()> {
    let state = session.subscribe_state();
    tokio::spawn(async move {
        loop {
            let event = match events.recv().await {
                Ok(event) => event,
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => break,
            };
            if json {
                match serde_json::to_string(&event) {
                    Ok(line) => println!("{line}"),
                    Err(e) => tracing::warn!(error = %e, "failed to encode event"),
                }
                continue;
            }
            let snapshot = *state.borrow();
            let mut out = std::io::stdout().lock();
            let written = match describe(&event) {
                Some(message) => writeln!(out, "\r{message}\n{}", status_line(&snapshot)),
                None => write!(out, "\r{}", status_line(&snapshot)),
            };
            if written.and_then(|()| out.flush()).is_err() {
                break;
            }
        }
    })
}

pub async fn run(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let store = Arc::new(FileSettingsStore::open_default()?);
    let config = store.config().await;
    let mut session = PomodoroSession::with_settings(store.as_ref());
    let mut form = SettingsForm::new(Arc::clone(&store));

    let notifier = if args.no_notify {
        spawn_notifier(Arc::new(NoopNotifier), session.subscribe_events())
    } else {
        let channel = NotificationChannel {
            vibration: config.notifications.vibration,
            ..NotificationChannel::default()
        };
        let sink = DesktopNotifier::new(channel, config.notifications.enabled);
        spawn_notifier(Arc::new(sink), session.subscribe_events())
    };
    let renderer = spawn_renderer(&session, session.subscribe_events(), args.json);

    if !args.json {
        println!("{HELP}");
        println!("{}", status_line(&session.snapshot()));
    }
    if args.start {
        session.start().await;
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(line) = line else {
            break;
        };

        let command = match Command::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(message) => {
                eprintln!("{message}");
                continue;
            }
        };

        match command {
            Command::Start => session.start().await,
            Command::Pause => session.pause().await,
            Command::Stop => session.stop().await,
            Command::Status => {
                if args.json {
                    println!("{}", serde_json::to_string(&session.snapshot())?);
                } else {
                    println!("\r{}", status_line(&session.snapshot()));
                }
            }
            Command::Set { key, value } => match form.input(key, &value).await {
                Ok(saved) => println!("{key} = {saved}"),
                // Rejected input keeps the previous value.
                Err(e) => eprintln!("ignored: {e} (keeping {})", form.value(key)),
            },
            Command::Help => println!("{HELP}"),
            Command::Quit => break,
        }
    }

    let last = session.snapshot();
    session.shutdown().await;
    // Both tasks end once the session's event stream closes.
    let _ = renderer.await;
    let _ = notifier.await;
    if !args.json {
        println!("\r{}", status_line(&last));
    }
    Ok(())
}
