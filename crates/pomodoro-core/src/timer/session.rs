//! Countdown session.
//!
//! Wraps a [`TimerEngine`] with the single countdown task that drives it,
//! an optional settings listener, and the publishers observers subscribe to.
//!
//! Control operations take `&mut self` and are therefore serialized. Each one
//! cancels the running countdown and waits for it to finish before touching
//! the engine, and the countdown re-checks its token under the engine lock
//! before every tick, so a cancelled task never applies another decrement
//! or transition.

use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::engine::{TimerEngine, TICK};
use super::phase::{TimerConfig, TimerSnapshot};
use crate::events::Event;
use crate::storage::{SettingKey, SettingsStore};

const EVENT_CAPACITY: usize = 256;

struct Shared {
    engine: Mutex<TimerEngine>,
    state_tx: watch::Sender<TimerSnapshot>,
    events_tx: broadcast::Sender<Event>,
}

impl Shared {
    fn read<R>(&self, f: impl FnOnce(&TimerEngine) -> R) -> R {
        let engine = self.engine.lock().unwrap_or_else(PoisonError::into_inner);
        f(&engine)
    }

    /// Mutate the engine and publish what changed.
    ///
    /// Publishing happens under the lock so every observer sees events in
    /// the order the mutations happened.
    fn update(&self, f: impl FnOnce(&mut TimerEngine) -> Vec<Event>) -> usize {
        let mut engine = self.engine.lock().unwrap_or_else(PoisonError::into_inner);
        let events = f(&mut engine);
        if events.is_empty() {
            return 0;
        }
        self.state_tx.send_replace(engine.snapshot());
        let count = events.len();
        for event in events {
            // No subscribers is fine.
            let _ = self.events_tx.send(event);
        }
        count
    }
}

/// A spawned task paired with the token that stops it.
struct Worker {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

impl Worker {
    fn is_active(&self) -> bool {
        !self.handle.is_finished()
    }

    /// Cancel and wait until the task has fully exited.
    async fn cancel(self, name: &'static str) {
        self.token.cancel();
        if let Err(e) = self.handle.await {
            if e.is_panic() {
                tracing::warn!(task = name, error = %e, "task panicked");
            }
        }
    }
}

/// A Pomodoro timer session.
///
/// Must be created and driven inside a Tokio runtime.
pub struct PomodoroSession {
    shared: Arc<Shared>,
    countdown: Option<Worker>,
    settings: Option<Worker>,
}

impl PomodoroSession {
    /// Session with a fixed configuration.
    pub fn new(config: TimerConfig) -> Self {
        let engine = TimerEngine::new(config);
        let (state_tx, _) = watch::channel(engine.snapshot());
        let (events_tx, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            shared: Arc::new(Shared {
                engine: Mutex::new(engine),
                state_tx,
                events_tx,
            }),
            countdown: None,
            settings: None,
        }
    }

    /// Session that follows `store` for as long as it lives.
    ///
    /// Every change to any of the four tunables replaces the configuration
    /// snapshot; a countdown already running keeps its remaining time.
    pub fn with_settings<S: SettingsStore>(store: &S) -> Self {
        let mut session = Self::new(store.timer_config());
        let token = CancellationToken::new();
        let handle = tokio::spawn(follow_settings(
            SettingKey::ALL.map(|key| store.watch(key)),
            Arc::clone(&session.shared),
            token.clone(),
        ));
        session.settings = Some(Worker { token, handle });
        session
    }

    // ── Observation ──────────────────────────────────────────────────

    pub fn snapshot(&self) -> TimerSnapshot {
        self.shared.read(TimerEngine::snapshot)
    }

    pub fn config(&self) -> TimerConfig {
        self.shared.read(|engine| *engine.config())
    }

    /// Latest snapshot, updated after every mutation.
    pub fn subscribe_state(&self) -> watch::Receiver<TimerSnapshot> {
        self.shared.state_tx.subscribe()
    }

    /// Every event from now on, in emission order.
    pub fn subscribe_events(&self) -> broadcast::Receiver<Event> {
        self.shared.events_tx.subscribe()
    }

    /// Whether a countdown task is alive.
    pub fn is_counting(&self) -> bool {
        self.countdown.as_ref().is_some_and(Worker::is_active)
    }

    // ── Control ──────────────────────────────────────────────────────

    /// Start or resume counting down.
    ///
    /// No-op while a countdown is already running.
    pub async fn start(&mut self) {
        if self.is_counting() && !self.shared.read(TimerEngine::is_paused) {
            tracing::debug!("start ignored, countdown already running");
            return;
        }
        if let Some(previous) = self.countdown.take() {
            previous.cancel("countdown").await;
        }

        self.shared.update(|engine| vec![engine.start()]);
        let snapshot = self.snapshot();
        tracing::info!(
            phase = %snapshot.phase,
            remaining = snapshot.remaining_secs,
            round = snapshot.round,
            "timer started"
        );

        let token = CancellationToken::new();
        let handle = tokio::spawn(run_countdown(Arc::clone(&self.shared), token.clone()));
        self.countdown = Some(Worker { token, handle });
    }

    /// Pause the running countdown, keeping its remaining time.
    ///
    /// No-op when nothing is counting down.
    pub async fn pause(&mut self) {
        let Some(countdown) = self.countdown.take() else {
            tracing::debug!("pause ignored, no countdown");
            return;
        };
        let was_active = countdown.is_active();
        countdown.cancel("countdown").await;
        if !was_active {
            return;
        }

        self.shared.update(|engine| engine.pause().into_iter().collect());
        let snapshot = self.snapshot();
        tracing::info!(remaining = snapshot.remaining_secs, "timer paused");
    }

    /// Stop counting and reset to a full work interval at round 1.
    pub async fn stop(&mut self) {
        if let Some(countdown) = self.countdown.take() {
            countdown.cancel("countdown").await;
        }
        self.shared.update(|engine| vec![engine.stop()]);
        tracing::info!("timer stopped");
    }

    /// Stop all background tasks. The timer state is left as it was.
    pub async fn shutdown(mut self) {
        if let Some(countdown) = self.countdown.take() {
            countdown.cancel("countdown").await;
        }
        if let Some(settings) = self.settings.take() {
            settings.cancel("settings").await;
        }
    }
}

impl Drop for PomodoroSession {
    fn drop(&mut self) {
        for worker in [&self.countdown, &self.settings].into_iter().flatten() {
            worker.token.cancel();
        }
    }
}

async fn run_countdown(shared: Arc<Shared>, token: CancellationToken) {
    loop {
        tokio::select! {
            biased;
            _ = token.cancelled() => break,
            _ = tokio::time::sleep(TICK) => {}
        }

        let applied = shared.update(|engine| {
            if token.is_cancelled() {
                return Vec::new();
            }
            engine.tick()
        });
        if applied == 0 {
            break;
        }
        tracing::trace!("tick");
    }
    tracing::debug!("countdown exited");
}

async fn follow_settings(
    mut cells: [watch::Receiver<u32>; 4],
    shared: Arc<Shared>,
    token: CancellationToken,
) {
    loop {
        let [work, short_break, long_break, interval] = &mut cells;
        let changed = tokio::select! {
            biased;
            _ = token.cancelled() => break,
            r = work.changed() => r,
            r = short_break.changed() => r,
            r = long_break.changed() => r,
            r = interval.changed() => r,
        };
        if changed.is_err() {
            tracing::debug!("settings store dropped, no longer following");
            break;
        }

        let [work, short_break, long_break, interval] =
            cells.each_mut().map(|cell| *cell.borrow_and_update());
        let config = TimerConfig::from_minutes(work, short_break, long_break, interval);
        tracing::debug!(work, short_break, long_break, interval, "applying settings");
        shared.update(|engine| vec![engine.set_config(config)]);
    }
}
