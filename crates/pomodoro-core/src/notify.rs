//! Phase-boundary notifications.
//!
//! The session never talks to a sink directly: a notifier task subscribes
//! to the event stream and posts one notice per `PhaseEnded`, so a slow or
//! failing sink cannot stall the countdown.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::events::Event;
use crate::timer::Phase;

/// Title and body shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseNotice {
    pub title: String,
    pub message: String,
}

impl PhaseNotice {
    /// Notice for the move from `from` into `to`, where `to` lasts `next`.
    ///
    /// `None` when `from` is not a running phase; no countdown ends there.
    pub fn for_transition(from: Phase, to: Phase, next: Duration) -> Option<Self> {
        let minutes = next.as_secs().div_ceil(60);
        let (title, message) = match (from, to) {
            (Phase::Working, Phase::LongBreak) => (
                "Long break time!".to_string(),
                format!("Great work. Enjoy a {minutes}-minute long break."),
            ),
            (Phase::Working, _) => (
                "Break time!".to_string(),
                format!("Take a short break. Your {minutes}-minute break starts now."),
            ),
            (Phase::LongBreak, _) => (
                "Back to work!".to_string(),
                "Long break is over. Start a new Pomodoro round!".to_string(),
            ),
            (Phase::ShortBreak, _) => (
                "Back to work!".to_string(),
                "Break is over. Start a new Pomodoro round!".to_string(),
            ),
            (Phase::Paused | Phase::Stopped, _) => return None,
        };
        Some(Self { title, message })
    }

    /// Notice for a `PhaseEnded` event; `None` for every other event.
    pub fn from_event(event: &Event) -> Option<Self> {
        match event {
            Event::PhaseEnded {
                from, to, next_secs, ..
            } => Self::for_transition(*from, *to, Duration::from_secs(*next_secs)),
            _ => None,
        }
    }
}

/// Something that can show a notice to the user.
///
/// Posting is best effort: implementations log their failures and never
/// report them back.
pub trait NotificationSink: Send + Sync + 'static {
    /// Whether the user allowed notifications. Checked before every post.
    fn is_permitted(&self) -> bool {
        true
    }

    fn post(&self, notice: &PhaseNotice);
}

/// Discards every notice.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNotifier;

impl NotificationSink for NoopNotifier {
    fn is_permitted(&self) -> bool {
        false
    }

    fn post(&self, _notice: &PhaseNotice) {}
}

/// Channel the desktop notifications are posted on. Created once at start-up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationChannel {
    pub id: String,
    pub name: String,
    pub description: String,
    /// Posted as critical urgency, which keeps the notice on screen.
    pub high_importance: bool,
    /// Desktops have no vibration motor; this toggles the alert sound.
    pub vibration: bool,
}

impl Default for NotificationChannel {
    fn default() -> Self {
        Self {
            id: "pomodoro_notification_channel".into(),
            name: "Pomodoro Notifications".into(),
            description: "Pomodoro timer notifications".into(),
            high_importance: true,
            vibration: true,
        }
    }
}

/// Posts through the desktop notification service.
#[derive(Debug, Clone)]
pub struct DesktopNotifier {
    channel: NotificationChannel,
    enabled: bool,
}

impl DesktopNotifier {
    /// `enabled` is the user's notification permission.
    pub fn new(channel: NotificationChannel, enabled: bool) -> Self {
        tracing::debug!(channel = %channel.id, enabled, "notification channel created");
        Self { channel, enabled }
    }

    fn build(&self, notice: &PhaseNotice) -> notify_rust::Notification {
        let mut notification = notify_rust::Notification::new();
        notification
            .summary(&notice.title)
            .body(&notice.message)
            .appname(&self.channel.name)
            .auto_icon();
        #[cfg(all(unix, not(target_os = "macos")))]
        {
            use notify_rust::{Hint, Urgency};

            notification.urgency(if self.channel.high_importance {
                Urgency::Critical
            } else {
                Urgency::Normal
            });
            notification.hint(Hint::Category("x-pomodoro.phase".into()));
            if self.channel.vibration {
                notification.sound_name("message-new-instant");
            } else {
                notification.hint(Hint::SuppressSound(true));
            }
        }
        #[cfg(any(target_os = "macos", target_os = "windows"))]
        {
            if self.channel.vibration {
                notification.sound_name("Default");
            }
        }
        notification
    }
}

impl NotificationSink for DesktopNotifier {
    fn is_permitted(&self) -> bool {
        self.enabled
    }

    fn post(&self, notice: &PhaseNotice) {
        if let Err(e) = self.build(notice).show() {
            tracing::warn!(error = %e, title = %notice.title, "failed to post notification");
        }
    }
}

/// Forward every `PhaseEnded` on `events` to `sink` until the stream closes.
///
/// Posting runs on the blocking pool. Notices are dropped silently when the
/// sink is not permitted.
pub fn spawn_notifier<N: NotificationSink>(
    sink: Arc<N>,
    mut events: broadcast::Receiver<Event>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let event = match events.recv().await {
                Ok(event) => event,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "notifier lagged behind timer events");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => break,
            };
            let Some(notice) = PhaseNotice::from_event(&event) else {
                continue;
            };
            if !sink.is_permitted() {
                tracing::debug!(title = %notice.title, "notifications not permitted, skipping");
                continue;
            }
            let sink = Arc::clone(&sink);
            let posted = tokio::task::spawn_blocking(move || sink.post(&notice));
            // Detached: a hung notification daemon must not hold up the next event.
            drop(posted);
        }
    })
}
