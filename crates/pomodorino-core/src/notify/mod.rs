//! Notification fan-out.
//!
//! One completed interval becomes up to four independent side effects:
//! a sound cue, a desktop notification, a Telegram message and a webhook
//! POST. Each channel runs on its own spawned task with its own error
//! handling -- a hanging webhook cannot delay the chime, and no channel
//! error ever reaches the timer.
//!
//! Channel outcomes the user should see go through [`ToastSink`]. On the
//! completion path only remote failures are surfaced; the `test_*` entry
//! points report success and failure alike.

pub mod desktop;
pub mod sound;
pub mod telegram;
pub mod webhook;

use chrono::Utc;
use tokio::sync::mpsc;
use tracing::warn;

use crate::settings::{NotificationSettings, TelegramSettings, WebhookSettings};
use crate::timer::Mode;
use sound::SoundPlayer;

/// User-visible channel outcome message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub title: String,
    pub message: String,
    pub kind: ToastKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
}

/// Handle the host hands to the dispatcher for surfacing toasts.
#[derive(Clone)]
pub struct ToastSink {
    tx: mpsc::UnboundedSender<Toast>,
}

impl ToastSink {
    /// Create a sink and the receiver the host drains.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Toast>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn success(&self, title: impl Into<String>, message: impl Into<String>) {
        self.push(Toast {
            title: title.into(),
            message: message.into(),
            kind: ToastKind::Success,
        });
    }

    pub fn error(&self, title: impl Into<String>, message: impl Into<String>) {
        self.push(Toast {
            title: title.into(),
            message: message.into(),
            kind: ToastKind::Error,
        });
    }

    fn push(&self, toast: Toast) {
        // A host that stopped draining toasts just misses them.
        let _ = self.tx.send(toast);
    }
}

/// Notification dispatcher.
///
/// Cheap to clone; the HTTP client, the audio player and the toast sink
/// are shared handles.
#[derive(Clone)]
pub struct Dispatcher {
    client: reqwest::Client,
    telegram_base: String,
    sound: SoundPlayer,
    toasts: ToastSink,
}

impl Dispatcher {
    pub fn new(toasts: ToastSink) -> Self {
        Self::with_telegram_base(toasts, telegram::DEFAULT_API_BASE)
    }

    /// Override the Telegram API base URL (tests point this at a mock
    /// server).
    pub fn with_telegram_base(toasts: ToastSink, telegram_base: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            telegram_base: telegram_base.into(),
            sound: SoundPlayer::new(),
            toasts,
        }
    }

    /// Fan a completion out to every enabled channel.
    ///
    /// Spawns one task per channel and returns without awaiting any of
    /// them; callers must not assume a channel has finished by the time
    /// this returns. Settings are read fresh per call -- a changed
    /// credential takes effect on the next completion.
    ///
    /// Must be called from within a tokio runtime.
    pub fn notify_complete(
        &self,
        mode: Mode,
        notifications: &NotificationSettings,
        telegram: &TelegramSettings,
        webhook: &WebhookSettings,
    ) {
        if notifications.sound {
            let sound = self.sound.clone();
            tokio::spawn(async move {
                if let Err(e) = sound.play().await {
                    warn!("failed to play completion sound: {e}");
                }
            });
        }

        if notifications.desktop {
            tokio::spawn(async move {
                let shown =
                    tokio::task::spawn_blocking(move || desktop::show_completion(mode)).await;
                match shown {
                    Ok(Err(e)) => warn!("failed to show desktop notification: {e}"),
                    Err(e) => warn!("desktop notification task failed: {e}"),
                    Ok(Ok(())) => {}
                }
            });
        }

        if telegram.enabled && !telegram.token.is_empty() && !telegram.chat_id.is_empty() {
            let client = self.client.clone();
            let base = self.telegram_base.clone();
            let toasts = self.toasts.clone();
            let token = telegram.token.clone();
            let chat_id = telegram.chat_id.clone();
            tokio::spawn(async move {
                let text = format!("\u{1F345} Pomodoro: \"{}\" session complete!", mode.label());
                if let Err(e) = telegram::send_message(&client, &base, &token, &chat_id, &text).await
                {
                    warn!("failed to send Telegram message: {e}");
                    toasts.error(
                        "Telegram error",
                        "Failed to send message. Check your bot token and chat ID.",
                    );
                }
            });
        }

        if webhook.enabled && !webhook.url.is_empty() {
            let client = self.client.clone();
            let toasts = self.toasts.clone();
            let url = webhook.url.clone();
            let body = webhook::render_payload(&webhook.payload, Utc::now(), mode.as_str());
            tokio::spawn(async move {
                if let Err(e) = webhook::post(&client, &url, body).await {
                    warn!("failed to send webhook: {e}");
                    toasts.error("Webhook error", webhook::failure_message(&e));
                }
            });
        }
    }

    // ── Test entry points ────────────────────────────────────────────
    //
    // Each runs its channel regardless of the stored enable flags and
    // reports exactly one success-or-failure toast.

    /// Play the completion chime and toast the outcome.
    pub async fn test_sound(&self) -> bool {
        match self.sound.play().await {
            Ok(()) => {
                self.toasts.success("Success!", "Sound played.");
                true
            }
            Err(e) => {
                self.toasts.error("Sound test failed", e.to_string());
                false
            }
        }
    }

    /// Show a desktop notification with a fixed test body and toast the
    /// outcome.
    pub async fn test_desktop(&self) -> bool {
        let shown = tokio::task::spawn_blocking(desktop::show_test).await;
        match shown {
            Ok(Ok(())) => {
                self.toasts.success("Success!", "Desktop notification shown.");
                true
            }
            Ok(Err(e)) => {
                self.toasts
                    .error("Desktop notification test failed", e.to_string());
                false
            }
            Err(e) => {
                self.toasts
                    .error("Desktop notification test failed", e.to_string());
                false
            }
        }
    }

    /// Send a fixed test message with explicit credentials, independent of
    /// stored settings, and toast the outcome.
    pub async fn test_telegram(&self, token: &str, chat_id: &str) -> bool {
        let text = "\u{1F345} Pomodoro Timer: test message!";
        match telegram::send_message(&self.client, &self.telegram_base, token, chat_id, text).await
        {
            Ok(()) => {
                self.toasts
                    .success("Success!", "Test message sent to Telegram.");
                true
            }
            Err(e) => {
                self.toasts.error(
                    "Telegram test failed",
                    format!("{e}. Check your bot token and chat ID."),
                );
                false
            }
        }
    }

    /// POST the given template (with `{{mode}}` = "test") to the given
    /// URL, independent of stored settings, and toast the outcome.
    pub async fn test_webhook(&self, url: &str, payload: &str) -> bool {
        let body = webhook::render_payload(payload, Utc::now(), "test");
        match webhook::post(&self.client, url, body).await {
            Ok(()) => {
                self.toasts.success("Success!", "Webhook test succeeded.");
                true
            }
            Err(e) => {
                self.toasts
                    .error("Webhook test failed", webhook::failure_message(&e));
                false
            }
        }
    }
}
