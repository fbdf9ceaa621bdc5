//! Application settings record.
//!
//! The settings record is owned by the host application; the core reads it
//! fresh on every dispatch and writes it only to bump the completed-session
//! counter. It persists as one JSON document in a [`KvStore`] slot, with
//! serde defaults on every field so older or partial records still load.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::StorageError;
use crate::storage::KvStore;
use crate::timer::Mode;

/// Key-value slot holding the serialized settings record.
pub const SETTINGS_KEY: &str = "settings";

/// Per-mode countdown durations in whole seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerDurations {
    #[serde(default = "default_work_duration")]
    pub work_duration: u64,
    #[serde(default = "default_short_break_duration")]
    pub short_break_duration: u64,
    #[serde(default = "default_long_break_duration")]
    pub long_break_duration: u64,
}

impl TimerDurations {
    /// Configured duration for a timer mode.
    pub fn for_mode(&self, mode: Mode) -> u64 {
        match mode {
            Mode::Work => self.work_duration,
            Mode::ShortBreak => self.short_break_duration,
            Mode::LongBreak => self.long_break_duration,
        }
    }
}

impl Default for TimerDurations {
    fn default() -> Self {
        Self {
            work_duration: default_work_duration(),
            short_break_duration: default_short_break_duration(),
            long_break_duration: default_long_break_duration(),
        }
    }
}

/// Local notification channel toggles.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct NotificationSettings {
    #[serde(default = "default_true")]
    pub sound: bool,
    /// Desktop notification channel ("browser" in the stored record).
    #[serde(rename = "browser", default = "default_true")]
    pub desktop: bool,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            sound: true,
            desktop: true,
        }
    }
}

/// Telegram bot credentials.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelegramSettings {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub chat_id: String,
}

/// Generic webhook endpoint and payload template.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookSettings {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub url: String,
    /// Template body; `{{timestamp}}` and `{{mode}}` are substituted
    /// before sending.
    #[serde(default = "default_webhook_payload")]
    pub payload: String,
}

impl Default for WebhookSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            url: String::new(),
            payload: default_webhook_payload(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IntegrationSettings {
    #[serde(default)]
    pub telegram: TelegramSettings,
    #[serde(default)]
    pub webhook: WebhookSettings,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSettings {
    #[serde(default)]
    pub sessions_completed: u64,
}

/// Full settings record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default)]
    pub theme: Theme,
    #[serde(default)]
    pub design_style: DesignStyle,
    #[serde(default)]
    pub timer_settings: TimerDurations,
    #[serde(default)]
    pub notifications: NotificationSettings,
    #[serde(default)]
    pub integrations: IntegrationSettings,
    #[serde(default)]
    pub stats: StatsSettings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    #[default]
    Dark,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DesignStyle {
    #[default]
    Glassmorphism,
    Flat,
}

// Default functions
fn default_work_duration() -> u64 {
    25 * 60
}
fn default_short_break_duration() -> u64 {
    5 * 60
}
fn default_long_break_duration() -> u64 {
    15 * 60
}
fn default_true() -> bool {
    true
}
fn default_webhook_payload() -> String {
    r#"{"event": "pomodoro_complete", "timestamp": "{{timestamp}}"}"#.to_string()
}

/// Settings access over a [`KvStore`].
///
/// `load` never fails outward: a missing or corrupt record yields defaults.
#[derive(Clone)]
pub struct SettingsStore {
    store: Arc<dyn KvStore>,
}

impl SettingsStore {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    /// Load the settings record, falling back to defaults on any failure.
    pub fn load(&self) -> Settings {
        match self.store.get(SETTINGS_KEY) {
            Ok(Some(json)) => serde_json::from_str(&json).unwrap_or_else(|e| {
                warn!("corrupt settings record, using defaults: {e}");
                Settings::default()
            }),
            Ok(None) => Settings::default(),
            Err(e) => {
                warn!("failed to load settings, using defaults: {e}");
                Settings::default()
            }
        }
    }

    /// Persist the full settings record.
    pub fn save(&self, settings: &Settings) -> Result<(), StorageError> {
        let json = serde_json::to_string(settings)
            .map_err(|e| StorageError::QueryFailed(e.to_string()))?;
        self.store.set(SETTINGS_KEY, &json)
    }

    /// Bump the completed-session counter.
    ///
    /// The one settings write the core requests, on work-mode completion.
    pub fn increment_sessions(&self) -> Result<u64, StorageError> {
        let mut settings = self.load();
        settings.stats.sessions_completed += 1;
        self.save(&settings)?;
        Ok(settings.stats.sessions_completed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn store() -> SettingsStore {
        SettingsStore::new(Arc::new(MemoryStore::new()))
    }

    #[test]
    fn defaults_match_product_defaults() {
        let s = Settings::default();
        assert_eq!(s.timer_settings.work_duration, 25 * 60);
        assert_eq!(s.timer_settings.short_break_duration, 5 * 60);
        assert_eq!(s.timer_settings.long_break_duration, 15 * 60);
        assert!(s.notifications.sound);
        assert!(s.notifications.desktop);
        assert!(!s.integrations.telegram.enabled);
        assert!(!s.integrations.webhook.enabled);
        assert!(s.integrations.webhook.payload.contains("{{timestamp}}"));
        assert_eq!(s.stats.sessions_completed, 0);
    }

    #[test]
    fn missing_record_loads_defaults() {
        let s = store().load();
        assert_eq!(s.stats.sessions_completed, 0);
    }

    #[test]
    fn corrupt_record_loads_defaults() {
        let kv = Arc::new(MemoryStore::new());
        kv.set(SETTINGS_KEY, "{not json").unwrap();
        let s = SettingsStore::new(kv).load();
        assert_eq!(s.timer_settings.work_duration, 25 * 60);
    }

    #[test]
    fn partial_record_fills_missing_fields() {
        let kv = Arc::new(MemoryStore::new());
        kv.set(SETTINGS_KEY, r#"{"timerSettings":{"workDuration":60}}"#)
            .unwrap();
        let s = SettingsStore::new(kv).load();
        assert_eq!(s.timer_settings.work_duration, 60);
        assert_eq!(s.timer_settings.short_break_duration, 5 * 60);
        assert!(s.notifications.sound);
    }

    #[test]
    fn increment_sessions_persists() {
        let store = store();
        assert_eq!(store.increment_sessions().unwrap(), 1);
        assert_eq!(store.increment_sessions().unwrap(), 2);
        assert_eq!(store.load().stats.sessions_completed, 2);
    }

    #[test]
    fn round_trip_preserves_credentials() {
        let store = store();
        let mut s = store.load();
        s.integrations.telegram = TelegramSettings {
            enabled: true,
            token: "123:abc".into(),
            chat_id: "42".into(),
        };
        store.save(&s).unwrap();
        let loaded = store.load();
        assert!(loaded.integrations.telegram.enabled);
        assert_eq!(loaded.integrations.telegram.chat_id, "42");
    }
}
