//! # Pomodorino Core Library
//!
//! Core engine for the Pomodorino countdown timer. The library keeps
//! accurate wall-clock time across host throttling and full process
//! restarts, and fans a completed interval out to four independent
//! notification channels.
//!
//! ## Architecture
//!
//! - **Ticker**: an isolated tokio-task actor that decrements once per
//!   elapsed second -- commands in, tick/complete events out, no shared
//!   state with the rest of the process
//! - **Timer**: single-writer state machine owning `{mode, remaining,
//!   running}`, persisted after every mutation and reconciled against the
//!   stored snapshot at startup
//! - **Storage**: key-value persistence behind the [`KvStore`] trait
//!   (SQLite on disk, in-memory for tests)
//! - **Notify**: best-effort fan-out to sound, desktop, Telegram and
//!   webhook channels -- a failing channel never blocks the others
//!
//! ## Key Components
//!
//! - [`PomodoroTimer`]: timer state machine handle
//! - [`Dispatcher`]: notification fan-out
//! - [`SettingsStore`]: external settings record access
//! - [`Database`]: on-disk key-value store

pub mod error;
pub mod notify;
pub mod settings;
pub mod storage;
pub mod timer;

pub use error::{CoreError, NotifyError, Result, StorageError};
pub use notify::{Dispatcher, Toast, ToastKind, ToastSink};
pub use settings::{
    NotificationSettings, Settings, SettingsStore, TelegramSettings, TimerDurations,
    WebhookSettings,
};
pub use storage::{Database, KvStore, MemoryStore};
pub use timer::{Mode, PomodoroTimer, TimerRecord};
