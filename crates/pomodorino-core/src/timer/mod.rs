//! Timer engine: tick source, state machine and snapshot reconciliation.

mod machine;
pub mod snapshot;
mod ticker;

pub use machine::{PomodoroTimer, TimerCommand};
pub use snapshot::PersistedSnapshot;
pub use ticker::{TickerCommand, TickerEvent, TickerHandle};

use serde::{Deserialize, Serialize};

/// The three countdown modes. Each maps to one configured duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Mode {
    Work,
    ShortBreak,
    LongBreak,
}

impl Mode {
    /// Wire identifier, as stored in snapshots and webhook payloads.
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Work => "work",
            Mode::ShortBreak => "shortBreak",
            Mode::LongBreak => "longBreak",
        }
    }

    /// Human-readable label for notification texts.
    pub fn label(&self) -> &'static str {
        match self {
            Mode::Work => "Work",
            Mode::ShortBreak => "Short break",
            Mode::LongBreak => "Long break",
        }
    }
}

/// Live timer state.
///
/// Owned exclusively by the timer actor; observers get copies through a
/// watch channel. Invariant: `remaining_seconds == 0` implies
/// `!is_running`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerRecord {
    pub mode: Mode,
    pub remaining_seconds: u64,
    pub is_running: bool,
}

impl TimerRecord {
    /// Stopped record at the full duration for the given mode.
    pub fn idle(mode: Mode, duration_secs: u64) -> Self {
        Self {
            mode,
            remaining_seconds: duration_secs,
            is_running: false,
        }
    }

    /// `MM:SS` rendering of the remaining time.
    pub fn formatted(&self) -> String {
        format!(
            "{:02}:{:02}",
            self.remaining_seconds / 60,
            self.remaining_seconds % 60
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_wire_names() {
        assert_eq!(Mode::Work.as_str(), "work");
        assert_eq!(Mode::ShortBreak.as_str(), "shortBreak");
        assert_eq!(Mode::LongBreak.as_str(), "longBreak");
        assert_eq!(
            serde_json::to_string(&Mode::ShortBreak).unwrap(),
            "\"shortBreak\""
        );
    }

    #[test]
    fn formats_remaining_time() {
        assert_eq!(TimerRecord::idle(Mode::Work, 25 * 60).formatted(), "25:00");
        assert_eq!(TimerRecord::idle(Mode::Work, 61).formatted(), "01:01");
        assert_eq!(TimerRecord::idle(Mode::Work, 0).formatted(), "00:00");
    }
}
