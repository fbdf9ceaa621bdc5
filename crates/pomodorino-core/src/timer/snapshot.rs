//! Snapshot persistence and elapsed-time reconciliation.
//!
//! The timer writes a [`PersistedSnapshot`] after every state change and
//! reads it back once at startup. `serialize` and `reconcile` are pure so
//! the correction math is testable without a store or a clock.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::{Mode, TimerRecord};
use crate::error::StorageError;
use crate::settings::TimerDurations;
use crate::storage::KvStore;

/// Key-value slot holding the serialized timer snapshot.
pub const SNAPSHOT_KEY: &str = "timer-state";

/// On-disk timer state, a [`TimerRecord`] plus the write timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedSnapshot {
    pub mode: Mode,
    pub remaining_seconds: u64,
    pub is_running: bool,
    /// Epoch milliseconds of the write.
    pub last_updated: i64,
}

/// Attach the current timestamp to a record.
pub fn serialize(record: &TimerRecord, now: DateTime<Utc>) -> PersistedSnapshot {
    PersistedSnapshot {
        mode: record.mode,
        remaining_seconds: record.remaining_seconds,
        is_running: record.is_running,
        last_updated: now.timestamp_millis(),
    }
}

/// Reconstruct live state from a snapshot, crediting wall-clock time that
/// passed while the process was down.
///
/// A snapshot that was running gets `floor((now - last_updated) / 1000)`
/// seconds subtracted; a countdown that expired while unobserved resolves
/// to the finished, stopped state without re-firing any completion. A
/// `last_updated` in the future (clock skew) counts as zero elapsed.
pub fn reconcile(snapshot: &PersistedSnapshot, now: DateTime<Utc>) -> TimerRecord {
    if !snapshot.is_running {
        return TimerRecord {
            mode: snapshot.mode,
            remaining_seconds: snapshot.remaining_seconds,
            is_running: false,
        };
    }

    let elapsed_secs = ((now.timestamp_millis() - snapshot.last_updated).max(0) / 1000) as u64;
    let remaining = snapshot.remaining_seconds.saturating_sub(elapsed_secs);
    TimerRecord {
        mode: snapshot.mode,
        remaining_seconds: remaining,
        is_running: remaining > 0,
    }
}

/// Load and reconcile the stored snapshot.
///
/// Missing, unreadable or corrupt data falls back to the default record
/// for the configured durations; nothing propagates past this boundary.
pub fn load(store: &dyn KvStore, durations: &TimerDurations, now: DateTime<Utc>) -> TimerRecord {
    let fallback = || TimerRecord::idle(Mode::Work, durations.work_duration);
    match store.get(SNAPSHOT_KEY) {
        Ok(Some(json)) => match serde_json::from_str::<PersistedSnapshot>(&json) {
            Ok(snapshot) => reconcile(&snapshot, now),
            Err(e) => {
                warn!("corrupt timer snapshot, starting fresh: {e}");
                fallback()
            }
        },
        Ok(None) => fallback(),
        Err(e) => {
            warn!("failed to read timer snapshot, starting fresh: {e}");
            fallback()
        }
    }
}

/// Persist the record with `last_updated = now`.
pub fn save(
    store: &dyn KvStore,
    record: &TimerRecord,
    now: DateTime<Utc>,
) -> Result<(), StorageError> {
    let snapshot = serialize(record, now);
    let json =
        serde_json::to_string(&snapshot).map_err(|e| StorageError::QueryFailed(e.to_string()))?;
    store.set(SNAPSHOT_KEY, &json)
}
