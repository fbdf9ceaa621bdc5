//! Timer state machine.
//!
//! A single-writer actor owns the [`TimerRecord`]: external commands and
//! ticker events are merged into one loop, so no mutation ever races
//! another. Every mutation is persisted through the snapshot module before
//! the next event is processed, and published to observers over a watch
//! channel.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{mpsc, watch};
use tracing::{debug, warn};

use super::snapshot;
use super::ticker::{TickerEvent, TickerHandle};
use super::{Mode, TimerRecord};
use crate::settings::TimerDurations;
use crate::storage::KvStore;

/// Commands accepted by the timer actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerCommand {
    /// Forward `start` to the ticker. No-op when the count is at zero.
    Start,
    /// Stop counting, keep the remaining time.
    Pause,
    /// Back to the configured duration for the current mode, stopped.
    Reset,
    /// Switch mode; always cancels any in-progress run.
    ChangeMode(Mode),
    /// Replace the configured durations used by future resets.
    SetDurations(TimerDurations),
}

/// Handle to the timer actor.
///
/// Commands are fire-and-forget; state flows back through [`watch`].
/// Dropping the handle shuts the actor (and its ticker) down.
pub struct PomodoroTimer {
    commands: mpsc::UnboundedSender<TimerCommand>,
    state: watch::Receiver<TimerRecord>,
}

impl PomodoroTimer {
    /// Rehydrate from the stored snapshot and spawn the timer actor.
    ///
    /// With no (or corrupt) snapshot the timer starts idle at the work
    /// duration. A snapshot that was running gets the downtime subtracted;
    /// if it expired while the process was down it comes up finished and
    /// stopped, and `on_complete` is NOT fired for that transition.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(
        durations: TimerDurations,
        store: Arc<dyn KvStore>,
        on_complete: impl Fn(Mode) + Send + Sync + 'static,
    ) -> Self {
        let now = Utc::now();
        let record = snapshot::load(store.as_ref(), &durations, now);

        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let ticker = TickerHandle::spawn(event_tx);
        ticker.set_time(record.remaining_seconds);
        if record.is_running {
            ticker.start();
        }

        // Re-persist the reconciled state so the stored timestamp is fresh.
        if let Err(e) = snapshot::save(store.as_ref(), &record, now) {
            warn!("failed to persist reconciled timer state: {e}");
        }

        let (state_tx, state_rx) = watch::channel(record.clone());
        let (command_tx, command_rx) = mpsc::unbounded_channel();

        let core = MachineCore {
            counting_mode: record.mode,
            record,
            durations,
            ticker,
            store,
            state_tx,
            on_complete: Box::new(on_complete),
        };
        tokio::spawn(core.run(command_rx, event_rx));

        Self {
            commands: command_tx,
            state: state_rx,
        }
    }

    pub fn start(&self) {
        self.send(TimerCommand::Start);
    }

    pub fn pause(&self) {
        self.send(TimerCommand::Pause);
    }

    pub fn reset(&self) {
        self.send(TimerCommand::Reset);
    }

    pub fn change_mode(&self, mode: Mode) {
        self.send(TimerCommand::ChangeMode(mode));
    }

    pub fn set_durations(&self, durations: TimerDurations) {
        self.send(TimerCommand::SetDurations(durations));
    }

    /// Current state snapshot.
    pub fn state(&self) -> TimerRecord {
        self.state.borrow().clone()
    }

    /// Watch receiver for observing state changes.
    pub fn watch(&self) -> watch::Receiver<TimerRecord> {
        self.state.clone()
    }

    fn send(&self, command: TimerCommand) {
        if self.commands.send(command).is_err() {
            debug!("timer task gone, dropping command");
        }
    }
}

struct MachineCore {
    record: TimerRecord,
    durations: TimerDurations,
    /// Mode active when the current counting period began. Completions
    /// report this, so a concurrent mode change cannot relabel them.
    counting_mode: Mode,
    ticker: TickerHandle,
    store: Arc<dyn KvStore>,
    state_tx: watch::Sender<TimerRecord>,
    on_complete: Box<dyn Fn(Mode) + Send + Sync>,
}

impl MachineCore {
    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<TimerCommand>,
        mut events: mpsc::UnboundedReceiver<TickerEvent>,
    ) {
        loop {
            tokio::select! {
                cmd = commands.recv() => match cmd {
                    Some(cmd) => self.handle_command(cmd),
                    None => break,
                },
                ev = events.recv() => match ev {
                    Some(ev) => self.handle_event(ev),
                    None => break,
                },
            }
        }
    }

    fn handle_command(&mut self, command: TimerCommand) {
        match command {
            TimerCommand::Start => {
                if self.record.remaining_seconds == 0 {
                    return;
                }
                self.counting_mode = self.record.mode;
                self.ticker.start();
                self.apply(|r| r.is_running = true);
            }
            TimerCommand::Pause => {
                self.ticker.pause();
                self.apply(|r| r.is_running = false);
            }
            TimerCommand::Reset => {
                let duration = self.durations.for_mode(self.record.mode);
                self.ticker.reset(duration);
                self.apply(|r| {
                    r.remaining_seconds = duration;
                    r.is_running = false;
                });
            }
            TimerCommand::ChangeMode(mode) => {
                let duration = self.durations.for_mode(mode);
                self.ticker.reset(duration);
                self.apply(|r| {
                    r.mode = mode;
                    r.remaining_seconds = duration;
                    r.is_running = false;
                });
            }
            TimerCommand::SetDurations(durations) => {
                // Takes effect on the next reset or mode change.
                self.durations = durations;
            }
        }
    }

    fn handle_event(&mut self, event: TickerEvent) {
        match event {
            TickerEvent::Tick(value) => {
                self.apply(|r| r.remaining_seconds = value);
            }
            TickerEvent::Complete => {
                self.apply(|r| r.is_running = false);
                (self.on_complete)(self.counting_mode);
            }
        }
    }

    /// Mutate the record, enforce the zero-implies-stopped invariant,
    /// persist, publish. Every mutation goes through here.
    fn apply(&mut self, mutate: impl FnOnce(&mut TimerRecord)) {
        mutate(&mut self.record);
        if self.record.remaining_seconds == 0 {
            self.record.is_running = false;
        }
        if let Err(e) = snapshot::save(self.store.as_ref(), &self.record, Utc::now()) {
            warn!("failed to persist timer state: {e}");
        }
        self.state_tx.send_replace(self.record.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{KvStore, MemoryStore};
    use crate::timer::snapshot::{PersistedSnapshot, SNAPSHOT_KEY};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::time::timeout;

    fn durations(work: u64, short: u64, long: u64) -> TimerDurations {
        TimerDurations {
            work_duration: work,
            short_break_duration: short,
            long_break_duration: long,
        }
    }

    fn stored_record(store: &dyn KvStore) -> TimerRecord {
        let json = store.get(SNAPSHOT_KEY).unwrap().expect("snapshot written");
        let snapshot: PersistedSnapshot = serde_json::from_str(&json).unwrap();
        TimerRecord {
            mode: snapshot.mode,
            remaining_seconds: snapshot.remaining_seconds,
            is_running: snapshot.is_running,
        }
    }

    async fn wait_for(
        watch: &mut watch::Receiver<TimerRecord>,
        pred: impl Fn(&TimerRecord) -> bool,
    ) -> TimerRecord {
        let record = timeout(
            Duration::from_secs(600),
            watch.wait_for(|r| pred(r)),
        )
        .await
        .expect("timed out waiting for state")
        .expect("timer task gone");
        record.clone()
    }

    #[tokio::test(start_paused = true)]
    async fn fresh_start_defaults_to_idle_work() {
        let store = Arc::new(MemoryStore::new());
        let timer = PomodoroTimer::new(durations(1500, 300, 900), store.clone(), |_| {});
        let state = timer.state();
        assert_eq!(state.mode, Mode::Work);
        assert_eq!(state.remaining_seconds, 1500);
        assert!(!state.is_running);
        // Startup persists the reconciled state immediately.
        assert_eq!(stored_record(store.as_ref()), state);
    }

    #[tokio::test(start_paused = true)]
    async fn start_counts_down_and_completes() {
        let store = Arc::new(MemoryStore::new());
        let completions = Arc::new(Mutex::new(Vec::new()));
        let seen = completions.clone();
        let timer = PomodoroTimer::new(durations(2, 300, 900), store.clone(), move |mode| {
            seen.lock().unwrap().push(mode);
        });

        timer.start();
        let mut watch = timer.watch();
        let done = wait_for(&mut watch, |r| r.remaining_seconds == 0 && !r.is_running).await;
        assert_eq!(done.mode, Mode::Work);

        // Exactly one completion, reported with the mode that ran.
        tokio::task::yield_now().await;
        assert_eq!(completions.lock().unwrap().as_slice(), &[Mode::Work]);
        assert_eq!(stored_record(store.as_ref()), done);
    }

    #[tokio::test(start_paused = true)]
    async fn pause_preserves_remaining_and_persists() {
        let store = Arc::new(MemoryStore::new());
        let timer = PomodoroTimer::new(durations(100, 300, 900), store.clone(), |_| {});

        timer.start();
        let mut watch = timer.watch();
        wait_for(&mut watch, |r| r.is_running && r.remaining_seconds == 98).await;

        timer.pause();
        let paused = wait_for(&mut watch, |r| !r.is_running).await;
        assert_eq!(paused.remaining_seconds, 98);
        assert_eq!(stored_record(store.as_ref()), paused);
    }

    #[tokio::test(start_paused = true)]
    async fn reset_restores_configured_duration() {
        let store = Arc::new(MemoryStore::new());
        let timer = PomodoroTimer::new(durations(100, 300, 900), store.clone(), |_| {});

        timer.start();
        let mut watch = timer.watch();
        wait_for(&mut watch, |r| r.remaining_seconds == 95).await;

        timer.reset();
        let reset = wait_for(&mut watch, |r| !r.is_running && r.remaining_seconds == 100).await;
        assert_eq!(reset.mode, Mode::Work);

        // reset() then start() resumes a normal countdown.
        timer.start();
        wait_for(&mut watch, |r| r.is_running && r.remaining_seconds == 99).await;
    }

    #[tokio::test(start_paused = true)]
    async fn change_mode_cancels_run_and_loads_new_duration() {
        let store = Arc::new(MemoryStore::new());
        let timer = PomodoroTimer::new(durations(100, 300, 900), store.clone(), |_| {});

        timer.start();
        let mut watch = timer.watch();
        wait_for(&mut watch, |r| r.is_running).await;

        timer.change_mode(Mode::ShortBreak);
        let switched = wait_for(&mut watch, |r| r.mode == Mode::ShortBreak).await;
        assert_eq!(switched.remaining_seconds, 300);
        assert!(!switched.is_running);
    }

    #[tokio::test(start_paused = true)]
    async fn start_at_zero_is_noop() {
        let store = Arc::new(MemoryStore::new());
        snapshot::save(
            store.as_ref(),
            &TimerRecord {
                mode: Mode::Work,
                remaining_seconds: 0,
                is_running: false,
            },
            Utc::now(),
        )
        .unwrap();

        let fired = Arc::new(AtomicUsize::new(0));
        let seen = fired.clone();
        let timer = PomodoroTimer::new(durations(100, 300, 900), store, move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
        });

        timer.start();
        tokio::time::sleep(Duration::from_secs(5)).await;
        let state = timer.state();
        assert_eq!(state.remaining_seconds, 0);
        assert!(!state.is_running);
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn rehydrates_running_snapshot_with_elapsed_credit() {
        let store = Arc::new(MemoryStore::new());
        let snapshot = PersistedSnapshot {
            mode: Mode::ShortBreak,
            remaining_seconds: 10,
            is_running: true,
            last_updated: Utc::now().timestamp_millis() - 4_000,
        };
        store
            .set(SNAPSHOT_KEY, &serde_json::to_string(&snapshot).unwrap())
            .unwrap();

        let timer = PomodoroTimer::new(durations(100, 300, 900), store, |_| {});
        let state = timer.state();
        assert_eq!(state.mode, Mode::ShortBreak);
        assert_eq!(state.remaining_seconds, 6);
        assert!(state.is_running);

        // Resumed timer keeps counting.
        let mut watch = timer.watch();
        wait_for(&mut watch, |r| r.remaining_seconds == 5).await;
    }

    #[tokio::test(start_paused = true)]
    async fn expired_snapshot_resolves_without_firing_completion() {
        let store = Arc::new(MemoryStore::new());
        let snapshot = PersistedSnapshot {
            mode: Mode::Work,
            remaining_seconds: 10,
            is_running: true,
            last_updated: Utc::now().timestamp_millis() - 11_000,
        };
        store
            .set(SNAPSHOT_KEY, &serde_json::to_string(&snapshot).unwrap())
            .unwrap();

        let fired = Arc::new(AtomicUsize::new(0));
        let seen = fired.clone();
        let timer = PomodoroTimer::new(durations(100, 300, 900), store, move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
        });

        tokio::time::sleep(Duration::from_secs(5)).await;
        let state = timer.state();
        assert_eq!(state.remaining_seconds, 0);
        assert!(!state.is_running);
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn new_durations_apply_on_next_reset() {
        let store = Arc::new(MemoryStore::new());
        let timer = PomodoroTimer::new(durations(100, 300, 900), store, |_| {});

        timer.set_durations(durations(50, 300, 900));
        let mut watch = timer.watch();
        // Unchanged until a reset happens.
        assert_eq!(timer.state().remaining_seconds, 100);

        timer.reset();
        wait_for(&mut watch, |r| r.remaining_seconds == 50).await;
    }

    // The completion callback reports the mode captured when counting
    // began, driven synchronously against the core to pin the ordering.
    #[tokio::test(start_paused = true)]
    async fn completion_reports_mode_captured_at_start() {
        let (event_tx, _event_rx) = mpsc::unbounded_channel();
        let (state_tx, _state_rx) = watch::channel(TimerRecord::idle(Mode::Work, 10));
        let completions = Arc::new(Mutex::new(Vec::new()));
        let seen = completions.clone();
        let mut core = MachineCore {
            record: TimerRecord::idle(Mode::Work, 10),
            durations: durations(10, 20, 30),
            counting_mode: Mode::Work,
            ticker: TickerHandle::spawn(event_tx),
            store: Arc::new(MemoryStore::new()),
            state_tx,
            on_complete: Box::new(move |mode| seen.lock().unwrap().push(mode)),
        };

        core.handle_command(TimerCommand::Start);
        // Mode change races the in-flight completion: the completion still
        // reports the mode that was counting.
        core.handle_command(TimerCommand::ChangeMode(Mode::LongBreak));
        core.handle_event(TickerEvent::Complete);
        assert_eq!(completions.lock().unwrap().as_slice(), &[Mode::Work]);
    }
}
