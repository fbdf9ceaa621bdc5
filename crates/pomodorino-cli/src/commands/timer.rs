use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use clap::{Subcommand, ValueEnum};
use pomodorino_core::timer::snapshot;
use pomodorino_core::{
    Dispatcher, KvStore, Mode, PomodoroTimer, Result, SettingsStore, TimerRecord, ToastSink,
};
use tokio::sync::mpsc;

use super::common::{open_store, print_toast};

#[derive(Subcommand)]
pub enum TimerAction {
    /// Run the timer in the foreground until the interval completes
    Run,
    /// Print current timer state as JSON
    Status,
    /// Mark the timer running from now
    Start,
    /// Pause the countdown, keeping the remaining time
    Pause,
    /// Reset to the configured duration for the current mode
    Reset,
    /// Switch mode (always cancels an in-progress run)
    Mode {
        #[arg(value_enum)]
        mode: ModeArg,
    },
}

#[derive(Clone, Copy, ValueEnum)]
pub enum ModeArg {
    Work,
    ShortBreak,
    LongBreak,
}

impl From<ModeArg> for Mode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Work => Mode::Work,
            ModeArg::ShortBreak => Mode::ShortBreak,
            ModeArg::LongBreak => Mode::LongBreak,
        }
    }
}

pub fn run(action: TimerAction) -> Result<()> {
    let store = open_store()?;
    let durations = SettingsStore::new(store.clone()).load().timer_settings;

    match action {
        TimerAction::Run => run_live(store),
        TimerAction::Status => {
            let record = snapshot::load(store.as_ref(), &durations, Utc::now());
            print_record(&record)
        }
        TimerAction::Start => mutate(store.as_ref(), &durations, |r| {
            if r.remaining_seconds > 0 {
                r.is_running = true;
            }
        }),
        TimerAction::Pause => mutate(store.as_ref(), &durations, |r| r.is_running = false),
        TimerAction::Reset => mutate(store.as_ref(), &durations, |r| {
            r.remaining_seconds = durations.for_mode(r.mode);
            r.is_running = false;
        }),
        TimerAction::Mode { mode } => mutate(store.as_ref(), &durations, |r| {
            r.mode = mode.into();
            r.remaining_seconds = durations.for_mode(r.mode);
            r.is_running = false;
        }),
    }
}

/// One-shot snapshot mutation: reconcile, apply, persist, print.
///
/// A snapshot left running keeps wall-clock time between invocations --
/// `start` now and `status` a minute later shows 60 seconds gone.
fn mutate(
    store: &dyn KvStore,
    durations: &pomodorino_core::TimerDurations,
    apply: impl FnOnce(&mut TimerRecord),
) -> Result<()> {
    let mut record = snapshot::load(store, durations, Utc::now());
    apply(&mut record);
    if record.remaining_seconds == 0 {
        record.is_running = false;
    }
    snapshot::save(store, &record, Utc::now())?;
    print_record(&record)
}

fn print_record(record: &TimerRecord) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(record)?);
    Ok(())
}

fn run_live(store: Arc<dyn KvStore>) -> Result<()> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async move {
        let settings_store = SettingsStore::new(store.clone());
        let settings = settings_store.load();

        let (toasts, mut toast_rx) = ToastSink::channel();
        let dispatcher = Dispatcher::new(toasts);

        let (completed_tx, mut completed_rx) = mpsc::unbounded_channel();
        let timer = PomodoroTimer::new(settings.timer_settings, store.clone(), move |mode| {
            let _ = completed_tx.send(mode);
        });
        timer.start();

        let mut watch = timer.watch();
        loop {
            tokio::select! {
                changed = watch.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let state = watch.borrow_and_update().clone();
                    println!(
                        "[{}] {} {}",
                        state.mode.as_str(),
                        state.formatted(),
                        if state.is_running { "running" } else { "paused" }
                    );
                }
                Some(mode) = completed_rx.recv() => {
                    println!("\"{}\" session complete", mode.label());
                    if mode == Mode::Work {
                        if let Err(e) = settings_store.increment_sessions() {
                            eprintln!("warning: failed to update session counter: {e}");
                        }
                    }
                    let s = settings_store.load();
                    dispatcher.notify_complete(
                        mode,
                        &s.notifications,
                        &s.integrations.telegram,
                        &s.integrations.webhook,
                    );
                    drain_toasts(&mut toast_rx).await;
                    break;
                }
                Some(toast) = toast_rx.recv() => print_toast(&toast),
                _ = tokio::signal::ctrl_c() => {
                    // State is persisted on every change; the snapshot
                    // keeps counting wall-clock time while detached.
                    println!("detached, timer state saved");
                    break;
                }
            }
        }
        Ok(())
    })
}

/// Give the spawned channel tasks a moment to report before exiting.
async fn drain_toasts(toast_rx: &mut mpsc::UnboundedReceiver<pomodorino_core::Toast>) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(3);
    while let Ok(Some(toast)) = tokio::time::timeout_at(deadline, toast_rx.recv()).await {
        print_toast(&toast);
    }
}
