//! Tick source: an isolated countdown clock.
//!
//! The ticker runs on its own tokio task so a congested caller cannot
//! stall it. Communication is message passing only -- fire-and-forget
//! commands in, tick/complete events out -- with no shared state. While
//! running it emits one [`TickerEvent::Tick`] per elapsed second and
//! exactly one [`TickerEvent::Complete`] when the count reaches zero,
//! after which it stops on its own.

use std::future;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{interval_at, Instant, Interval};
use tracing::debug;

/// Commands accepted by the ticker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickerCommand {
    /// Begin decrementing once per second. No-op while already running or
    /// when the remaining count is zero.
    Start,
    /// Stop decrementing, keep the remaining count. No-op while paused.
    Pause,
    /// Stop, set the remaining count, emit one immediate tick.
    Reset(u64),
    /// Set the remaining count without touching the run state, emit one
    /// immediate tick.
    SetTime(u64),
}

/// Events emitted by the ticker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickerEvent {
    Tick(u64),
    Complete,
}

/// Handle to a spawned ticker task.
///
/// Dropping the handle closes the command channel and the task exits.
pub struct TickerHandle {
    commands: mpsc::UnboundedSender<TickerCommand>,
}

impl TickerHandle {
    /// Spawn the ticker actor, delivering its events to `events`.
    pub fn spawn(events: mpsc::UnboundedSender<TickerEvent>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let ticker = Ticker {
            remaining: 0,
            interval: None,
            events,
        };
        tokio::spawn(ticker.run(rx));
        Self { commands: tx }
    }

    pub fn start(&self) {
        self.send(TickerCommand::Start);
    }

    pub fn pause(&self) {
        self.send(TickerCommand::Pause);
    }

    pub fn reset(&self, seconds: u64) {
        self.send(TickerCommand::Reset(seconds));
    }

    pub fn set_time(&self, seconds: u64) {
        self.send(TickerCommand::SetTime(seconds));
    }

    fn send(&self, command: TickerCommand) {
        if self.commands.send(command).is_err() {
            debug!("ticker task gone, dropping command");
        }
    }
}

struct Ticker {
    remaining: u64,
    /// `Some` while counting down. Cleared on pause, reset and completion.
    interval: Option<Interval>,
    events: mpsc::UnboundedSender<TickerEvent>,
}

enum Step {
    Command(Option<TickerCommand>),
    Second,
}

impl Ticker {
    async fn run(mut self, mut commands: mpsc::UnboundedReceiver<TickerCommand>) {
        loop {
            // The interval future borrows `self.interval`, so resolve the
            // select into a plain value before touching `self` again.
            let step = tokio::select! {
                cmd = commands.recv() => Step::Command(cmd),
                _ = next_second(self.interval.as_mut()) => Step::Second,
            };
            match step {
                Step::Command(Some(cmd)) => self.handle(cmd),
                Step::Command(None) => break,
                Step::Second => self.on_second(),
            }
        }
    }

    fn handle(&mut self, command: TickerCommand) {
        match command {
            TickerCommand::Start => {
                if self.interval.is_none() && self.remaining > 0 {
                    let period = Duration::from_secs(1);
                    self.interval = Some(interval_at(Instant::now() + period, period));
                }
            }
            TickerCommand::Pause => {
                self.interval = None;
            }
            TickerCommand::Reset(seconds) => {
                self.interval = None;
                self.remaining = seconds;
                self.emit(TickerEvent::Tick(self.remaining));
            }
            TickerCommand::SetTime(seconds) => {
                self.remaining = seconds;
                self.emit(TickerEvent::Tick(self.remaining));
            }
        }
    }

    fn on_second(&mut self) {
        if self.remaining > 0 {
            self.remaining -= 1;
            self.emit(TickerEvent::Tick(self.remaining));
        }
        if self.remaining == 0 {
            self.interval = None;
            self.emit(TickerEvent::Complete);
        }
    }

    fn emit(&self, event: TickerEvent) {
        if self.events.send(event).is_err() {
            debug!("ticker event receiver gone");
        }
    }
}

/// Awaits the next interval tick, or forever when not running.
async fn next_second(interval: Option<&mut Interval>) {
    match interval {
        Some(interval) => {
            interval.tick().await;
        }
        None => future::pending().await,
    }
}
