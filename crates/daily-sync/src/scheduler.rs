//! Polling scheduler for the watch loop.
//!
//! The scheduler runs one tick function on a fixed cadence and on demand:
//! - a tick every `tick_interval`, measured from when the tick was due so
//!   slow ticks do not push the cadence back
//! - manual refreshes, rate limited by a cooldown
//! - exponential backoff after failed ticks
//!
//! Ticks and commands are handled on one task, so a tick never overlaps a
//! refresh; a command arriving mid-tick waits on the channel.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Scheduler configuration.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Interval between scheduled ticks.
    pub tick_interval: Duration,
    /// Minimum spacing between manual refreshes.
    pub refresh_cooldown: Duration,
    /// Delay after the first failure.
    pub initial_backoff: Duration,
    /// Upper bound of the failure delay.
    pub max_backoff: Duration,
    pub backoff_multiplier: f64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(60),
            refresh_cooldown: Duration::from_secs(30),
            initial_backoff: Duration::from_secs(5),
            max_backoff: Duration::from_secs(300),
            backoff_multiplier: 2.0,
        }
    }
}

impl SchedulerConfig {
    pub fn new(tick_interval: Duration) -> Self {
        Self {
            tick_interval,
            ..Default::default()
        }
    }

    /// Delay after `consecutive_failures` failed ticks.
    ///
    /// Grows past the tick interval up to `max_backoff`, so a failing
    /// calendar is polled less often than a healthy one.
    pub fn backoff_delay(&self, consecutive_failures: u32) -> Duration {
        if consecutive_failures == 0 {
            return Duration::ZERO;
        }

        let base = self.initial_backoff.as_secs_f64();
        let multiplier = self
            .backoff_multiplier
            .powi(consecutive_failures.saturating_sub(1).min(i32::MAX as u32) as i32);
        let delay = base * multiplier;
        let max = self.max_backoff.as_secs_f64();

        Duration::from_secs_f64(delay.min(max))
    }
}

/// First cadence slot after `now`, counted from `due`.
fn next_on_cadence(due: Instant, interval: Duration, now: Instant) -> Instant {
    let mut next = due + interval;
    while next <= now {
        next += interval;
    }
    next
}

/// Commands accepted by a running scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerCommand {
    /// Run a tick that forces a calendar refresh, unless one ran within the
    /// cooldown.
    Refresh,
    Stop,
}

/// Failure and refresh bookkeeping of a running scheduler.
#[derive(Debug, Clone, Default)]
pub struct SchedulerState {
    pub consecutive_failures: u32,
    pub last_error: Option<String>,
    /// Last manual refresh, for the cooldown.
    pub last_refresh: Option<Instant>,
}

impl SchedulerState {
    pub fn record_success(&mut self) {
        self.consecutive_failures = 0;
        self.last_error = None;
    }

    pub fn record_failure(&mut self, error: impl Into<String>) {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        self.last_error = Some(error.into());
    }

    pub fn record_refresh(&mut self) {
        self.last_refresh = Some(Instant::now());
    }

    pub fn in_cooldown(&self, cooldown: Duration) -> bool {
        self.last_refresh
            .is_some_and(|last_refresh| last_refresh.elapsed() < cooldown)
    }
}

/// Drives a tick function until stopped.
pub struct Scheduler {
    config: SchedulerConfig,
    command_tx: mpsc::Sender<SchedulerCommand>,
    command_rx: mpsc::Receiver<SchedulerCommand>,
}

impl Scheduler {
    pub fn new(config: SchedulerConfig) -> Self {
        let (command_tx, command_rx) = mpsc::channel(16);
        Self {
            config,
            command_tx,
            command_rx,
        }
    }

    pub fn handle(&self) -> SchedulerHandle {
        SchedulerHandle {
            command_tx: self.command_tx.clone(),
        }
    }

    /// Runs until [`SchedulerCommand::Stop`] or until every handle is gone.
    ///
    /// `tick` receives whether the calendar refresh is forced. The first tick
    /// runs immediately.
    pub async fn run<F, Fut, E>(self, tick: F)
    where
        F: Fn(bool) -> Fut + Send + Sync,
        Fut: Future<Output = Result<(), E>> + Send,
        E: Display + Send,
    {
        let Self {
            config,
            command_tx,
            mut command_rx,
        } = self;
        // only external handles keep the loop alive
        drop(command_tx);

        info!(
            interval_secs = config.tick_interval.as_secs(),
            "scheduler started"
        );

        let mut state = SchedulerState::default();
        let mut next_tick = Instant::now();

        loop {
            tokio::select! {
                _ = tokio::time::sleep_until(next_tick) => {
                    let due = next_tick;
                    next_tick = if run_tick(&mut state, &tick, false).await {
                        next_on_cadence(due, config.tick_interval, Instant::now())
                    } else {
                        backoff_deadline(&config, &state)
                    };
                    debug!(
                        delay_ms = next_tick.saturating_duration_since(Instant::now()).as_millis() as u64,
                        "next tick scheduled"
                    );
                }
                cmd = command_rx.recv() => {
                    match cmd {
                        Some(SchedulerCommand::Refresh) => {
                            if state.in_cooldown(config.refresh_cooldown) {
                                debug!("refresh skipped during cooldown");
                                continue;
                            }
                            state.record_refresh();
                            if !run_tick(&mut state, &tick, true).await {
                                next_tick = backoff_deadline(&config, &state);
                            }
                        }
                        Some(SchedulerCommand::Stop) | None => {
                            info!("scheduler stopping");
                            break;
                        }
                    }
                }
            }
        }
    }
}

fn backoff_deadline(config: &SchedulerConfig, state: &SchedulerState) -> Instant {
    let backoff = config.backoff_delay(state.consecutive_failures);
    debug!(
        failures = state.consecutive_failures,
        backoff_secs = backoff.as_secs(),
        "backing off"
    );
    Instant::now() + backoff
}

/// Runs one tick and records its outcome. Returns true on success.
async fn run_tick<F, Fut, E>(state: &mut SchedulerState, tick: &F, force: bool) -> bool
where
    F: Fn(bool) -> Fut,
    Fut: Future<Output = Result<(), E>>,
    E: Display,
{
    match tick(force).await {
        Ok(()) => {
            debug!(force, "tick completed");
            state.record_success();
            true
        }
        Err(e) => {
            warn!(error = %e, force, "tick failed");
            state.record_failure(e.to_string());
            false
        }
    }
}

/// Sends commands to a running [`Scheduler`].
#[derive(Clone, Debug)]
pub struct SchedulerHandle {
    command_tx: mpsc::Sender<SchedulerCommand>,
}

type SendResult = Result<(), mpsc::error::SendError<SchedulerCommand>>;

impl SchedulerHandle {
    pub async fn refresh(&self) -> SendResult {
        self.command_tx.send(SchedulerCommand::Refresh).await
    }

    pub async fn stop(&self) -> SendResult {
        self.command_tx.send(SchedulerCommand::Stop).await
    }
}
