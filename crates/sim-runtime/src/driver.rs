use persistence::KeyValueStore;
use std::future::Future;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

use crate::config::RuntimeConfig;
use crate::session::Session;

/// Work performed by the driver over some span of time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    pub ticks: u64,
    pub saves: u64,
}

/// Fixed-cadence scheduler for a [`Session`]: periodic `advance`, periodic
/// autosave, one load on start and one save on shutdown.
///
/// The driver does not own a clock. Hosts either feed it elapsed time via
/// [`TickDriver::on_elapsed`] or hand it to [`run_realtime`].
#[derive(Clone, Debug)]
pub struct TickDriver {
    tick_interval: Duration,
    save_interval: Duration,
    since_tick: Duration,
    since_save: Duration,
    running: bool,
    total_ticks: u64,
}

impl TickDriver {
    pub fn new(config: &RuntimeConfig) -> Self {
        Self {
            tick_interval: config.tick_interval(),
            save_interval: config.save_interval(),
            since_tick: Duration::ZERO,
            since_save: Duration::ZERO,
            running: false,
            total_ticks: 0,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn total_ticks(&self) -> u64 {
        self.total_ticks
    }

    /// Load the stored game exactly once, before any tick. Returns whether a
    /// save was applied; later calls do nothing.
    pub fn start<S: KeyValueStore>(&mut self, session: &mut Session<S>) -> bool {
        if self.running {
            return false;
        }
        self.running = true;
        let loaded = session.load();
        info!(
            loaded,
            tick_ms = self.tick_interval.as_millis() as u64,
            save_ms = self.save_interval.as_millis() as u64,
            "tick driver started"
        );
        loaded
    }

    /// One fixed-size economy step.
    pub fn tick<S: KeyValueStore>(&mut self, session: &mut Session<S>) {
        if !self.running {
            return;
        }
        session.advance(self.tick_interval.as_secs_f64());
        self.total_ticks += 1;
    }

    /// One autosave.
    pub fn autosave<S: KeyValueStore>(&mut self, session: &mut Session<S>) {
        if !self.running {
            return;
        }
        let saved = session.save();
        debug!(saved, ticks = self.total_ticks, "autosave");
    }

    /// Account for `elapsed` wall time. Every tick that became due is
    /// applied in a single `advance` covering all of them (nothing can be
    /// bought in between, so the rate is constant) and at most one autosave
    /// runs, after the accrual. Remainders carry to the next call.
    pub fn on_elapsed<S: KeyValueStore>(
        &mut self,
        session: &mut Session<S>,
        elapsed: Duration,
    ) -> TickReport {
        let mut report = TickReport::default();
        if !self.running {
            return report;
        }
        self.since_tick = self.since_tick.saturating_add(elapsed);
        let (due, rest) = split_due(self.since_tick, self.tick_interval);
        self.since_tick = rest;
        if due > 0 {
            session.advance(self.tick_interval.as_secs_f64() * due as f64);
            self.total_ticks = self.total_ticks.saturating_add(due);
            report.ticks = due;
        }
        self.since_save = self.since_save.saturating_add(elapsed);
        let (due_saves, rest) = split_due(self.since_save, self.save_interval);
        self.since_save = rest;
        if due_saves > 0 {
            self.autosave(session);
            report.saves = 1;
        }
        report
    }

    /// Stop the driver with a final best-effort save. Returns whether that
    /// save succeeded; a driver that never started does nothing.
    pub fn shutdown<S: KeyValueStore>(&mut self, session: &mut Session<S>) -> bool {
        if !self.running {
            return false;
        }
        self.running = false;
        let saved = session.save();
        info!(saved, ticks = self.total_ticks, "tick driver stopped");
        saved
    }
}

/// Number of whole `period`s in `span`, and what is left over.
fn split_due(span: Duration, period: Duration) -> (u64, Duration) {
    let period_ns = period.as_nanos().max(1);
    let span_ns = span.as_nanos();
    let due = u64::try_from(span_ns / period_ns).unwrap_or(u64::MAX);
    // Below `period`, so it fits in u64 nanoseconds.
    let rest = Duration::from_nanos(u64::try_from(span_ns % period_ns).unwrap_or(u64::MAX));
    (due, rest)
}

/// Drive `session` on real timers until `shutdown` resolves, then save.
///
/// Runs on the caller's task: tick and autosave are two `tokio` intervals
/// multiplexed with the shutdown future, so no economy operation ever runs
/// concurrently with another. Starts the driver first if needed.
pub async fn run_realtime<S, F>(
    driver: &mut TickDriver,
    session: &mut Session<S>,
    shutdown: F,
) -> TickReport
where
    S: KeyValueStore,
    F: Future<Output = ()>,
{
    driver.start(session);
    let mut report = TickReport::default();

    let mut ticks = interval(driver.tick_interval);
    let mut saves = interval(driver.save_interval);
    ticks.set_missed_tick_behavior(MissedTickBehavior::Burst);
    saves.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // Both intervals complete immediately on their first poll.
    ticks.tick().await;
    saves.tick().await;

    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            _ = ticks.tick() => {
                driver.tick(session);
                report.ticks += 1;
            }
            _ = saves.tick() => {
                driver.autosave(session);
                report.saves += 1;
            }
        }
    }
    driver.shutdown(session);
    report
}
