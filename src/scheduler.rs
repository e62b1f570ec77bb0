// Fixed-interval driver: one collection round per tick, never two at once.
// Ticks that fall inside a round are dropped (recorded as overruns), not queued.
// Stop is cooperative and only observed between rounds.

use crate::collector::{RoundReport, StatsCollector};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{Duration, Instant, MissedTickBehavior, interval, interval_at};
use tracing::Instrument;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Ticking,
    Collecting,
    Stopped,
}

/// Upper clamp for `SchedulerConfig::stats_log_interval` (about thirty years).
const MAX_STATS_LOG_INTERVAL: Duration = Duration::from_secs(86_400 * 365 * 30);

pub struct SchedulerConfig {
    pub period: Duration,
    /// How often to log app stats (real time).
    pub stats_log_interval: Duration,
}

/// Running totals across rounds.
#[derive(Debug, Default)]
pub struct SchedulerStats {
    rounds: AtomicU64,
    events_published: AtomicU64,
    containers_skipped: AtomicU64,
    list_failures: AtomicU64,
    overruns: AtomicU64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerTotals {
    pub rounds: u64,
    pub events_published: u64,
    pub containers_skipped: u64,
    pub list_failures: u64,
    /// Ticks dropped because a round was still running.
    pub overruns: u64,
}

impl SchedulerStats {
    fn record_round(&self, report: &RoundReport) {
        self.rounds.fetch_add(1, Ordering::Relaxed);
        self.events_published
            .fetch_add(report.events as u64, Ordering::Relaxed);
        self.containers_skipped
            .fetch_add(report.skipped() as u64, Ordering::Relaxed);
        if report.list_failed {
            self.list_failures.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn totals(&self) -> SchedulerTotals {
        SchedulerTotals {
            rounds: self.rounds.load(Ordering::Relaxed),
            events_published: self.events_published.load(Ordering::Relaxed),
            containers_skipped: self.containers_skipped.load(Ordering::Relaxed),
            list_failures: self.list_failures.load(Ordering::Relaxed),
            overruns: self.overruns.load(Ordering::Relaxed),
        }
    }
}

/// Number of whole periods a round of `elapsed` spilled over; 0 when it fit.
pub fn missed_ticks(elapsed: Duration, period: Duration) -> u64 {
    if period.is_zero() || elapsed <= period {
        0
    } else {
        (elapsed.as_nanos() / period.as_nanos()) as u64
    }
}

pub struct SchedulerHandle {
    stop_tx: Option<oneshot::Sender<()>>,
    state_rx: watch::Receiver<SchedulerState>,
    stats: Arc<SchedulerStats>,
    join: JoinHandle<()>,
}

impl SchedulerHandle {
    pub fn state(&self) -> SchedulerState {
        *self.state_rx.borrow()
    }

    /// Watch for state transitions.
    pub fn subscribe(&self) -> watch::Receiver<SchedulerState> {
        self.state_rx.clone()
    }

    pub fn stats(&self) -> SchedulerTotals {
        self.stats.totals()
    }

    /// Signals the loop to exit after the current round. Idempotent.
    pub fn stop(&mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
    }

    /// Waits for the loop to exit. Call [`stop`](Self::stop) first or this waits forever.
    pub async fn join(self) -> Result<(), tokio::task::JoinError> {
        self.join.await
    }

    /// `stop` then `join`.
    pub async fn shutdown(mut self) -> Result<(), tokio::task::JoinError> {
        self.stop();
        self.join().await
    }
}

pub fn spawn(collector: StatsCollector, config: SchedulerConfig) -> SchedulerHandle {
    let (stop_tx, stop_rx) = oneshot::channel();
    let (state_tx, state_rx) = watch::channel(SchedulerState::Idle);
    let stats = Arc::new(SchedulerStats::default());

    let span = tracing::span!(
        tracing::Level::DEBUG,
        "scheduler",
        period_ms = config.period.as_millis() as u64
    );
    let join = tokio::spawn(run(collector, config, stop_rx, state_tx, stats.clone()).instrument(span));

    SchedulerHandle {
        stop_tx: Some(stop_tx),
        state_rx,
        stats,
        join,
    }
}

async fn run(
    collector: StatsCollector,
    config: SchedulerConfig,
    mut stop_rx: oneshot::Receiver<()>,
    state_tx: watch::Sender<SchedulerState>,
    stats: Arc<SchedulerStats>,
) {
    let SchedulerConfig {
        period,
        stats_log_interval,
    } = config;

    let mut tick = interval(period);
    tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
    // An interval too long to add to `now` means the stats line is never due.
    let stats_log_interval = stats_log_interval.min(MAX_STATS_LOG_INTERVAL);
    let mut stats_log_tick = interval_at(Instant::now() + stats_log_interval, stats_log_interval);
    stats_log_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

    state_tx.send_replace(SchedulerState::Ticking);

    loop {
        tokio::select! {
            biased;
            // A dropped handle stops the loop as well.
            _ = &mut stop_rx => {
                tracing::debug!("Scheduler stopping");
                break;
            }
            _ = tick.tick() => {}
            _ = stats_log_tick.tick() => {
                let totals = stats.totals();
                tracing::info!(
                    rounds = totals.rounds,
                    events_published = totals.events_published,
                    containers_skipped = totals.containers_skipped,
                    list_failures = totals.list_failures,
                    overruns = totals.overruns,
                    counters_tracked = collector.builder().store().len(),
                    "app stats"
                );
                continue;
            }
        }

        state_tx.send_replace(SchedulerState::Collecting);
        let started = Instant::now();
        let report = collector.run_round().await;
        let elapsed = started.elapsed();
        stats.record_round(&report);
        tracing::debug!(
            listed = report.listed,
            published = report.published,
            skipped = report.skipped(),
            evicted = report.evicted,
            elapsed_ms = elapsed.as_millis() as u64,
            "Round complete"
        );

        let missed = missed_ticks(elapsed, period);
        if missed > 0 {
            stats.overruns.fetch_add(missed, Ordering::Relaxed);
            tracing::warn!(
                elapsed_ms = elapsed.as_millis() as u64,
                skipped_ticks = missed,
                "Ignoring tick(s) due to processing taking longer than one period"
            );
            // Drop the overdue tick; next round starts one full period from now.
            tick.reset();
        }
        state_tx.send_replace(SchedulerState::Ticking);
    }

    state_tx.send_replace(SchedulerState::Stopped);
}
