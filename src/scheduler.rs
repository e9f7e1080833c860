//! # scheduler — Market-hours control loop
//!
//! ```text
//!            ┌──────────────────── now ∈ [open, close] ────────────────────┐
//!            ▼                                                             │
//!  MarketOpenActive ── run tick ── wait early/later interval ──────────────┤
//!                                                                          │
//!  MarketClosedWaiting ── wait until next open (Sat/Sun skipped) ──────────┘
//! ```
//!
//! Every wait is one timer raced against the shutdown signal, so the loop can
//! be stopped between ticks and driven by simulated time in tests.
//!
//! Known limitation: there is no holiday calendar, and the active phase is
//! decided by time-of-day alone (a Saturday at 10:00 counts as open).

use std::time::Duration;

use chrono::{DateTime, Datelike, Days, LocalResult, NaiveDateTime, NaiveTime, TimeZone, Utc, Weekday};
use chrono_tz::Tz;
use tokio::sync::watch;
use tracing::info;

use crate::engine::pipeline::Pipeline;

// ─── Schedule State ───────────────────────────────────────────────────────────

/// Trading session in the exchange's own timezone.
#[derive(Debug, Clone, PartialEq)]
pub struct MarketHours {
    pub timezone: Tz,
    pub open:     NaiveTime,
    pub close:    NaiveTime,
}

/// Polling cadence, all values in minutes.
#[derive(Debug, Clone, PartialEq)]
pub struct PollingPlan {
    /// Cadence while still inside the early window.
    pub early_interval: u32,
    /// How long after the open the early cadence applies.
    pub early_window:   u32,
    /// Cadence for the rest of the session.
    pub later_interval: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleState {
    pub hours: MarketHours,
    pub plan:  PollingPlan,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarketPhase {
    MarketOpenActive,
    MarketClosedWaiting,
}

/// What the loop should do on this iteration.
#[derive(Debug, Clone, PartialEq)]
pub enum TickDecision {
    /// Run the pipeline now, then wait `interval`.
    Run { interval: Duration, minutes_since_open: f64 },
    /// Market closed: wait until `next_open`.
    WaitUntil { next_open: DateTime<Tz> },
}

impl ScheduleState {
    /// Both endpoints belong to the open session.
    pub fn phase(&self, now: &DateTime<Tz>) -> MarketPhase {
        let t = now.time();
        if self.hours.open <= t && t <= self.hours.close {
            MarketPhase::MarketOpenActive
        } else {
            MarketPhase::MarketClosedWaiting
        }
    }

    /// Fractional minutes between today's open and `now` (negative before it).
    pub fn minutes_since_open(&self, now: &DateTime<Tz>) -> f64 {
        let delta = now.time() - self.hours.open;
        delta.num_milliseconds() as f64 / 60_000.0
    }

    /// Early cadence up to and including the end of the early window.
    pub fn interval_for(&self, minutes_since_open: f64) -> Duration {
        let minutes = if minutes_since_open <= f64::from(self.plan.early_window) {
            self.plan.early_interval
        } else {
            self.plan.later_interval
        };
        Duration::from_secs(u64::from(minutes) * 60)
    }

    /// Next session open strictly relevant to a closed-market `now`:
    /// today's open if we're before it, otherwise the next weekday's.
    pub fn next_open(&self, now: &DateTime<Tz>) -> DateTime<Tz> {
        let today = now.date_naive();

        let day = if now.time() > self.hours.close {
            let mut day = today + Days::new(1);
            while matches!(day.weekday(), Weekday::Sat | Weekday::Sun) {
                day = day + Days::new(1);
            }
            day
        } else {
            today
        };

        localize(&self.hours.timezone, day.and_time(self.hours.open))
    }

    /// Decide the action for wall-clock instant `now`.
    pub fn decide(&self, now: DateTime<Utc>) -> TickDecision {
        let local = now.with_timezone(&self.hours.timezone);

        match self.phase(&local) {
            MarketPhase::MarketOpenActive => {
                let minutes_since_open = self.minutes_since_open(&local);
                TickDecision::Run {
                    interval: self.interval_for(minutes_since_open),
                    minutes_since_open,
                }
            }
            MarketPhase::MarketClosedWaiting => TickDecision::WaitUntil {
                next_open: self.next_open(&local),
            },
        }
    }
}

/// Local wall time → instant. Ambiguous (DST fall-back) picks the earlier
/// instant; nonexistent (DST spring-forward gap) moves forward until valid.
fn localize(tz: &Tz, mut naive: NaiveDateTime) -> DateTime<Tz> {
    loop {
        match tz.from_local_datetime(&naive) {
            LocalResult::Single(t) => return t,
            LocalResult::Ambiguous(earliest, _) => return earliest,
            LocalResult::None => naive += chrono::Duration::minutes(30),
        }
    }
}

// ─── Clock & Shutdown ─────────────────────────────────────────────────────────

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Receiving half of the stop signal. Send `true` on the paired
/// `watch::Sender` to stop the loop at its next wait.
#[derive(Debug, Clone)]
pub struct Shutdown(watch::Receiver<bool>);

impl Shutdown {
    pub fn channel() -> (watch::Sender<bool>, Self) {
        let (tx, rx) = watch::channel(false);
        (tx, Self(rx))
    }

    /// Resolves once shutdown is requested. A dropped sender never resolves.
    pub async fn requested(&mut self) {
        loop {
            if *self.0.borrow_and_update() {
                return;
            }
            if self.0.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}

// ─── Control Loop ─────────────────────────────────────────────────────────────

const MIN_WAIT: Duration = Duration::from_secs(1);

pub struct MarketScheduler<C: Clock> {
    schedule: ScheduleState,
    pipeline: Pipeline,
    clock:    C,
}

impl<C: Clock> MarketScheduler<C> {
    pub fn new(schedule: ScheduleState, pipeline: Pipeline, clock: C) -> Self {
        Self { schedule, pipeline, clock }
    }

    /// Run until `shutdown` fires. Exactly one pipeline run per active tick,
    /// none while closed.
    pub async fn run(&self, mut shutdown: Shutdown) {
        let tz = self.schedule.hours.timezone;

        loop {
            let now = self.clock.now();
            let local = now.with_timezone(&tz);

            let wait = match self.schedule.decide(now) {
                TickDecision::Run { interval, minutes_since_open } => {
                    info!(
                        at         = %local.format("%Y-%m-%d %H:%M %Z"),
                        mins_open  = minutes_since_open as i64,
                        next_in    = interval.as_secs() / 60,
                        "[SCHED] Tick"
                    );
                    let report = self.pipeline.run_once(local).await;
                    info!(
                        tick_id   = %report.tick_id,
                        rows      = report.snapshots.len(),
                        chars     = report.message.len(),
                        failures  = report.failures.len(),
                        delivered = report.delivered,
                        "[SCHED] Tick complete"
                    );
                    interval
                }
                TickDecision::WaitUntil { next_open } => {
                    info!(next_open = %next_open.format("%Y-%m-%d %H:%M %Z"), "[SCHED] Market closed");
                    let wait = (next_open - local).to_std().unwrap_or_default().max(MIN_WAIT);
                    info!("[SCHED] Sleeping ~{} min.", wait.as_secs() / 60);
                    wait
                }
            };

            tokio::select! {
                _ = tokio::time::sleep(wait) => {}
                _ = shutdown.requested() => {
                    info!("[SCHED] Shutdown requested — leaving loop");
                    return;
                }
            }
        }
    }
}
