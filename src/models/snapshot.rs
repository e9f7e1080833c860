//! # models::snapshot
//!
//! [`Snapshot`] is the per-instrument result of one tick. [`SnapshotOutcome`]
//! wraps it together with any tagged fetch failures, so callers can tell a
//! genuinely quiet market (`None` from short data) from a provider outage.

use std::fmt;

use crate::error::ProviderError;

/// Derived values for one symbol. `None` = unavailable, never a stand-in zero.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub symbol:     String,
    pub last_price: Option<f64>,
    pub change_pct: Option<f64>,
    /// RSI-style oscillator over the trend leg.
    pub indicator:  Option<f64>,
}

impl Snapshot {
    /// All fields unavailable.
    pub fn empty(symbol: &str) -> Self {
        Self {
            symbol:     symbol.to_string(),
            last_price: None,
            change_pct: None,
            indicator:  None,
        }
    }
}

// ─── Failure Tagging ──────────────────────────────────────────────────────────

/// Which of the two per-instrument series a failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesLeg {
    /// 1 day @ 1 minute — last price / change %.
    Intraday,
    /// 7 days @ 15 minutes — oscillator.
    Trend,
}

impl fmt::Display for SeriesLeg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeriesLeg::Intraday => write!(f, "intraday"),
            SeriesLeg::Trend    => write!(f, "trend"),
        }
    }
}

#[derive(Debug)]
pub struct FetchFailure {
    pub leg:   SeriesLeg,
    pub error: ProviderError,
}

/// Snapshot plus the reasons any of its fields are missing due to errors.
#[derive(Debug)]
pub struct SnapshotOutcome {
    pub snapshot: Snapshot,
    pub failures: Vec<FetchFailure>,
}

impl SnapshotOutcome {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn into_parts(self) -> (Snapshot, Vec<FetchFailure>) {
        (self.snapshot, self.failures)
    }
}
