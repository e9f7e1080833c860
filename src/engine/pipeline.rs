//! # engine::pipeline
//!
//! One tick of work: fetch every symbol → render → deliver once.
//!
//! Symbols are fetched as concurrent futures on the calling task;
//! `join_all` hands results back in configured order, so the message rows
//! always follow the config.

use std::sync::Arc;

use chrono::DateTime;
use chrono_tz::Tz;
use futures_util::future::join_all;
use tracing::{error, info_span, warn, Instrument};
use uuid::Uuid;

use crate::engine::fetcher::fetch_snapshot;
use crate::format::build_message;
use crate::market::MarketDataProvider;
use crate::models::{FetchFailure, Snapshot};
use crate::notifier::Notifier;

#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub tickers:     Vec<String>,
    pub sample_rows: usize,
    pub rsi_period:  usize,
}

/// Everything a tick produced, for logging and tests.
#[derive(Debug)]
pub struct TickReport {
    pub tick_id:   Uuid,
    pub snapshots: Vec<Snapshot>,
    /// `(symbol, failure)` for every leg that errored.
    pub failures:  Vec<(String, FetchFailure)>,
    pub message:   String,
    pub delivered: bool,
}

pub struct Pipeline {
    provider: Arc<dyn MarketDataProvider>,
    notifier: Arc<dyn Notifier>,
    settings: PipelineSettings,
}

impl Pipeline {
    pub fn new(
        provider: Arc<dyn MarketDataProvider>,
        notifier: Arc<dyn Notifier>,
        settings: PipelineSettings,
    ) -> Self {
        Self { provider, notifier, settings }
    }

    /// Run one tick. Never fails: provider and delivery errors end up in the
    /// report and the logs.
    pub async fn run_once(&self, generated_at: DateTime<Tz>) -> TickReport {
        let tick_id = Uuid::new_v4();
        let span = info_span!("tick", %tick_id);

        async move {
            let PipelineSettings { tickers, sample_rows, rsi_period } = &self.settings;

            // ── 1. Fetch (order preserved) ───────────────────────────────────
            let outcomes = join_all(
                tickers
                    .iter()
                    .map(|t| fetch_snapshot(self.provider.as_ref(), t, *sample_rows, *rsi_period)),
            )
            .await;

            let incomplete = outcomes.iter().filter(|o| !o.is_complete()).count();

            let mut snapshots = Vec::with_capacity(outcomes.len());
            let mut failures = Vec::new();
            for outcome in outcomes {
                let (snapshot, leg_failures) = outcome.into_parts();
                failures.extend(leg_failures.into_iter().map(|f| (snapshot.symbol.clone(), f)));
                snapshots.push(snapshot);
            }

            if incomplete > 0 {
                let detail: Vec<String> = failures
                    .iter()
                    .map(|(symbol, f)| format!("{symbol}/{}: {}", f.leg, f.error))
                    .collect();
                warn!(incomplete, symbols = tickers.len(), failures = ?detail, "Some snapshots are partial");
            }

            // ── 2. Render ────────────────────────────────────────────────────
            let message = build_message(&snapshots, &generated_at, *rsi_period);

            // ── 3. Deliver (single attempt) ──────────────────────────────────
            let delivered = self.notifier.deliver(&message).await;
            if !delivered {
                error!("Failed to post snapshot.");
            }

            TickReport { tick_id, snapshots, failures, message, delivered }
        }
        .instrument(span)
        .await
    }
}
