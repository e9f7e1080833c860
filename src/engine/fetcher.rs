//! # engine::fetcher
//!
//! Builds one [`Snapshot`] per symbol from two provider calls:
//!
//! ```text
//! INTRADAY (1d @ 1m)  ─► last price, Δ%
//! TREND    (7d @ 15m) ─► oscillator
//! ```
//!
//! A failing leg leaves its fields unavailable and is reported as a tagged
//! [`FetchFailure`]; it never stops the other leg or the other symbols.

use tracing::{error, info, warn};

use crate::engine::indicators::{change_pct, compute_oscillator, last_price};
use crate::market::{MarketDataProvider, SeriesRequest};
use crate::models::{FetchFailure, PriceSeries, SeriesLeg, Snapshot, SnapshotOutcome};

/// Fetch both legs for `symbol` and derive its snapshot.
pub async fn fetch_snapshot(
    provider: &dyn MarketDataProvider,
    symbol: &str,
    preview_rows: usize,
    rsi_period: usize,
) -> SnapshotOutcome {
    let mut snapshot = Snapshot::empty(symbol);
    let mut failures = Vec::new();

    // ── 1. Intraday leg ──────────────────────────────────────────────────────
    info!(%symbol, range = "1d", interval = "1m", "[API] fetching intraday series");
    match provider.fetch_series(symbol, SeriesRequest::INTRADAY).await {
        Ok(series) => {
            preview_series(&series, &format!("{symbol} 1m (today)"), preview_rows);
            let closes = series.closes();
            snapshot.last_price = last_price(&closes);
            snapshot.change_pct = change_pct(&closes);
        }
        Err(e) => {
            error!(%symbol, leg = %SeriesLeg::Intraday, error = %e, "fetch error");
            failures.push(FetchFailure { leg: SeriesLeg::Intraday, error: e });
        }
    }

    // ── 2. Trend leg ─────────────────────────────────────────────────────────
    info!(%symbol, range = "7d", interval = "15m", "[API] fetching trend series for RSI");
    match provider.fetch_series(symbol, SeriesRequest::TREND).await {
        Ok(series) => {
            preview_series(&series, &format!("{symbol} 15m (7d)"), preview_rows);
            snapshot.indicator = compute_oscillator(&series.closes(), rsi_period);
        }
        Err(e) => {
            error!(%symbol, leg = %SeriesLeg::Trend, error = %e, "fetch error");
            failures.push(FetchFailure { leg: SeriesLeg::Trend, error: e });
        }
    }

    info!(
        %symbol,
        last    = ?snapshot.last_price,
        chg_pct = ?snapshot.change_pct,
        rsi     = ?snapshot.indicator,
        "summary"
    );

    SnapshotOutcome { snapshot, failures }
}

/// Diagnostic dump of the first rows of a series. Logging only.
///
/// Rows go out at INFO so `log.sample_rows` is visible at the default level;
/// set it to 0 to silence them.
fn preview_series(series: &PriceSeries, name: &str, rows: usize) {
    if series.is_empty() {
        warn!("{name}: empty series");
        return;
    }

    let lines = preview_lines(series, rows);
    info!("{name}: rows={}; preview top {}:", series.len(), lines.len());
    for line in &lines {
        info!("  {line}");
    }
}

/// `"<timestamp>  close=<price>"` for each of the first `rows` points.
fn preview_lines(series: &PriceSeries, rows: usize) -> Vec<String> {
    series
        .head(rows)
        .iter()
        .map(|p| format!("{}  close={:.4}", p.time.format("%Y-%m-%d %H:%M:%S"), p.close))
        .collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::HashMap;

    use async_trait::async_trait;
    use chrono::{Duration, TimeZone, Utc};

    use super::*;
    use crate::error::ProviderError;
    use crate::models::PricePoint;

    /// Canned provider: per-symbol closes for each leg, or a failure.
    #[derive(Default)]
    pub(crate) struct StubProvider {
        pub intraday: HashMap<String, Vec<f64>>,
        pub trend:    HashMap<String, Vec<f64>>,
        /// Symbols whose every request fails.
        pub broken:   Vec<String>,
    }

    pub(crate) fn series_of(closes: &[f64]) -> PriceSeries {
        let base = Utc.with_ymd_and_hms(2024, 3, 8, 14, 30, 0).unwrap();
        PriceSeries::new(
            closes
                .iter()
                .enumerate()
                .map(|(i, &close)| PricePoint { time: base + Duration::minutes(i as i64), close })
                .collect(),
        )
    }

    #[async_trait]
    impl MarketDataProvider for StubProvider {
        async fn fetch_series(
            &self,
            symbol: &str,
            request: SeriesRequest,
        ) -> Result<PriceSeries, ProviderError> {
            if self.broken.iter().any(|s| s == symbol) {
                return Err(ProviderError::Decode("stubbed outage".into()));
            }
            let table = if request == SeriesRequest::INTRADAY { &self.intraday } else { &self.trend };
            Ok(table.get(symbol).map(|c| series_of(c)).unwrap_or_default())
        }
    }

    fn rising(n: usize) -> Vec<f64> {
        (0..n).map(|i| 100.0 + i as f64).collect()
    }

    #[tokio::test]
    async fn test_complete_snapshot() {
        let mut provider = StubProvider::default();
        provider.intraday.insert("SPY".into(), vec![100.0, 105.0]);
        provider.trend.insert("SPY".into(), rising(20));

        let outcome = fetch_snapshot(&provider, "SPY", 3, 14).await;

        assert!(outcome.is_complete());
        assert_eq!(outcome.snapshot.last_price, Some(105.0));
        assert_eq!(outcome.snapshot.change_pct, Some(5.0));
        assert_eq!(outcome.snapshot.indicator, Some(100.0));
    }

    #[tokio::test]
    async fn test_short_data_is_unavailable_not_failure() {
        let mut provider = StubProvider::default();
        provider.intraday.insert("QQQ".into(), vec![400.0]);
        provider.trend.insert("QQQ".into(), rising(14));

        let outcome = fetch_snapshot(&provider, "QQQ", 3, 14).await;

        assert!(outcome.is_complete());
        assert_eq!(outcome.snapshot.last_price, Some(400.0));
        assert_eq!(outcome.snapshot.change_pct, None);
        assert_eq!(outcome.snapshot.indicator, None);
    }

    #[tokio::test]
    async fn test_empty_series_leaves_everything_unavailable() {
        let provider = StubProvider::default();
        let outcome = fetch_snapshot(&provider, "DIA", 3, 14).await;
        assert!(outcome.is_complete());
        assert_eq!(outcome.snapshot, Snapshot::empty("DIA"));
    }

    #[test]
    fn test_preview_lines_show_first_rows() {
        let series = series_of(&[101.5, 102.25, 103.0, 104.0]);

        assert_eq!(
            preview_lines(&series, 2),
            vec![
                "2024-03-08 14:30:00  close=101.5000".to_string(),
                "2024-03-08 14:31:00  close=102.2500".to_string(),
            ]
        );
        assert_eq!(preview_lines(&series, 10).len(), 4);
        assert!(preview_lines(&series, 0).is_empty());
    }

    #[tokio::test]
    async fn test_provider_failure_is_tagged_per_leg() {
        let provider = StubProvider { broken: vec!["BAD".into()], ..Default::default() };

        let (snapshot, failures) = fetch_snapshot(&provider, "BAD", 3, 14).await.into_parts();

        assert_eq!(snapshot, Snapshot::empty("BAD"));
        let legs: Vec<SeriesLeg> = failures.iter().map(|f| f.leg).collect();
        assert_eq!(legs, vec![SeriesLeg::Intraday, SeriesLeg::Trend]);
    }
}
