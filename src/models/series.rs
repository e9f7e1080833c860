//! # models::series
//!
//! [`PriceSeries`] — an ordered run of `(timestamp, close)` points as returned
//! by the market-data provider for one symbol / range / sampling interval.

use chrono::{DateTime, Utc};

/// A single close observation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricePoint {
    pub time:  DateTime<Utc>,
    pub close: f64,
}

/// Ascending by timestamp, no duplicate timestamps, finite closes only.
///
/// The only way to build one is [`PriceSeries::new`], which enforces that.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceSeries {
    points: Vec<PricePoint>,
}

impl PriceSeries {
    /// Normalise raw provider points: drop non-finite closes, sort by time and
    /// keep the last value seen for any repeated timestamp.
    pub fn new(mut points: Vec<PricePoint>) -> Self {
        points.retain(|p| p.close.is_finite());
        // stable sort: later duplicates stay after earlier ones
        points.sort_by_key(|p| p.time);

        let mut deduped: Vec<PricePoint> = Vec::with_capacity(points.len());
        for p in points {
            match deduped.last_mut() {
                Some(last) if last.time == p.time => *last = p,
                _ => deduped.push(p),
            }
        }

        Self { points: deduped }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Close prices in time order — what the indicator functions consume.
    pub fn closes(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.close).collect()
    }

    /// First `n` points, for diagnostic previews.
    pub fn head(&self, n: usize) -> &[PricePoint] {
        &self.points[..n.min(self.points.len())]
    }
}
