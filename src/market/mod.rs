//! # market — Market Data Provider
//!
//! The fetcher only sees the [`MarketDataProvider`] trait; production wires in
//! [`yahoo::YahooProvider`], tests wire in canned series.

use async_trait::async_trait;

use crate::error::ProviderError;
use crate::models::PriceSeries;

pub mod yahoo;

pub use yahoo::YahooProvider;

/// Which slice of history to ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeriesRequest {
    /// Lookback range, provider notation (`"1d"`, `"7d"`).
    pub range:    &'static str,
    /// Sampling granularity, provider notation (`"1m"`, `"15m"`).
    pub interval: &'static str,
}

impl SeriesRequest {
    /// Today at 1-minute resolution.
    pub const INTRADAY: Self = Self { range: "1d", interval: "1m" };
    /// One week at 15-minute resolution.
    pub const TREND: Self = Self { range: "7d", interval: "15m" };
}

#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    async fn fetch_series(
        &self,
        symbol: &str,
        request: SeriesRequest,
    ) -> Result<PriceSeries, ProviderError>;
}
