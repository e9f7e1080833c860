//! # market::yahoo — Yahoo Finance chart API
//!
//! `GET {base}/v8/finance/chart/{symbol}?range=1d&interval=1m`
//!
//! ```json
//! { "chart": { "result": [ { "timestamp": [..],
//!                            "indicators": { "quote": [ { "close": [.., null, ..] } ] } } ],
//!              "error": null } }
//! ```
//!
//! Null closes (halted minutes, pre-market gaps) are skipped. The symbol is
//! always sent as a single percent-encoded path segment.

use std::time::Duration;

use async_trait::async_trait;
use chrono::DateTime;
use reqwest::Url;
use serde::Deserialize;
use tracing::debug;

use super::{MarketDataProvider, SeriesRequest};
use crate::error::ProviderError;
use crate::models::{PricePoint, PriceSeries};

pub const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

// ─── Response Shape ───────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
    error:  Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code:        String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    timestamp:  Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<Quote>,
}

#[derive(Debug, Deserialize)]
struct Quote {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

// ─── Provider ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct YahooProvider {
    client:   reqwest::Client,
    base_url: String,
}

impl YahooProvider {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// `{base}/v8/finance/chart/{symbol}`; `/` or `?` in a symbol stay inside its segment.
    fn chart_url(&self, symbol: &str) -> Result<Url, ProviderError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| ProviderError::InvalidUrl(format!("{}: {e}", self.base_url)))?;
        url.path_segments_mut()
            .map_err(|_| ProviderError::InvalidUrl(self.base_url.clone()))?
            .pop_if_empty()
            .extend(["v8", "finance", "chart", symbol]);
        Ok(url)
    }
}

#[async_trait]
impl MarketDataProvider for YahooProvider {
    async fn fetch_series(
        &self,
        symbol: &str,
        request: SeriesRequest,
    ) -> Result<PriceSeries, ProviderError> {
        let url = self.chart_url(symbol)?;

        debug!(%symbol, range = request.range, interval = request.interval, "GET chart");

        let resp = self
            .client
            .get(url)
            .query(&[("range", request.range), ("interval", request.interval)])
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;

        if !status.is_success() {
            // Unknown symbols come back as 404 with a chart.error object.
            if let Ok(ChartEnvelope { chart: Chart { error: Some(e), .. } }) =
                serde_json::from_str::<ChartEnvelope>(&body)
            {
                return Err(ProviderError::Upstream { code: e.code, description: e.description });
            }
            return Err(ProviderError::Status { status: status.as_u16(), body });
        }

        parse_chart(symbol, &body)
    }
}

/// Decode a chart response body into a [`PriceSeries`].
pub fn parse_chart(symbol: &str, body: &str) -> Result<PriceSeries, ProviderError> {
    let envelope: ChartEnvelope =
        serde_json::from_str(body).map_err(|e| ProviderError::Decode(e.to_string()))?;

    if let Some(e) = envelope.chart.error {
        return Err(ProviderError::Upstream { code: e.code, description: e.description });
    }

    let result = envelope
        .chart
        .result
        .and_then(|r| r.into_iter().next())
        .ok_or_else(|| ProviderError::NoData(symbol.to_string()))?;

    let closes = result
        .indicators
        .quote
        .into_iter()
        .next()
        .map(|q| q.close)
        .unwrap_or_default();

    if closes.len() != result.timestamp.len() {
        return Err(ProviderError::Decode(format!(
            "{} timestamps vs {} closes",
            result.timestamp.len(),
            closes.len()
        )));
    }

    let points = result
        .timestamp
        .into_iter()
        .zip(closes)
        .filter_map(|(ts, close)| {
            let time = DateTime::from_timestamp(ts, 0)?;
            Some(PricePoint { time, close: close? })
        })
        .collect();

    Ok(PriceSeries::new(points))
}

#[cfg(test)]
mod tests {
    use super::*;

    const OK_BODY: &str = r#"{"chart":{"result":[{"meta":{"symbol":"SPY"},
        "timestamp":[1709906400,1709906460,1709906520],
        "indicators":{"quote":[{"close":[510.5,null,511.25]}]}}],"error":null}}"#;

    #[test]
    fn test_parse_skips_null_closes() {
        let series = parse_chart("SPY", OK_BODY).unwrap();
        assert_eq!(series.closes(), vec![510.5, 511.25]);
    }

    #[test]
    fn test_parse_error_object() {
        let body = r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#;
        let err = parse_chart("NOPE", body).unwrap_err();
        assert!(matches!(err, ProviderError::Upstream { ref code, .. } if code == "Not Found"));
    }

    #[test]
    fn test_parse_garbage() {
        assert!(matches!(parse_chart("SPY", "<html>"), Err(ProviderError::Decode(_))));
    }

    #[test]
    fn test_parse_empty_result() {
        let body = r#"{"chart":{"result":[],"error":null}}"#;
        assert!(matches!(parse_chart("SPY", body), Err(ProviderError::NoData(_))));
    }

    #[test]
    fn test_chart_url_keeps_symbol_in_one_segment() {
        let provider = YahooProvider::new(reqwest::Client::new(), "https://quotes.example/proxy/");

        assert_eq!(
            provider.chart_url("SPY").unwrap().as_str(),
            "https://quotes.example/proxy/v8/finance/chart/SPY"
        );
        assert_eq!(
            provider.chart_url("BRK/B").unwrap().path(),
            "/proxy/v8/finance/chart/BRK%2FB"
        );
        assert_eq!(
            provider.chart_url("X?range=max").unwrap().path(),
            "/proxy/v8/finance/chart/X%3Frange=max"
        );
    }

    #[tokio::test]
    async fn test_unusable_base_url_is_a_provider_error() {
        let provider = YahooProvider::new(reqwest::Client::new(), "not a url");
        let err = provider.fetch_series("SPY", SeriesRequest::INTRADAY).await.unwrap_err();
        assert!(matches!(err, ProviderError::InvalidUrl(_)));
    }

    #[tokio::test]
    async fn test_fetch_series_against_mock_server() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/v8/finance/chart/SPY")
            .match_query(mockito::Matcher::AllOf(vec![
                mockito::Matcher::UrlEncoded("range".into(), "1d".into()),
                mockito::Matcher::UrlEncoded("interval".into(), "1m".into()),
            ]))
            .with_status(200)
            .with_body(OK_BODY)
            .create_async()
            .await;

        let provider = YahooProvider::new(reqwest::Client::new(), server.url());
        let series = provider.fetch_series("SPY", SeriesRequest::INTRADAY).await.unwrap();

        assert_eq!(series.len(), 2);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_series_http_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", mockito::Matcher::Any)
            .with_status(503)
            .with_body("busy")
            .create_async()
            .await;

        let provider = YahooProvider::new(reqwest::Client::new(), server.url());
        let err = provider.fetch_series("SPY", SeriesRequest::TREND).await.unwrap_err();

        assert!(matches!(err, ProviderError::Status { status: 503, .. }));
    }
}
