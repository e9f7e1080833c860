//! # error
//!
//! Centralised error types.
//!
//! Only [`ConfigError`] is ever fatal (startup). [`ProviderError`] is contained
//! per instrument and per series leg by the snapshot fetcher, so one bad symbol
//! never aborts a tick.

use std::path::PathBuf;

use thiserror::Error;

// ─── Market Data Provider ─────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ProviderError {
    /// Network failure or timeout talking to the provider.
    #[error("provider unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    /// Provider answered with a non-2xx status.
    #[error("provider returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// Response body was not the expected shape.
    #[error("malformed provider response: {0}")]
    Decode(String),

    /// Provider reported an error object (e.g. unknown symbol).
    #[error("provider error {code}: {description}")]
    Upstream { code: String, description: String },

    /// Configured base URL cannot carry a chart path.
    #[error("invalid provider URL: {0}")]
    InvalidUrl(String),

    /// Provider answered successfully but without any result.
    #[error("provider returned no data for {0}")]
    NoData(String),
}

// ─── Configuration ────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("DISCORD_WEBHOOK_URL not set (env or .env)")]
    MissingWebhook,

    #[error("could not read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("{field}: expected HH:MM, got '{value}'")]
    InvalidTime { field: &'static str, value: String },

    #[error("unknown timezone '{0}'")]
    InvalidTimezone(String),

    #[error("{field} must be greater than zero")]
    InvalidInterval { field: &'static str },

    #[error("{field} must be between 1 and {max}, got {value}")]
    OutOfRange { field: &'static str, value: usize, max: usize },

    #[error("market_open ({open}) must be before market_close ({close})")]
    InvalidHours { open: String, close: String },

    #[error("unknown log level '{0}'")]
    InvalidLogLevel(String),

    #[error("no tickers configured")]
    NoTickers,
}
