//! # config — `config.yaml` + environment → one validated [`Config`]
//!
//! Precedence: environment (`DISCORD_WEBHOOK_URL`, `TICKERS`) over the file,
//! file over built-in defaults. Each field is validated on its own; anything
//! invalid is rejected at startup rather than silently defaulted.
//!
//! | Variable              | Default         | Description                         |
//! |-----------------------|-----------------|-------------------------------------|
//! | `DISCORD_WEBHOOK_URL` | —  (required)   | Webhook that receives each snapshot |
//! | `TICKERS`             | file / SPY,QQQ,DIA | Comma list, overrides the file   |
//! | `MARKET_PULSE_CONFIG` | `config.yaml`   | Path of the YAML config file        |
//! | `RUST_LOG`            | `log.level`     | Tracing filter                      |

use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::NaiveTime;
use chrono_tz::Tz;
use serde::Deserialize;
use tracing::Level;

use crate::engine::indicators::DEFAULT_RSI_PERIOD;
use crate::error::ConfigError;
use crate::market::yahoo::DEFAULT_BASE_URL;
use crate::scheduler::{MarketHours, PollingPlan, ScheduleState};

pub const CONFIG_PATH_ENV: &str = "MARKET_PULSE_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "config.yaml";

/// Largest accepted lookback. A trend leg carries a few hundred points, so
/// anything beyond this could never produce a value.
pub const MAX_RSI_PERIOD: usize = 500;

// ─── File Schema ──────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub market:     MarketSection,
    pub indicators: IndicatorSection,
    pub provider:   ProviderSection,
    pub log:        LogSection,
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MarketSection {
    pub tickers:         Vec<String>,
    pub market_open:     String,
    pub market_close:    String,
    pub timezone:        String,
    pub update_schedule: ScheduleSection,
}

impl Default for MarketSection {
    fn default() -> Self {
        Self {
            tickers:         vec!["SPY".into(), "QQQ".into(), "DIA".into()],
            market_open:     "09:30".into(),
            market_close:    "16:00".into(),
            timezone:        "America/New_York".into(),
            update_schedule: ScheduleSection::default(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScheduleSection {
    pub early_interval_minutes: u32,
    pub early_duration_minutes: u32,
    pub later_interval_minutes: u32,
}

impl Default for ScheduleSection {
    fn default() -> Self {
        Self {
            early_interval_minutes: 30,
            early_duration_minutes: 150,
            later_interval_minutes: 60,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IndicatorSection {
    pub rsi_period: usize,
}

impl Default for IndicatorSection {
    fn default() -> Self {
        Self { rsi_period: DEFAULT_RSI_PERIOD }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProviderSection {
    pub base_url: String,
}

impl Default for ProviderSection {
    fn default() -> Self {
        Self { base_url: DEFAULT_BASE_URL.into() }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LogSection {
    pub level:       String,
    pub sample_rows: usize,
}

impl Default for LogSection {
    fn default() -> Self {
        Self { level: "INFO".into(), sample_rows: 3 }
    }
}

impl FileConfig {
    /// Parse `path`. `None` when the file does not exist.
    pub fn read(path: &Path) -> Result<Option<Self>, ConfigError> {
        if !path.exists() {
            return Ok(None);
        }

        let text = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;

        Self::parse(&text)
            .map(Some)
            .map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })
    }

    pub fn parse(text: &str) -> Result<Self, serde_yaml::Error> {
        // An empty file deserialises as null
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text)
    }
}

// ─── Environment Overlay ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct EnvOverrides {
    pub webhook_url: Option<String>,
    pub tickers:     Option<String>,
}

impl EnvOverrides {
    pub fn from_env() -> Self {
        let non_empty = |key: &str| std::env::var(key).ok().filter(|v| !v.trim().is_empty());
        Self {
            webhook_url: non_empty("DISCORD_WEBHOOK_URL"),
            tickers:     non_empty("TICKERS"),
        }
    }
}

// ─── Validated Config ─────────────────────────────────────────────────────────

/// Immutable after startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub tickers:           Vec<String>,
    pub webhook_url:       String,
    pub schedule:          ScheduleState,
    pub rsi_period:        usize,
    pub sample_rows:       usize,
    pub log_level:         Level,
    pub provider_base_url: String,
    /// File the settings came from; `None` = built-in defaults.
    pub source:            Option<PathBuf>,
}

impl Config {
    /// Read `$MARKET_PULSE_CONFIG` (or `config.yaml`) and overlay the env.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));

        let file = FileConfig::read(&path)?;
        let source = file.is_some().then_some(path);

        let mut config = Self::from_sources(file.unwrap_or_default(), EnvOverrides::from_env())?;
        config.source = source;
        Ok(config)
    }

    pub fn from_sources(file: FileConfig, env: EnvOverrides) -> Result<Self, ConfigError> {
        let webhook_url = env.webhook_url.ok_or(ConfigError::MissingWebhook)?;

        let tickers = match env.tickers.as_deref().map(parse_ticker_list) {
            Some(list) if !list.is_empty() => list,
            _ => file.market.tickers.iter().filter_map(|t| normalize_ticker(t)).collect(),
        };
        if tickers.is_empty() {
            return Err(ConfigError::NoTickers);
        }

        let m = &file.market;
        let open = parse_hhmm("market.market_open", &m.market_open)?;
        let close = parse_hhmm("market.market_close", &m.market_close)?;
        if open >= close {
            return Err(ConfigError::InvalidHours {
                open:  m.market_open.clone(),
                close: m.market_close.clone(),
            });
        }

        let timezone = Tz::from_str(m.timezone.trim())
            .map_err(|_| ConfigError::InvalidTimezone(m.timezone.clone()))?;

        let s = &m.update_schedule;
        let early_interval = positive("market.update_schedule.early_interval_minutes", s.early_interval_minutes)?;
        let later_interval = positive("market.update_schedule.later_interval_minutes", s.later_interval_minutes)?;

        let rsi_period = match file.indicators.rsi_period {
            0 => return Err(ConfigError::InvalidInterval { field: "indicators.rsi_period" }),
            n if n > MAX_RSI_PERIOD => {
                return Err(ConfigError::OutOfRange {
                    field: "indicators.rsi_period",
                    value: n,
                    max:   MAX_RSI_PERIOD,
                })
            }
            n => n,
        };

        Ok(Self {
            tickers,
            webhook_url,
            schedule: ScheduleState {
                hours: MarketHours { timezone, open, close },
                plan:  PollingPlan {
                    early_interval,
                    early_window: s.early_duration_minutes,
                    later_interval,
                },
            },
            rsi_period,
            sample_rows: file.log.sample_rows,
            log_level: parse_level(&file.log.level)?,
            provider_base_url: file.provider.base_url.clone(),
            source: None,
        })
    }
}

/// `" spy, qqq ,,dia"` → `["SPY", "QQQ", "DIA"]`
pub fn parse_ticker_list(raw: &str) -> Vec<String> {
    raw.split(',').filter_map(normalize_ticker).collect()
}

fn normalize_ticker(raw: &str) -> Option<String> {
    let t = raw.trim();
    (!t.is_empty()).then(|| t.to_uppercase())
}

fn parse_hhmm(field: &'static str, value: &str) -> Result<NaiveTime, ConfigError> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M")
        .map_err(|_| ConfigError::InvalidTime { field, value: value.to_string() })
}

fn positive(field: &'static str, value: u32) -> Result<u32, ConfigError> {
    if value == 0 {
        Err(ConfigError::InvalidInterval { field })
    } else {
        Ok(value)
    }
}

fn parse_level(raw: &str) -> Result<Level, ConfigError> {
    match raw.trim().to_ascii_uppercase().as_str() {
        "WARNING" => Ok(Level::WARN),
        "CRITICAL" => Ok(Level::ERROR),
        other => Level::from_str(other).map_err(|_| ConfigError::InvalidLogLevel(raw.to_string())),
    }
}
