//! # Market Pulse — Scheduled Market Snapshot Bot
//!
//! ## Flow
//!
//! ```text
//!  ┌──────────────┐  every 30m (first 150m) / 60m   ┌──────────────────────┐
//!  │  Scheduler   │ ───── while market is open ────▶│  Pipeline (1 tick)   │
//!  │  (ET hours)  │                                 │                      │
//!  └──────────────┘                                 │  fetch  ─▶ Yahoo ×2  │
//!         │  closed: sleep until next open          │  derive ─▶ last/Δ%/RSI│
//!         ▼  (weekends skipped)                     │  format ─▶ table     │
//!                                                   │  deliver ─▶ webhook  │
//!                                                   └──────────────────────┘
//! ```
//!
//! ## Environment Variables
//!
//! | Variable              | Default        | Description                        |
//! |-----------------------|----------------|------------------------------------|
//! | `DISCORD_WEBHOOK_URL` | — (required)   | Where snapshots are posted         |
//! | `TICKERS`             | config / SPY,QQQ,DIA | Comma-separated override     |
//! | `MARKET_PULSE_CONFIG` | `config.yaml`  | YAML settings file                 |
//! | `RUST_LOG`            | `market_pulse=<log.level>` | Tracing filter         |

use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod config;
mod engine;
mod error;
mod format;
mod market;
mod models;
mod notifier;
mod scheduler;

use config::Config;
use engine::{Pipeline, PipelineSettings};
use market::YahooProvider;
use notifier::WebhookNotifier;
use scheduler::{MarketScheduler, Shutdown, SystemClock};

/// Yahoo rejects requests without a browser-ish agent.
const USER_AGENT: &str = concat!("Mozilla/5.0 (compatible; market-pulse/", env!("CARGO_PKG_VERSION"), ")");

// ─── Entry Point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Load .env (optional — real env vars win) ──────────────────────────
    let dotenv = dotenvy::dotenv();

    // ── 2. Config first, so log.level can seed the filter ────────────────────
    let config = Config::load();

    // ── 3. Initialise structured logging ─────────────────────────────────────
    let level = config.as_ref().map(|c| c.log_level).unwrap_or(Level::INFO);
    init_tracing(level)?;

    info!(
        r#"

  ╔═══════════════════════════════════════════╗
  ║   MARKET PULSE — Snapshot Bot             ║
  ║   fetch → RSI → table → webhook           ║
  ╚═══════════════════════════════════════════╝"#
    );

    match &dotenv {
        Ok(path) => info!(path = %path.display(), "Loaded .env"),
        Err(_) => info!("No .env file — using process environment"),
    }

    // Missing webhook / invalid config → non-zero exit before the loop.
    let config = config.context("Failed to load config")?;

    match &config.source {
        Some(path) => info!(path = %path.display(), "Config loaded"),
        None => warn!("Config file not found — using defaults"),
    }

    let hours = &config.schedule.hours;
    let plan = &config.schedule.plan;
    info!("Tickers: {}", config.tickers.join(", "));
    info!(
        "Schedule: every {}m for first {}m after open, then every {}m until close",
        plan.early_interval, plan.early_window, plan.later_interval
    );
    info!(
        "Market hours ({}): {}–{}",
        hours.timezone,
        hours.open.format("%H:%M"),
        hours.close.format("%H:%M")
    );

    // ── 4. Wire the pipeline ─────────────────────────────────────────────────
    let client = reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .build()
        .context("Failed to build HTTP client")?;

    let pipeline = Pipeline::new(
        Arc::new(YahooProvider::new(client.clone(), config.provider_base_url.clone())),
        Arc::new(WebhookNotifier::new(client, config.webhook_url.clone())),
        PipelineSettings {
            tickers:     config.tickers.clone(),
            sample_rows: config.sample_rows,
            rsi_period:  config.rsi_period,
        },
    );

    // ── 5. Ctrl-C → leave the loop at its current wait ───────────────────────
    let (stop, shutdown) = Shutdown::channel();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutdown signal received");
            stop.send_replace(true);
        }
    });

    // ── 6. Run forever ───────────────────────────────────────────────────────
    MarketScheduler::new(config.schedule.clone(), pipeline, SystemClock)
        .run(shutdown)
        .await;

    info!("Market Pulse stopped");
    Ok(())
}

/// `RUST_LOG` wins; otherwise `market_pulse=<level>` with quiet HTTP internals.
fn init_tracing(level: Level) -> anyhow::Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::new(format!("market_pulse={}", level.as_str().to_lowercase()))
            .add_directive("reqwest=warn".parse()?)
            .add_directive("hyper=warn".parse()?),
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    Ok(())
}
