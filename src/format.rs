//! # format — Render snapshots as a webhook message
//!
//! Output is markdown-ish text with the table inside a code fence, so chat
//! clients show it monospaced:
//!
//! ~~~text
//! 📊 **Market Pulse — Snapshot**
//! _Generated at 2024-03-08 15:00:00 EST_
//!
//! ```
//! Ticker        Last      Δ%  RSI(14)
//! ----------------------------------
//! SPY         511.25    0.15    63.20
//! ```
//! ~~~

use std::fmt::Display;

use chrono::{DateTime, TimeZone};

use crate::models::Snapshot;

const UNAVAILABLE: &str = "n/a";

/// Build the full message body for one tick, rows in input order.
pub fn build_message<Tz>(snapshots: &[Snapshot], generated_at: &DateTime<Tz>, rsi_period: usize) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let mut lines = Vec::with_capacity(snapshots.len() + 7);

    lines.push("📊 **Market Pulse — Snapshot**".to_string());
    lines.push(format!("_Generated at {}_", generated_at.format("%Y-%m-%d %H:%M:%S %Z")));
    lines.push(String::new());
    lines.push("```".to_string());
    lines.push(format!(
        "{:<8} {:>9} {:>7} {:>8}",
        "Ticker",
        "Last",
        "Δ%",
        format!("RSI({rsi_period})")
    ));
    lines.push("-".repeat(34));

    for s in snapshots {
        lines.push(format!(
            "{:<8} {:>9} {:>7} {:>8}",
            s.symbol,
            cell(s.last_price),
            cell(s.change_pct),
            cell(s.indicator),
        ));
    }

    lines.push("```".to_string());
    lines.join("\n")
}

fn cell(value: Option<f64>) -> String {
    value.map_or_else(|| UNAVAILABLE.to_string(), |v| format!("{v:.2}"))
}
