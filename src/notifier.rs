//! # notifier — POST the rendered snapshot to a Discord-style webhook
//!
//! One attempt per tick. Failure is reported as `false` and logged; the
//! scheduler carries on either way.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{error, info};

const DELIVERY_TIMEOUT: Duration = Duration::from_secs(30);

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver `text`. `true` only on a 2xx response.
    async fn deliver(&self, text: &str) -> bool;
}

#[derive(Serialize)]
struct WebhookPayload<'a> {
    content: &'a str,
}

/// Production notifier: `POST {url}` with `{"content": text}`.
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    client: reqwest::Client,
    url:    String,
}

impl WebhookNotifier {
    pub fn new(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self { client, url: url.into() }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn deliver(&self, text: &str) -> bool {
        let result = self
            .client
            .post(&self.url)
            .json(&WebhookPayload { content: text })
            .timeout(DELIVERY_TIMEOUT)
            .send()
            .await;

        match result {
            Ok(resp) if resp.status().is_success() => {
                info!(status = resp.status().as_u16(), "✅ Posted to webhook successfully");
                true
            }
            Ok(resp) => {
                let status = resp.status();
                let body = resp.text().await.unwrap_or_default();
                error!(status = status.as_u16(), %body, "Webhook rejected message");
                false
            }
            Err(e) => {
                error!(error = %e, "Webhook unreachable");
                false
            }
        }
    }
}
