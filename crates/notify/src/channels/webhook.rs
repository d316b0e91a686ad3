//! Slack-compatible incoming webhook channel.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::ChannelError;
use crate::events::AlertEvent;
use crate::NotifyChannel;

/// Environment variable for the webhook URL.
pub const ENV_SLACK_WEBHOOK_URL: &str = "SLACK_WEBHOOK_URL";

/// Upper bound on a single delivery attempt.
const DELIVERY_TIMEOUT: Duration = Duration::from_secs(5);

/// Webhook notification channel posting `{"text": ...}` payloads.
pub struct WebhookChannel {
    webhook_url: Option<String>,
    client: reqwest::Client,
}

impl WebhookChannel {
    /// Create a channel for the given webhook URL.
    ///
    /// A `None` URL yields a disabled channel whose `send` reports
    /// [`ChannelError::NotConfigured`] without touching the network.
    pub fn new(webhook_url: Option<String>) -> Result<Self, ChannelError> {
        let webhook_url = webhook_url.filter(|url| !url.trim().is_empty());

        if webhook_url.is_some() {
            debug!("Webhook notifications enabled");
        } else {
            debug!("Webhook notifications disabled (SLACK_WEBHOOK_URL not set)");
        }

        let client = reqwest::Client::builder()
            .timeout(DELIVERY_TIMEOUT)
            .build()?;

        Ok(Self {
            webhook_url,
            client,
        })
    }

    fn format_payload(event: &AlertEvent) -> WebhookPayload {
        WebhookPayload { text: event.text() }
    }
}

#[async_trait]
impl NotifyChannel for WebhookChannel {
    fn name(&self) -> &'static str {
        "webhook"
    }

    fn enabled(&self) -> bool {
        self.webhook_url.is_some()
    }

    async fn send(&self, event: &AlertEvent) -> Result<(), ChannelError> {
        let webhook_url = self
            .webhook_url
            .as_ref()
            .ok_or_else(|| ChannelError::NotConfigured(ENV_SLACK_WEBHOOK_URL.to_string()))?;

        let payload = Self::format_payload(event);

        debug!(channel = "webhook", "Sending alert");

        let response = self.client.post(webhook_url).json(&payload).send().await?;

        // Delivery is best-effort: any completed exchange counts as sent.
        if response.status().is_success() {
            debug!(channel = "webhook", "Alert delivered");
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!(
                channel = "webhook",
                status = %status,
                body = %body,
                "Webhook returned a non-success status"
            );
        }

        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct WebhookPayload {
    text: String,
}
