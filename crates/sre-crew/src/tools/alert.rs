//! The `SendAlert` tool.

use std::sync::Arc;

use async_trait::async_trait;
use notify::{AlertEvent, NotifyChannel, ENV_SLACK_WEBHOOK_URL};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use super::{parse_arguments, Tool};

#[derive(Debug, Deserialize)]
struct AlertArgs {
    message: String,
}

/// Sends an incident alert through a notification channel.
pub struct SendAlertTool {
    channel: Arc<dyn NotifyChannel>,
}

impl SendAlertTool {
    pub fn new(channel: Arc<dyn NotifyChannel>) -> Self {
        Self { channel }
    }
}

#[async_trait]
impl Tool for SendAlertTool {
    fn name(&self) -> &'static str {
        "SendAlert"
    }

    fn description(&self) -> &'static str {
        "Sends an incident alert via Webhook."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "message": {
                    "type": "string",
                    "description": "The alert message to send"
                }
            },
            "required": ["message"]
        })
    }

    async fn invoke(&self, arguments: Value) -> String {
        let args: AlertArgs = match parse_arguments(self.name(), arguments) {
            Ok(args) => args,
            Err(message) => return message,
        };

        if !self.channel.enabled() {
            return format!("Error: {ENV_SLACK_WEBHOOK_URL} not set.");
        }

        match self.channel.send(&AlertEvent::sre_action(args.message)).await {
            Ok(()) => {
                info!(channel = self.channel.name(), "Alert sent");
                "Alert sent.".to_string()
            }
            Err(e) => {
                warn!(channel = self.channel.name(), error = %e, "Failed to send alert");
                format!("Failed to send alert: {e}")
            }
        }
    }
}
