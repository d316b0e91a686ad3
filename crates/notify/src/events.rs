//! Notification event types for SRE actions.

use serde::{Deserialize, Serialize};

/// Header prepended to every SRE action message.
const SRE_ACTION_HEADER: &str = "🚨 *SRE Action*";

/// An alert raised by an SRE agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertEvent {
    /// Free-text message written by the agent
    pub message: String,
}

impl AlertEvent {
    /// Create an alert for an agent-written message.
    pub fn sre_action(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Render the text delivered to chat webhooks.
    #[must_use]
    pub fn text(&self) -> String {
        format!("{SRE_ACTION_HEADER}\n{}", self.message)
    }
}
