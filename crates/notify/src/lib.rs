//! Notification channels for SRE crew alerts.
//!
//! Agents raise alerts through a [`NotifyChannel`]. The only shipped channel is
//! a Slack-compatible incoming webhook that posts a JSON body with a single
//! `text` field.
//!
//! # Usage
//!
//! ```no_run
//! use notify::{AlertEvent, NotifyChannel, WebhookChannel};
//!
//! # async fn demo() -> Result<(), notify::ChannelError> {
//! let channel = WebhookChannel::new(std::env::var(notify::ENV_SLACK_WEBHOOK_URL).ok())?;
//! channel.send(&AlertEvent::sre_action("Scaled default/rabbitmq to 3")).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration
//!
//! - `SLACK_WEBHOOK_URL`: webhook URL (enables the channel)
//!
//! Delivery is best-effort: a single POST bounded by a five second timeout,
//! never retried.

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod channels;
pub mod error;
pub mod events;

pub use channels::webhook::{WebhookChannel, ENV_SLACK_WEBHOOK_URL};
pub use channels::NotifyChannel;
pub use error::ChannelError;
pub use events::AlertEvent;
