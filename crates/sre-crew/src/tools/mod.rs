//! Capabilities exposed to SRE agents.
//!
//! Every tool takes JSON arguments chosen by the model and answers with plain
//! text. Tools never fail past their boundary: network, API and argument errors
//! come back as descriptive text so the agent can reason about them.

pub mod alert;
pub mod k8s;
pub mod prometheus;

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::config::RuntimeSettings;

pub use alert::SendAlertTool;
pub use k8s::{
    KubeWorkloads, RestartDeploymentTool, ScaleStatefulSetTool, WorkloadApi, WorkloadTarget,
};
pub use prometheus::{PrometheusClient, PrometheusConfig, PrometheusQueryTool};

/// A capability an agent can call.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Name the model uses to call this tool
    fn name(&self) -> &'static str;

    /// What the tool does, shown to the model
    fn description(&self) -> &'static str;

    /// JSON schema of the arguments object
    fn parameters(&self) -> Value;

    /// Run the tool. Failures are reported in the returned text.
    async fn invoke(&self, arguments: Value) -> String;
}

/// Shared handle to a tool
pub type SharedTool = Arc<dyn Tool>;

/// Decode a tool's arguments, producing the text the model sees on failure.
pub(crate) fn parse_arguments<T: DeserializeOwned>(
    tool: &str,
    arguments: Value,
) -> std::result::Result<T, String> {
    serde_json::from_value(arguments)
        .map_err(|e| format!("Error: invalid arguments for {tool}: {e}"))
}

/// The full set of tools, built once and handed out per operation.
#[derive(Clone)]
pub struct Toolbox {
    prometheus: SharedTool,
    alert: SharedTool,
    scale: SharedTool,
    restart: SharedTool,
}

impl Toolbox {
    /// Build the production tools from runtime settings.
    ///
    /// # Errors
    /// Fails if an HTTP client cannot be constructed.
    pub fn from_settings(settings: &RuntimeSettings) -> Result<Self> {
        let prometheus = PrometheusClient::new(PrometheusConfig {
            base_url: settings.prometheus_url.clone(),
            skip_tls_verify: settings.prometheus_skip_tls_verify,
            ..PrometheusConfig::default()
        })?;
        let channel = notify::WebhookChannel::new(settings.slack_webhook_url.clone())
            .context("Failed to create alert webhook channel")?;
        let workloads: Arc<dyn WorkloadApi> = Arc::new(KubeWorkloads::new());

        Ok(Self::new(
            Arc::new(PrometheusQueryTool::new(prometheus)),
            Arc::new(SendAlertTool::new(Arc::new(channel))),
            Arc::new(ScaleStatefulSetTool::new(Arc::clone(&workloads))),
            Arc::new(RestartDeploymentTool::new(workloads)),
        ))
    }

    /// Assemble a toolbox from individual tools.
    pub fn new(
        prometheus: SharedTool,
        alert: SharedTool,
        scale: SharedTool,
        restart: SharedTool,
    ) -> Self {
        Self {
            prometheus,
            alert,
            scale,
            restart,
        }
    }

    /// Read-only tools for monitoring and SLO audits.
    pub fn metrics(&self) -> Vec<SharedTool> {
        vec![Arc::clone(&self.prometheus)]
    }

    /// Metrics, alerting and cluster mutation tools for investigations.
    pub fn investigation(&self) -> Vec<SharedTool> {
        vec![
            Arc::clone(&self.prometheus),
            Arc::clone(&self.alert),
            Arc::clone(&self.restart),
            Arc::clone(&self.scale),
        ]
    }
}
