//! Runtime settings supplied by the CLI and environment.

use std::path::PathBuf;
use std::time::Duration;

/// Default Prometheus base URL
pub const DEFAULT_PROMETHEUS_URL: &str = "http://localhost:9090";
/// Default seconds between monitor ticks
pub const DEFAULT_MONITOR_INTERVAL_SECS: u64 = 60;
/// Default seconds between SLO audits
pub const DEFAULT_SLO_INTERVAL_SECS: u64 = 300;

/// Everything the crew needs besides the static config files.
#[derive(Debug, Clone)]
pub struct RuntimeSettings {
    /// Directory holding agents.yaml, tasks.yaml, slos.yaml, llm_config.json
    pub config_dir: PathBuf,
    /// Prometheus base URL
    pub prometheus_url: String,
    /// Skip TLS certificate verification for Prometheus
    pub prometheus_skip_tls_verify: bool,
    /// Alert webhook URL; `None` disables alert delivery
    pub slack_webhook_url: Option<String>,
    /// LLM API credential
    pub openai_api_key: Option<String>,
    /// Pause between monitor ticks
    pub monitor_interval: Duration,
    /// Minimum spacing between successful SLO audits
    pub slo_interval: Duration,
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        Self {
            config_dir: PathBuf::from("config"),
            prometheus_url: DEFAULT_PROMETHEUS_URL.to_string(),
            prometheus_skip_tls_verify: true,
            slack_webhook_url: None,
            openai_api_key: None,
            monitor_interval: Duration::from_secs(DEFAULT_MONITOR_INTERVAL_SECS),
            slo_interval: Duration::from_secs(DEFAULT_SLO_INTERVAL_SECS),
        }
    }
}
