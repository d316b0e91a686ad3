//! Prometheus client and the `PrometheusQuery` tool.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use super::{parse_arguments, Tool};
use crate::config::settings::DEFAULT_PROMETHEUS_URL;

/// Configuration for the Prometheus client
#[derive(Debug, Clone)]
pub struct PrometheusConfig {
    /// Base URL for the Prometheus API
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Accept invalid TLS certificates
    pub skip_tls_verify: bool,
}

impl Default for PrometheusConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_PROMETHEUS_URL.to_string(),
            timeout_secs: 30,
            skip_tls_verify: true,
        }
    }
}

/// Prometheus query response envelope
#[derive(Debug, Deserialize)]
struct PrometheusResponse {
    status: String,
    #[serde(default)]
    data: Option<PrometheusData>,
    #[serde(rename = "errorType", default)]
    error_type: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PrometheusData {
    #[serde(rename = "resultType")]
    #[allow(dead_code)]
    result_type: String,
    result: Value,
}

/// Prometheus client for instant queries
#[derive(Debug, Clone)]
pub struct PrometheusClient {
    config: PrometheusConfig,
    client: reqwest::Client,
}

impl PrometheusClient {
    /// Create a new Prometheus client with the given configuration.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(config: PrometheusConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .danger_accept_invalid_certs(config.skip_tls_verify)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { config, client })
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Execute an instant query and return the raw `data.result` value.
    ///
    /// # Errors
    /// Returns an error if the request fails, Prometheus rejects the query, or
    /// the response cannot be parsed.
    pub async fn query(&self, query: &str) -> Result<Value> {
        let url = format!(
            "{}/api/v1/query",
            self.config.base_url.trim_end_matches('/')
        );

        debug!(query = %query, "Executing Prometheus query");

        let response = self
            .client
            .get(&url)
            .query(&[("query", query)])
            .send()
            .await
            .context("Failed to send request to Prometheus")?;

        let status = response.status();
        let body = response
            .text()
            .await
            .context("Failed to read Prometheus response")?;

        // Prometheus reports bad queries as a JSON envelope on a 4xx status.
        let parsed = serde_json::from_str::<PrometheusResponse>(&body);

        if !status.is_success() {
            if let Ok(PrometheusResponse {
                error: Some(error),
                error_type,
                ..
            }) = parsed
            {
                let kind = error_type.unwrap_or_else(|| "error".to_string());
                anyhow::bail!("query failed with status {status} ({kind}): {error}");
            }
            anyhow::bail!("query failed with status {status}: {body}");
        }

        let prom_response = parsed.context("Failed to parse Prometheus response")?;

        if prom_response.status != "success" {
            anyhow::bail!(
                "query returned status {}: {}",
                prom_response.status,
                prom_response.error.unwrap_or_default()
            );
        }

        let data = prom_response
            .data
            .context("Prometheus response has no data")?;
        Ok(data.result)
    }
}

#[derive(Debug, Deserialize)]
struct QueryArgs {
    query: String,
}

/// Tool running a PromQL instant query.
pub struct PrometheusQueryTool {
    client: PrometheusClient,
}

impl PrometheusQueryTool {
    pub fn new(client: PrometheusClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for PrometheusQueryTool {
    fn name(&self) -> &'static str {
        "PrometheusQuery"
    }

    fn description(&self) -> &'static str {
        "Executes a PromQL query and returns the result."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The PromQL query to execute"
                }
            },
            "required": ["query"]
        })
    }

    async fn invoke(&self, arguments: Value) -> String {
        let args: QueryArgs = match parse_arguments(self.name(), arguments) {
            Ok(args) => args,
            Err(message) => return message,
        };

        match self.client.query(&args.query).await {
            Ok(result) => result.to_string(),
            Err(e) => {
                warn!(base_url = self.client.base_url(), error = %e, "Prometheus query failed");
                format!("Prometheus Error: {e:#}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = PrometheusConfig::default();
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.base_url, "http://localhost:9090");
    }

    #[tokio::test]
    async fn test_missing_query_argument_is_reported() {
        let tool = PrometheusQueryTool::new(PrometheusClient::new(PrometheusConfig::default()).unwrap());
        let text = tool.invoke(json!({"q": "up"})).await;
        assert!(text.starts_with("Error: invalid arguments for PrometheusQuery"));
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_text() {
        let tool = PrometheusQueryTool::new(
            PrometheusClient::new(PrometheusConfig {
                base_url: "http://127.0.0.1:1".to_string(),
                timeout_secs: 2,
                skip_tls_verify: false,
            })
            .unwrap(),
        );

        let text = tool.invoke(json!({"query": "up"})).await;
        assert!(text.starts_with("Prometheus Error: "), "{text}");
    }
}
