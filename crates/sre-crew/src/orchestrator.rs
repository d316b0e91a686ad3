//! The three crew operations: monitor check, investigation, SLO audit.
//!
//! Each operation pairs a role from `agents.yaml` with a task from
//! `tasks.yaml` and a tool set, then hands them to the agent runner.

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::info;

use crate::config::files::{
    INVESTIGATION_TASK, INVESTIGATOR_AGENT, MONITOR_AGENT, MONITOR_TASK, SLO_AGENT, SLO_TASK,
};
use crate::config::{CrewConfig, RuntimeSettings};
use crate::llm::{AgentRunner, AgentSpec, AgentTask, ToolCallingAgent};
use crate::tools::{SharedTool, Toolbox};

/// Placeholder in the investigation task replaced by the monitor output
pub const ANOMALY_CONTEXT_PLACEHOLDER: &str = "{anomaly_context}";

/// Operations driven by the control loop.
#[async_trait]
pub trait SreOperations: Send + Sync {
    /// Ask the monitor agent for a health verdict.
    async fn run_monitor(&self) -> Result<String>;

    /// Investigate an incident described by `context`.
    async fn run_investigation(&self, context: &str) -> Result<String>;

    /// Audit the configured SLOs.
    async fn run_slo_check(&self) -> Result<String>;
}

/// Composes config, tools and the agent runner into crew operations.
pub struct SreOrchestrator {
    config: CrewConfig,
    toolbox: Toolbox,
    runner: Arc<dyn AgentRunner>,
}

impl SreOrchestrator {
    pub fn new(config: CrewConfig, toolbox: Toolbox, runner: Arc<dyn AgentRunner>) -> Self {
        Self {
            config,
            toolbox,
            runner,
        }
    }

    /// Load configuration and build the production tools and runner.
    ///
    /// # Errors
    /// Fails if any config file is missing or malformed (including a missing
    /// key in `llm_config.json`) or an HTTP client cannot be built.
    pub fn from_settings(settings: &RuntimeSettings) -> Result<Self> {
        let config = CrewConfig::load(&settings.config_dir).with_context(|| {
            format!(
                "Failed to load crew configuration from {}",
                settings.config_dir.display()
            )
        })?;

        let toolbox = Toolbox::from_settings(settings)?;
        let runner = ToolCallingAgent::openai(config.llm(), settings.openai_api_key.clone());

        info!(
            model = %config.llm().model,
            prometheus_url = %settings.prometheus_url,
            alerts_enabled = settings.slack_webhook_url.is_some(),
            "Orchestrator initialized"
        );

        Ok(Self::new(config, toolbox, Arc::new(runner)))
    }

    fn agent(&self, name: &str, tools: Vec<SharedTool>, verbose: bool) -> Result<AgentSpec> {
        Ok(AgentSpec {
            name: name.to_string(),
            role: self.config.role(name)?.clone(),
            tools,
            verbose,
        })
    }

    fn task(&self, name: &str) -> Result<AgentTask> {
        let task = self.config.task(name)?;
        Ok(AgentTask {
            description: task.description.clone(),
            expected_output: task.expected_output.clone(),
        })
    }
}

/// Fill the investigation template with the monitor output.
pub fn render_investigation(template: &str, context: &str) -> String {
    template.replace(ANOMALY_CONTEXT_PLACEHOLDER, context)
}

/// Append the SLO definitions to the audit task description.
pub fn render_slo_task(description: &str, slo_definitions: &str) -> String {
    format!("{description}\n\nSLO CONFIG:\n{slo_definitions}")
}

#[async_trait]
impl SreOperations for SreOrchestrator {
    async fn run_monitor(&self) -> Result<String> {
        let agent = self.agent(MONITOR_AGENT, self.toolbox.metrics(), false)?;
        let task = self.task(MONITOR_TASK)?;
        self.runner.run(&agent, &task).await
    }

    async fn run_investigation(&self, context: &str) -> Result<String> {
        let agent = self.agent(INVESTIGATOR_AGENT, self.toolbox.investigation(), true)?;
        let mut task = self.task(INVESTIGATION_TASK)?;
        task.description = render_investigation(&task.description, context);
        self.runner.run(&agent, &task).await
    }

    async fn run_slo_check(&self) -> Result<String> {
        let agent = self.agent(SLO_AGENT, self.toolbox.metrics(), true)?;
        let mut task = self.task(SLO_TASK)?;
        let slos = self.config.slo_definitions_text()?;
        task.description = render_slo_task(&task.description, &slos);
        self.runner.run(&agent, &task).await
    }
}
