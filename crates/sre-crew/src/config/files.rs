//! Agent, task, SLO and LLM configuration files.
//!
//! The LLM parameter file is strict: every required key must be present or
//! loading fails, so a misconfigured deployment never starts. Role and task
//! entries are resolved by name when an operation needs them.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::ConfigError;

/// Role definitions, keyed by agent name
pub const AGENTS_FILE: &str = "agents.yaml";
/// Task templates, keyed by task name
pub const TASKS_FILE: &str = "tasks.yaml";
/// Service level objective thresholds
pub const SLOS_FILE: &str = "slos.yaml";
/// LLM invocation parameters
pub const LLM_FILE: &str = "llm_config.json";

pub const MONITOR_AGENT: &str = "monitor_agent";
pub const INVESTIGATOR_AGENT: &str = "investigator_agent";
pub const SLO_AGENT: &str = "slo_agent";

pub const MONITOR_TASK: &str = "monitor_task";
pub const INVESTIGATION_TASK: &str = "investigation_task";
pub const SLO_TASK: &str = "slo_task";

/// Every role the orchestrator resolves
pub const REQUIRED_AGENTS: &[&str] = &[MONITOR_AGENT, INVESTIGATOR_AGENT, SLO_AGENT];
/// Every task the orchestrator resolves
pub const REQUIRED_TASKS: &[&str] = &[MONITOR_TASK, INVESTIGATION_TASK, SLO_TASK];

const DEFAULT_MAX_ITERATIONS: usize = 15;

/// Persona handed to the agent runner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleConfig {
    /// Short role title ("Site Reliability Monitor")
    pub role: String,
    /// What the agent is trying to achieve
    pub goal: String,
    /// Background and standing instructions
    pub backstory: String,
}

/// A task description plus the shape of the expected answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskConfig {
    /// Task description, possibly containing template placeholders
    pub description: String,
    /// Description of the expected final answer
    pub expected_output: String,
}

/// LLM invocation parameters from `llm_config.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmSettings {
    /// Chat model name
    pub model: String,
    /// Sampling temperature
    pub temperature: f32,
    /// Completion token limit per request
    pub max_tokens: u32,
    /// Chat completions endpoint override (proxies, compatible servers)
    #[serde(default)]
    pub base_url: Option<String>,
    /// Tool-calling rounds before the agent is asked for a final answer
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
}

fn default_max_iterations() -> usize {
    DEFAULT_MAX_ITERATIONS
}

/// All static configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct CrewConfig {
    agents: HashMap<String, RoleConfig>,
    tasks: HashMap<String, TaskConfig>,
    slos: serde_yaml::Value,
    llm: LlmSettings,
}

impl CrewConfig {
    /// Load every config file from `dir`.
    ///
    /// # Errors
    /// Fails if any file is missing or malformed, or if `llm_config.json` lacks
    /// a required key.
    pub fn load(dir: &Path) -> Result<Self, ConfigError> {
        let agents = load_yaml(&dir.join(AGENTS_FILE))?;
        let tasks = load_yaml(&dir.join(TASKS_FILE))?;
        let slos = load_yaml(&dir.join(SLOS_FILE))?;
        let llm = load_json(&dir.join(LLM_FILE))?;

        let config = Self::new(agents, tasks, slos, llm);
        debug!(
            dir = %dir.display(),
            agents = config.agents.len(),
            tasks = config.tasks.len(),
            model = %config.llm.model,
            "Loaded crew configuration"
        );
        Ok(config)
    }

    /// Build a configuration from already-parsed parts.
    pub fn new(
        agents: HashMap<String, RoleConfig>,
        tasks: HashMap<String, TaskConfig>,
        slos: serde_yaml::Value,
        llm: LlmSettings,
    ) -> Self {
        Self {
            agents,
            tasks,
            slos,
            llm,
        }
    }

    /// Look up a role by agent name.
    pub fn role(&self, name: &str) -> Result<&RoleConfig, ConfigError> {
        self.agents.get(name).ok_or_else(|| ConfigError::MissingEntry {
            kind: "agent",
            name: name.to_string(),
            file: AGENTS_FILE,
        })
    }

    /// Look up a task by name.
    pub fn task(&self, name: &str) -> Result<&TaskConfig, ConfigError> {
        self.tasks.get(name).ok_or_else(|| ConfigError::MissingEntry {
            kind: "task",
            name: name.to_string(),
            file: TASKS_FILE,
        })
    }

    /// The SLO definition set rendered as YAML text.
    pub fn slo_definitions_text(&self) -> Result<String, ConfigError> {
        serde_yaml::to_string(&self.slos).map_err(ConfigError::SloSerialize)
    }

    pub fn llm(&self) -> &LlmSettings {
        &self.llm
    }

    /// Resolve every role and task the orchestrator needs, collecting all
    /// problems instead of stopping at the first.
    pub fn missing_entries(&self) -> Vec<ConfigError> {
        let roles = REQUIRED_AGENTS
            .iter()
            .filter_map(|name| self.role(name).err());
        let tasks = REQUIRED_TASKS
            .iter()
            .filter_map(|name| self.task(name).err());
        roles.chain(tasks).collect()
    }
}

fn read(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })
}

fn load_yaml<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T, ConfigError> {
    let raw = read(path)?;
    serde_yaml::from_str(&raw).map_err(|source| ConfigError::Yaml {
        path: PathBuf::from(path),
        source,
    })
}

fn load_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T, ConfigError> {
    let raw = read(path)?;
    serde_json::from_str(&raw).map_err(|source| ConfigError::Json {
        path: PathBuf::from(path),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const AGENTS: &str = r"
monitor_agent:
  role: Monitor
  goal: Watch metrics
  backstory: You watch dashboards.
investigator_agent:
  role: Investigator
  goal: Fix incidents
  backstory: You fix things.
slo_agent:
  role: Auditor
  goal: Audit SLOs
  backstory: You read error budgets.
";

    const TASKS: &str = r"
monitor_task:
  description: Check the cluster.
  expected_output: HEALTHY or ANOMALY.
investigation_task:
  description: 'Investigate: {anomaly_context}'
  expected_output: Actions taken.
slo_task:
  description: Audit the SLOs.
  expected_output: A report.
";

    const SLOS: &str = r"
checkout:
  availability: 99.9
  latency_p99_ms: 300
";

    fn write_config(dir: &Path, llm: &str) {
        std::fs::write(dir.join(AGENTS_FILE), AGENTS).unwrap();
        std::fs::write(dir.join(TASKS_FILE), TASKS).unwrap();
        std::fs::write(dir.join(SLOS_FILE), SLOS).unwrap();
        std::fs::write(dir.join(LLM_FILE), llm).unwrap();
    }

    #[test]
    fn test_load_complete_config() {
        let dir = tempfile::tempdir().unwrap();
        write_config(
            dir.path(),
            r#"{"model": "gpt-4o-mini", "temperature": 0.1, "max_tokens": 1500}"#,
        );

        let config = CrewConfig::load(dir.path()).unwrap();
        assert_eq!(config.llm().model, "gpt-4o-mini");
        assert_eq!(config.llm().max_tokens, 1500);
        assert_eq!(config.llm().max_iterations, DEFAULT_MAX_ITERATIONS);
        assert!(config.llm().base_url.is_none());
        assert_eq!(config.role(MONITOR_AGENT).unwrap().role, "Monitor");
        assert!(config.missing_entries().is_empty());
    }

    #[test]
    fn test_llm_config_missing_key_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        write_config(dir.path(), r#"{"model": "gpt-4o", "temperature": 0.2}"#);

        let err = CrewConfig::load(dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Json { .. }));
        assert!(err.to_string().contains("max_tokens"));
    }

    #[test]
    fn test_missing_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let err = CrewConfig::load(dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_missing_role_surfaces_on_lookup() {
        let config = CrewConfig::new(
            HashMap::new(),
            HashMap::new(),
            serde_yaml::Value::Null,
            LlmSettings {
                model: "m".to_string(),
                temperature: 0.0,
                max_tokens: 10,
                base_url: None,
                max_iterations: 1,
            },
        );

        let err = config.role(SLO_AGENT).unwrap_err();
        assert_eq!(err.to_string(), "no agent named 'slo_agent' in agents.yaml");
        assert_eq!(config.missing_entries().len(), 6);
    }

    #[test]
    fn test_slo_definitions_render_as_yaml() {
        let dir = tempfile::tempdir().unwrap();
        write_config(
            dir.path(),
            r#"{"model": "gpt-4o", "temperature": 0, "max_tokens": 100}"#,
        );

        let config = CrewConfig::load(dir.path()).unwrap();
        let text = config.slo_definitions_text().unwrap();
        assert!(text.contains("checkout:"));
        assert!(text.contains("latency_p99_ms: 300"));
    }

    #[test]
    fn test_shipped_config_is_complete() {
        let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../config");

        let config = CrewConfig::load(&dir).unwrap();
        assert!(config.missing_entries().is_empty());
        assert!(config
            .task(INVESTIGATION_TASK)
            .unwrap()
            .description
            .contains("{anomaly_context}"));
    }
}
