//! Orchestrator wiring: which role, task text and tools each operation uses.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Value};

use sre_crew::config::{CrewConfig, LlmSettings, RoleConfig, TaskConfig};
use sre_crew::llm::{AgentRunner, AgentSpec, AgentTask};
use sre_crew::tools::{Tool, Toolbox};
use sre_crew::{SreOperations, SreOrchestrator};

/// A run as seen by the runner.
#[derive(Debug, Clone)]
struct RecordedRun {
    agent: String,
    role: String,
    tools: Vec<&'static str>,
    verbose: bool,
    task: AgentTask,
}

#[derive(Default)]
struct RecordingRunner {
    runs: Mutex<Vec<RecordedRun>>,
}

#[async_trait]
impl AgentRunner for RecordingRunner {
    async fn run(&self, agent: &AgentSpec, task: &AgentTask) -> Result<String> {
        self.runs.lock().unwrap().push(RecordedRun {
            agent: agent.name.clone(),
            role: agent.role.role.clone(),
            tools: agent.tools.iter().map(|tool| tool.name()).collect(),
            verbose: agent.verbose,
            task: task.clone(),
        });
        Ok(format!("{} done", agent.name))
    }
}

struct NamedTool(&'static str);

#[async_trait]
impl Tool for NamedTool {
    fn name(&self) -> &'static str {
        self.0
    }

    fn description(&self) -> &'static str {
        "test tool"
    }

    fn parameters(&self) -> Value {
        json!({"type": "object"})
    }

    async fn invoke(&self, _arguments: Value) -> String {
        String::new()
    }
}

fn role(name: &str) -> RoleConfig {
    RoleConfig {
        role: name.to_string(),
        goal: format!("{name} goal"),
        backstory: format!("{name} backstory"),
    }
}

fn task(description: &str) -> TaskConfig {
    TaskConfig {
        description: description.to_string(),
        expected_output: "a report".to_string(),
    }
}

fn config(with_slo_agent: bool) -> CrewConfig {
    let mut agents = HashMap::from([
        ("monitor_agent".to_string(), role("Monitor")),
        ("investigator_agent".to_string(), role("Investigator")),
    ]);
    if with_slo_agent {
        agents.insert("slo_agent".to_string(), role("Auditor"));
    }

    let tasks = HashMap::from([
        ("monitor_task".to_string(), task("Check golden signals.")),
        (
            "investigation_task".to_string(),
            task("Incident report:\n{anomaly_context}\nFind the root cause."),
        ),
        ("slo_task".to_string(), task("Audit every SLO.")),
    ]);

    let slos: serde_yaml::Value =
        serde_yaml::from_str("checkout:\n  availability: 99.9\n").unwrap();

    CrewConfig::new(
        agents,
        tasks,
        slos,
        LlmSettings {
            model: "gpt-4o-mini".to_string(),
            temperature: 0.1,
            max_tokens: 500,
            base_url: None,
            max_iterations: 5,
        },
    )
}

fn toolbox() -> Toolbox {
    Toolbox::new(
        Arc::new(NamedTool("PrometheusQuery")),
        Arc::new(NamedTool("SendAlert")),
        Arc::new(NamedTool("ScaleStatefulSet")),
        Arc::new(NamedTool("RestartDeployment")),
    )
}

fn orchestrator(with_slo_agent: bool) -> (SreOrchestrator, Arc<RecordingRunner>) {
    let runner = Arc::new(RecordingRunner::default());
    let orchestrator = SreOrchestrator::new(config(with_slo_agent), toolbox(), runner.clone());
    (orchestrator, runner)
}

#[tokio::test]
async fn monitor_uses_metrics_only() {
    let (orchestrator, runner) = orchestrator(true);

    let verdict = orchestrator.run_monitor().await.unwrap();
    assert_eq!(verdict, "monitor_agent done");

    let runs = runner.runs.lock().unwrap();
    let run = &runs[0];
    assert_eq!(run.agent, "monitor_agent");
    assert_eq!(run.role, "Monitor");
    assert_eq!(run.tools, vec!["PrometheusQuery"]);
    assert!(!run.verbose);
    assert_eq!(run.task.description, "Check golden signals.");
}

#[tokio::test]
async fn investigation_substitutes_context_and_gets_all_tools() {
    let (orchestrator, runner) = orchestrator(true);

    orchestrator
        .run_investigation("ERROR: prometheus unreachable")
        .await
        .unwrap();

    let runs = runner.runs.lock().unwrap();
    let run = &runs[0];
    assert_eq!(run.agent, "investigator_agent");
    assert_eq!(
        run.tools,
        vec![
            "PrometheusQuery",
            "SendAlert",
            "RestartDeployment",
            "ScaleStatefulSet"
        ]
    );
    assert!(run.verbose);
    assert_eq!(
        run.task.description,
        "Incident report:\nERROR: prometheus unreachable\nFind the root cause."
    );
}

#[tokio::test]
async fn repeated_investigations_each_get_their_own_context() {
    let (orchestrator, runner) = orchestrator(true);

    orchestrator.run_investigation("first").await.unwrap();
    orchestrator.run_investigation("second").await.unwrap();

    let runs = runner.runs.lock().unwrap();
    assert!(runs[0].task.description.contains("first"));
    assert!(runs[1].task.description.contains("second"));
    assert!(!runs[1].task.description.contains("first"));
}

#[tokio::test]
async fn slo_check_appends_definitions() {
    let (orchestrator, runner) = orchestrator(true);

    orchestrator.run_slo_check().await.unwrap();

    let runs = runner.runs.lock().unwrap();
    let run = &runs[0];
    assert_eq!(run.agent, "slo_agent");
    assert_eq!(run.tools, vec!["PrometheusQuery"]);
    assert!(run
        .task
        .description
        .starts_with("Audit every SLO.\n\nSLO CONFIG:\n"));
    assert!(run.task.description.contains("availability: 99.9"));
}

#[tokio::test]
async fn missing_role_fails_only_that_operation() {
    let (orchestrator, runner) = orchestrator(false);

    let err = orchestrator.run_slo_check().await.unwrap_err();
    assert!(err.to_string().contains("slo_agent"));
    assert!(runner.runs.lock().unwrap().is_empty());

    assert!(orchestrator.run_monitor().await.is_ok());
}
