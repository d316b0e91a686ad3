//! SRE crew: an autonomous operations loop.
//!
//! A monitor agent queries Prometheus and reports a health verdict. Verdicts
//! that look like incidents hand off to an investigator agent that can query
//! metrics, send alerts, restart Deployments and scale StatefulSets. An SLO
//! auditor runs on its own interval.
//!
//! # Modules
//!
//! - [`config`]: config files and runtime settings
//! - [`tools`]: the capabilities agents can call
//! - [`llm`]: chat provider and tool-calling agent runner
//! - [`orchestrator`]: the three crew operations
//! - [`classifier`]: health classification of monitor output
//! - [`control_loop`]: the polling loop

pub mod classifier;
pub mod config;
pub mod control_loop;
pub mod llm;
pub mod orchestrator;
pub mod tools;

pub use classifier::{HealthClassification, HealthClassifier, KeywordClassifier};
pub use config::{ConfigError, CrewConfig, RuntimeSettings};
pub use control_loop::{ControlLoop, LoopPhase, LoopState, MonitorOutcome, SloOutcome, TickReport};
pub use orchestrator::{SreOperations, SreOrchestrator};
