//! Configuration for the SRE crew.
//!
//! Two layers:
//! - [`files`]: static agent, task, SLO and LLM configuration read from a
//!   config directory once at startup
//! - [`settings`]: runtime knobs (intervals, endpoints, credentials) supplied by
//!   CLI flags with environment fallbacks

pub mod files;
pub mod settings;

use std::path::PathBuf;

use thiserror::Error;

pub use files::{CrewConfig, LlmSettings, RoleConfig, TaskConfig};
pub use settings::RuntimeSettings;

/// Errors raised while loading or resolving configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A config file could not be read
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A YAML config file is malformed
    #[error("failed to parse {}: {source}", path.display())]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// The LLM parameter file is malformed or missing a required key
    #[error("failed to parse {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A named role or task entry is absent
    #[error("no {kind} named '{name}' in {file}")]
    MissingEntry {
        kind: &'static str,
        name: String,
        file: &'static str,
    },

    /// The SLO definitions could not be rendered back to text
    #[error("failed to serialize SLO definitions: {0}")]
    SloSerialize(#[source] serde_yaml::Error),
}
