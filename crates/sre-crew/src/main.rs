//! SRE crew CLI
//!
//! Runs the autonomous monitor/investigate/audit loop, or a single operation
//! for debugging a deployment.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use sre_crew::config::settings::{
    DEFAULT_MONITOR_INTERVAL_SECS, DEFAULT_PROMETHEUS_URL, DEFAULT_SLO_INTERVAL_SECS,
};
use sre_crew::{
    ControlLoop, CrewConfig, HealthClassifier, KeywordClassifier, RuntimeSettings,
    SreOperations, SreOrchestrator,
};

/// Autonomous SRE loop - monitors metrics with LLM agents and investigates incidents
#[derive(Parser)]
#[command(name = "sre-crew")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Directory containing agents.yaml, tasks.yaml, slos.yaml and llm_config.json
    #[arg(long, env = "SRE_CONFIG_DIR", default_value = "config", global = true)]
    config_dir: PathBuf,

    /// Prometheus base URL
    #[arg(long, env = "PROMETHEUS_URL", default_value = DEFAULT_PROMETHEUS_URL, global = true)]
    prometheus_url: String,

    /// Skip TLS certificate verification for Prometheus
    #[arg(
        long,
        env = "PROMETHEUS_SKIP_TLS_VERIFY",
        default_value_t = true,
        action = clap::ArgAction::Set,
        global = true
    )]
    prometheus_skip_tls_verify: bool,

    /// Slack-compatible webhook for alerts (alerts are disabled when unset)
    #[arg(long, env = "SLACK_WEBHOOK_URL", hide_env_values = true, global = true)]
    slack_webhook_url: Option<String>,

    /// API key for the language model backend
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true, global = true)]
    openai_api_key: Option<String>,

    /// Seconds between monitor checks
    #[arg(
        long,
        env = "MONITOR_INTERVAL",
        default_value_t = DEFAULT_MONITOR_INTERVAL_SECS,
        value_parser = clap::value_parser!(u64).range(1..),
        global = true
    )]
    monitor_interval: u64,

    /// Seconds between SLO audits
    #[arg(
        long,
        env = "SLO_INTERVAL",
        default_value_t = DEFAULT_SLO_INTERVAL_SECS,
        global = true
    )]
    slo_interval: u64,

    /// Log output format
    #[arg(long, default_value = "text", global = true)]
    log_format: LogFormat,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Clone, Copy, Default, ValueEnum)]
enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// [DEFAULT] Run the monitor loop until interrupted
    Run,
    /// Run one monitor check and print the verdict
    Monitor,
    /// Run one investigation with the given incident context
    Investigate {
        /// Incident description handed to the investigator
        #[arg(long)]
        context: String,
    },
    /// Run one SLO audit and print the report
    Slo,
    /// Validate the config directory without contacting any service
    CheckConfig,
}

impl Cli {
    fn settings(&self) -> RuntimeSettings {
        RuntimeSettings {
            config_dir: self.config_dir.clone(),
            prometheus_url: self.prometheus_url.clone(),
            prometheus_skip_tls_verify: self.prometheus_skip_tls_verify,
            slack_webhook_url: self.slack_webhook_url.clone().filter(|url| !url.is_empty()),
            openai_api_key: self.openai_api_key.clone().filter(|key| !key.is_empty()),
            monitor_interval: Duration::from_secs(self.monitor_interval),
            slo_interval: Duration::from_secs(self.slo_interval),
        }
    }
}

fn init_tracing(verbose: bool, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("sre_crew=debug,notify=debug,info")
        } else {
            EnvFilter::new("info")
        }
    });

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Text => registry.with(fmt::layer()).init(),
        LogFormat::Json => registry.with(fmt::layer().json()).init(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_format);

    let settings = cli.settings();

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_loop(&settings).await,
        Commands::Monitor => {
            let orchestrator = SreOrchestrator::from_settings(&settings)?;
            let verdict = orchestrator.run_monitor().await?;
            let classification = KeywordClassifier.classify(&verdict);
            println!("{verdict}");
            println!();
            println!(
                "incident: {} ({classification})",
                classification.is_incident()
            );
            Ok(())
        }
        Commands::Investigate { context } => {
            let orchestrator = SreOrchestrator::from_settings(&settings)?;
            println!("{}", orchestrator.run_investigation(&context).await?);
            Ok(())
        }
        Commands::Slo => {
            let orchestrator = SreOrchestrator::from_settings(&settings)?;
            println!("{}", orchestrator.run_slo_check().await?);
            Ok(())
        }
        Commands::CheckConfig => check_config(&settings),
    }
}

async fn run_loop(settings: &RuntimeSettings) -> Result<()> {
    // Config errors are fatal here, before the loop starts.
    let orchestrator = SreOrchestrator::from_settings(settings)?;
    let mut control = ControlLoop::new(
        orchestrator,
        settings.monitor_interval,
        settings.slo_interval,
    );

    tokio::select! {
        () = control.run() => Ok(()),
        signal = tokio::signal::ctrl_c() => {
            signal.context("Failed to listen for shutdown signal")?;
            info!("Shutdown signal received, stopping");
            Ok(())
        }
    }
}

fn check_config(settings: &RuntimeSettings) -> Result<()> {
    let config = CrewConfig::load(&settings.config_dir).with_context(|| {
        format!(
            "Failed to load crew configuration from {}",
            settings.config_dir.display()
        )
    })?;
    config.slo_definitions_text()?;

    let problems = config.missing_entries();
    if !problems.is_empty() {
        for problem in &problems {
            eprintln!("✗ {problem}");
        }
        anyhow::bail!("{} configuration problem(s) found", problems.len());
    }

    println!("✓ Configuration in {} is valid", settings.config_dir.display());
    println!("  model: {}", config.llm().model);
    println!(
        "  alerts: {}",
        if settings.slack_webhook_url.is_some() {
            "enabled"
        } else {
            "disabled (SLACK_WEBHOOK_URL not set)"
        }
    );
    if settings.openai_api_key.is_none() {
        println!("  warning: OPENAI_API_KEY not set");
    }
    Ok(())
}
