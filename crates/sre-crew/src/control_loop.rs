//! Fixed-interval control loop.
//!
//! Every tick runs a monitor check, investigates when the verdict looks like an
//! incident, and runs an SLO audit when one is due. The three operations are
//! guarded independently: a failure in one is logged and never stops the
//! others or the loop. Operations run strictly one after another.

use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{error, info, warn};

use crate::classifier::{HealthClassification, HealthClassifier, KeywordClassifier};
use crate::orchestrator::SreOperations;

/// Which part of the cycle the loop is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoopPhase {
    #[default]
    Monitoring,
    Investigating,
}

/// State carried from one tick to the next.
#[derive(Debug, Clone, Default)]
pub struct LoopState {
    pub phase: LoopPhase,
    /// Start of the tick whose SLO audit last succeeded
    pub last_slo_check: Option<Instant>,
}

impl LoopState {
    /// An audit is due if none has succeeded yet or more than `interval` has
    /// passed since the last success.
    pub fn slo_due(&self, now: Instant, interval: Duration) -> bool {
        match self.last_slo_check {
            None => true,
            Some(last) => now.saturating_duration_since(last) > interval,
        }
    }
}

/// What happened to the monitor half of a tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MonitorOutcome {
    /// The verdict was healthy; nothing else ran
    Healthy(HealthClassification),
    /// The verdict was an incident and an investigation ran
    Incident {
        classification: HealthClassification,
        /// Whether the investigation completed without a fault
        investigation_ok: bool,
    },
    /// The monitor check itself failed; no investigation
    Failed,
}

/// What happened to the SLO half of a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SloOutcome {
    NotDue,
    Completed,
    Failed,
}

/// Result of one tick, for logging and tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickReport {
    pub monitor: MonitorOutcome,
    pub slo: SloOutcome,
}

/// The monitor/investigate/audit loop.
pub struct ControlLoop<O, C = KeywordClassifier> {
    operations: O,
    classifier: C,
    monitor_interval: Duration,
    slo_interval: Duration,
    state: LoopState,
    phase_tx: watch::Sender<LoopPhase>,
}

impl<O: SreOperations> ControlLoop<O, KeywordClassifier> {
    /// Loop with the default keyword classifier.
    pub fn new(operations: O, monitor_interval: Duration, slo_interval: Duration) -> Self {
        Self::with_classifier(operations, KeywordClassifier, monitor_interval, slo_interval)
    }
}

impl<O: SreOperations, C: HealthClassifier> ControlLoop<O, C> {
    pub fn with_classifier(
        operations: O,
        classifier: C,
        monitor_interval: Duration,
        slo_interval: Duration,
    ) -> Self {
        Self {
            operations,
            classifier,
            monitor_interval,
            slo_interval,
            state: LoopState::default(),
            phase_tx: watch::Sender::new(LoopPhase::default()),
        }
    }

    /// Follow phase changes from another task, e.g. a readiness probe.
    pub fn subscribe_phase(&self) -> watch::Receiver<LoopPhase> {
        self.phase_tx.subscribe()
    }

    fn set_phase(&mut self, phase: LoopPhase) {
        self.state.phase = phase;
        self.phase_tx.send_replace(phase);
    }

    pub fn state(&self) -> &LoopState {
        &self.state
    }

    pub fn operations(&self) -> &O {
        &self.operations
    }

    /// Run forever: tick, then sleep for the monitor interval.
    pub async fn run(&mut self) {
        info!(
            monitor_interval_secs = self.monitor_interval.as_secs(),
            slo_interval_secs = self.slo_interval.as_secs(),
            "SRE autonomous crew started"
        );

        loop {
            self.tick(Instant::now()).await;
            tokio::time::sleep(self.monitor_interval).await;
        }
    }

    /// One iteration. `now` is the tick start, used for SLO scheduling.
    pub async fn tick(&mut self, now: Instant) -> TickReport {
        let monitor = self.monitor_step().await;
        let slo = self.slo_step(now).await;
        TickReport { monitor, slo }
    }

    async fn monitor_step(&mut self) -> MonitorOutcome {
        info!("Running monitor check");

        let output = match self.operations.run_monitor().await {
            Ok(output) => output,
            Err(e) => {
                error!(error = %format!("{e:#}"), "Monitor check failed");
                return MonitorOutcome::Failed;
            }
        };

        info!(output = %output, "Monitor output");

        let classification = self.classifier.classify(&output);
        if !classification.is_incident() {
            info!("System healthy, no action taken");
            return MonitorOutcome::Healthy(classification);
        }

        warn!(
            anomaly = classification.anomaly,
            error = classification.error,
            unclear = classification.unclear,
            "Incident detected, triggering investigator"
        );

        self.set_phase(LoopPhase::Investigating);
        let investigation_ok = match self.operations.run_investigation(&output).await {
            Ok(result) => {
                info!(result = %result, "Investigation finished");
                true
            }
            Err(e) => {
                error!(error = %format!("{e:#}"), "Investigation failed");
                false
            }
        };
        self.set_phase(LoopPhase::Monitoring);

        MonitorOutcome::Incident {
            classification,
            investigation_ok,
        }
    }

    async fn slo_step(&mut self, now: Instant) -> SloOutcome {
        if !self.state.slo_due(now, self.slo_interval) {
            return SloOutcome::NotDue;
        }

        info!("Running scheduled SLO audit");
        match self.operations.run_slo_check().await {
            Ok(report) => {
                info!(report = %report, "SLO report");
                self.state.last_slo_check = Some(now);
                SloOutcome::Completed
            }
            Err(e) => {
                error!(error = %format!("{e:#}"), "SLO audit failed");
                SloOutcome::Failed
            }
        }
    }
}
