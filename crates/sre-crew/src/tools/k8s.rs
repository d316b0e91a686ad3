//! Kubernetes mutation tools: rolling restarts and StatefulSet scaling.
//!
//! Credentials are resolved lazily on the first mutation: in-cluster service
//! account first, local kubeconfig second. A resolved client is cached for the
//! life of the process; a failed resolution is retried on the next call.

use std::fmt;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use k8s_openapi::api::apps::v1::{Deployment, StatefulSet};
use kube::api::{Api, Patch, PatchParams};
use kube::config::KubeConfigOptions;
use kube::{Client, Config};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use super::{parse_arguments, Tool};

/// Pod template annotation that `kubectl rollout restart` bumps
pub const RESTARTED_AT_ANNOTATION: &str = "kubectl.kubernetes.io/restartedAt";

const DEFAULT_REPLICAS: i32 = 3;

const TARGET_FORMAT_ERROR: &str = "Error: Target must be 'namespace/name'";

/// A namespaced workload reference parsed from `namespace/name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkloadTarget {
    pub namespace: String,
    pub name: String,
}

impl WorkloadTarget {
    /// Parse `namespace/name`. Anything else (no slash, extra slashes, empty
    /// parts) is rejected.
    pub fn parse(raw: &str) -> Option<Self> {
        let (namespace, name) = raw.trim().split_once('/')?;
        if namespace.is_empty() || name.is_empty() || name.contains('/') {
            return None;
        }
        Some(Self {
            namespace: namespace.to_string(),
            name: name.to_string(),
        })
    }
}

impl fmt::Display for WorkloadTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// Cluster operations the mutation tools need.
#[async_trait]
pub trait WorkloadApi: Send + Sync {
    /// Trigger a rolling restart of a Deployment.
    async fn restart_deployment(
        &self,
        target: &WorkloadTarget,
        restarted_at: DateTime<Utc>,
    ) -> Result<()>;

    /// Set the desired replica count of a StatefulSet.
    async fn scale_stateful_set(&self, target: &WorkloadTarget, replicas: i32) -> Result<()>;
}

/// [`WorkloadApi`] backed by the Kubernetes API.
#[derive(Default)]
pub struct KubeWorkloads {
    client: OnceCell<Client>,
}

impl KubeWorkloads {
    pub fn new() -> Self {
        Self::default()
    }

    async fn client(&self) -> Result<Client> {
        self.client
            .get_or_try_init(resolve_client)
            .await
            .cloned()
    }
}

/// In-cluster credentials first, kubeconfig second; the first that loads wins.
async fn resolve_client() -> Result<Client> {
    let config = match Config::incluster() {
        Ok(config) => {
            debug!("Using in-cluster Kubernetes credentials");
            config
        }
        Err(e) => {
            debug!(error = %e, "In-cluster credentials unavailable, falling back to kubeconfig");
            Config::from_kubeconfig(&KubeConfigOptions::default())
                .await
                .context("Failed to load Kubernetes credentials (in-cluster and kubeconfig)")?
        }
    };

    Client::try_from(config).context("Failed to create Kubernetes client")
}

/// Merge patch bumping the pod template annotation, which rolls every pod.
fn restart_patch(restarted_at: DateTime<Utc>) -> Value {
    json!({
        "spec": {
            "template": {
                "metadata": {
                    "annotations": {
                        RESTARTED_AT_ANNOTATION: restarted_at.to_rfc3339()
                    }
                }
            }
        }
    })
}

/// Merge patch setting the desired replica count.
fn scale_patch(replicas: i32) -> Value {
    json!({ "spec": { "replicas": replicas } })
}

#[async_trait]
impl WorkloadApi for KubeWorkloads {
    async fn restart_deployment(
        &self,
        target: &WorkloadTarget,
        restarted_at: DateTime<Utc>,
    ) -> Result<()> {
        let deployments: Api<Deployment> = Api::namespaced(self.client().await?, &target.namespace);
        let patch = restart_patch(restarted_at);

        deployments
            .patch(&target.name, &PatchParams::default(), &Patch::Merge(&patch))
            .await
            .with_context(|| format!("Failed to patch Deployment {target}"))?;
        Ok(())
    }

    async fn scale_stateful_set(&self, target: &WorkloadTarget, replicas: i32) -> Result<()> {
        let stateful_sets: Api<StatefulSet> =
            Api::namespaced(self.client().await?, &target.namespace);
        let patch = scale_patch(replicas);

        stateful_sets
            .patch(&target.name, &PatchParams::default(), &Patch::Merge(&patch))
            .await
            .with_context(|| format!("Failed to patch StatefulSet {target}"))?;
        Ok(())
    }
}

fn target_schema() -> Value {
    json!({
        "type": "string",
        "description": "Target in 'namespace/name' format (e.g. 'default/rabbitmq')"
    })
}

#[derive(Debug, Deserialize)]
struct ScaleArgs {
    target: String,
    #[serde(default = "default_replicas")]
    replicas: i32,
}

fn default_replicas() -> i32 {
    DEFAULT_REPLICAS
}

/// Scales a StatefulSet to a replica count.
pub struct ScaleStatefulSetTool {
    workloads: Arc<dyn WorkloadApi>,
}

impl ScaleStatefulSetTool {
    pub fn new(workloads: Arc<dyn WorkloadApi>) -> Self {
        Self { workloads }
    }
}

#[async_trait]
impl Tool for ScaleStatefulSetTool {
    fn name(&self) -> &'static str {
        "ScaleStatefulSet"
    }

    fn description(&self) -> &'static str {
        "Scales a Kubernetes StatefulSet to a specific number of replicas. Input: 'namespace/name' and count."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "target": target_schema(),
                "replicas": {
                    "type": "integer",
                    "minimum": 0,
                    "default": DEFAULT_REPLICAS,
                    "description": "The desired number of replicas"
                }
            },
            "required": ["target"]
        })
    }

    async fn invoke(&self, arguments: Value) -> String {
        let args: ScaleArgs = match parse_arguments(self.name(), arguments) {
            Ok(args) => args,
            Err(message) => return message,
        };

        let Some(target) = WorkloadTarget::parse(&args.target) else {
            return TARGET_FORMAT_ERROR.to_string();
        };

        if args.replicas < 0 {
            return format!("Error: replicas must be non-negative, got {}", args.replicas);
        }

        match self.workloads.scale_stateful_set(&target, args.replicas).await {
            Ok(()) => {
                info!(target = %target, replicas = args.replicas, "Scaled StatefulSet");
                format!(
                    "Successfully scaled StatefulSet '{}' in '{}' to {} replicas.",
                    target.name, target.namespace, args.replicas
                )
            }
            Err(e) => {
                warn!(target = %target, error = %e, "StatefulSet scaling failed");
                format!("Scaling Error: {e:#}")
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct RestartArgs {
    target: String,
}

/// Forces a rolling restart of a Deployment.
pub struct RestartDeploymentTool {
    workloads: Arc<dyn WorkloadApi>,
}

impl RestartDeploymentTool {
    pub fn new(workloads: Arc<dyn WorkloadApi>) -> Self {
        Self { workloads }
    }
}

#[async_trait]
impl Tool for RestartDeploymentTool {
    fn name(&self) -> &'static str {
        "RestartDeployment"
    }

    fn description(&self) -> &'static str {
        "Performs a rolling restart of a Kubernetes Deployment. Input: 'namespace/name'."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": { "target": target_schema() },
            "required": ["target"]
        })
    }

    async fn invoke(&self, arguments: Value) -> String {
        let args: RestartArgs = match parse_arguments(self.name(), arguments) {
            Ok(args) => args,
            Err(message) => return message,
        };

        let Some(target) = WorkloadTarget::parse(&args.target) else {
            return TARGET_FORMAT_ERROR.to_string();
        };

        match self.workloads.restart_deployment(&target, Utc::now()).await {
            Ok(()) => {
                info!(target = %target, "Restarted Deployment");
                format!(
                    "Successfully restarted Deployment '{}' in '{}'.",
                    target.name, target.namespace
                )
            }
            Err(e) => {
                warn!(target = %target, error = %e, "Deployment restart failed");
                format!("Restart Error: {e:#}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serial_test::serial;

    #[test]
    fn test_parse_valid_target() {
        assert_eq!(
            WorkloadTarget::parse(" default/rabbitmq "),
            Some(WorkloadTarget {
                namespace: "default".to_string(),
                name: "rabbitmq".to_string(),
            })
        );
    }

    #[test]
    fn test_parse_rejects_malformed_targets() {
        for raw in ["default", "", "/api", "default/", "a/b/c"] {
            assert_eq!(WorkloadTarget::parse(raw), None, "{raw:?}");
        }
    }

    #[test]
    fn test_target_display_round_trips() {
        let target = WorkloadTarget::parse("payments/api").unwrap();
        assert_eq!(target.to_string(), "payments/api");
    }

    #[test]
    fn test_scale_schema_defaults_to_three() {
        let tool = ScaleStatefulSetTool::new(Arc::new(KubeWorkloads::new()));
        assert_eq!(tool.parameters()["properties"]["replicas"]["default"], 3);
    }

    #[test]
    fn test_restart_patch_targets_pod_template() {
        let at = Utc.with_ymd_and_hms(2026, 10, 16, 12, 30, 0).unwrap();

        assert_eq!(
            restart_patch(at),
            json!({
                "spec": {
                    "template": {
                        "metadata": {
                            "annotations": {
                                "kubectl.kubernetes.io/restartedAt": "2026-10-16T12:30:00+00:00"
                            }
                        }
                    }
                }
            })
        );
    }

    #[test]
    fn test_scale_patch_sets_spec_replicas() {
        assert_eq!(scale_patch(5), json!({"spec": {"replicas": 5}}));
        assert_eq!(scale_patch(0), json!({"spec": {"replicas": 0}}));
    }

    const KUBECONFIG: &str = r"
apiVersion: v1
kind: Config
clusters:
- name: local
  cluster:
    server: http://127.0.0.1:6443
users:
- name: local
  user:
    token: test-token
contexts:
- name: local
  context:
    cluster: local
    user: local
current-context: local
";

    /// Outside a pod: no service host, kubeconfig at `path`.
    fn outside_cluster(path: &std::path::Path) {
        std::env::remove_var("KUBERNETES_SERVICE_HOST");
        std::env::remove_var("KUBERNETES_SERVICE_PORT");
        std::env::set_var("KUBECONFIG", path);
    }

    #[tokio::test]
    #[serial]
    async fn test_kubeconfig_used_outside_cluster() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config");
        std::fs::write(&path, KUBECONFIG).unwrap();
        outside_cluster(&path);

        let client = resolve_client().await;

        std::env::remove_var("KUBECONFIG");
        if let Err(e) = client {
            panic!("kubeconfig should resolve: {e:#}");
        }
    }

    #[tokio::test]
    #[serial]
    async fn test_missing_credentials_fail_then_retry() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config");
        outside_cluster(&path);
        let workloads = KubeWorkloads::new();

        let Err(err) = workloads.client().await else {
            panic!("resolution should fail without credentials");
        };
        assert!(
            format!("{err:#}").contains("in-cluster and kubeconfig"),
            "{err:#}"
        );

        std::fs::write(&path, KUBECONFIG).unwrap();
        let retried = workloads.client().await;

        std::env::remove_var("KUBECONFIG");
        assert!(retried.is_ok());
    }
}
