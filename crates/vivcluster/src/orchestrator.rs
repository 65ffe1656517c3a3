//! Creature deployment lifecycle
//!
//! `deploy` validates, sweeps, checks admission and submits. Reads
//! distinguish "gone" (404) from "unknown" (any other failure); deletes treat
//! 404 as success.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{info, warn};

use crate::client::ClusterClient;
use crate::config::ClusterConfig;
use crate::error::{ClusterError, ClusterResult};
use crate::manifest::{self, CreatureSpec, CREATED_AT_LABEL, HEARTBEAT_AT_LABEL};
use crate::naming::{coerce_replicas, deployment_name, sanitize_name, validate_resource_name, Strategy};
use crate::objects::Pod;

/// Body of a deploy request; every field is loosely typed
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeployRequest {
    /// Requested creature name
    #[serde(default)]
    pub name: Value,
    /// Requested replica count
    #[serde(default)]
    pub replicas: Value,
    /// Requested update strategy
    #[serde(default)]
    pub strategy: Value,
}

/// Result of a successful deploy
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeployOutcome {
    /// Generated deployment name
    pub deployment: String,
    /// Replicas actually requested
    pub replicas: u32,
    /// Strategy actually used
    pub strategy: Strategy,
    /// Seconds before the sweep may reclaim it
    pub ttl: u64,
}

/// One pod of a deployment
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PodSummary {
    /// Pod name
    pub name: String,
    /// Lifecycle phase
    pub phase: String,
    /// Passing readiness
    pub ready: bool,
    /// Start time, absent until scheduled
    pub started: Option<String>,
    /// Restart count of the workload container
    pub restarts: u32,
}

impl From<&Pod> for PodSummary {
    fn from(pod: &Pod) -> Self {
        Self {
            name: pod.metadata.name.clone().unwrap_or_else(|| "unknown".to_string()),
            phase: pod.status.phase.clone().unwrap_or_else(|| "Unknown".to_string()),
            ready: pod.is_ready(),
            started: pod.status.start_time.clone(),
            restarts: pod.restarts(),
        }
    }
}

/// Status of a deployment and its pods
///
/// `exists` is `Some(false)` only for a 404. When the deployment could not
/// be fetched for any other reason it is `None` and `error` says why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentStatus {
    /// Deployment name
    pub deployment: String,
    /// Whether the deployment exists, when known
    pub exists: Option<bool>,
    /// Declared replicas
    pub replicas: u32,
    /// Ready replicas
    pub ready_replicas: u32,
    /// Pods matching the deployment selector
    pub pods: Vec<PodSummary>,
    /// Why the deployment could not be fetched
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Usage of one pod
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PodMetric {
    /// Pod name
    pub pod_name: String,
    /// CPU quantity, e.g. `3m`
    pub cpu: String,
    /// Memory quantity, e.g. `4Mi`
    pub memory: String,
}

/// Result of a teardown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TeardownOutcome {
    /// The deployment was already gone
    pub already_gone: bool,
}

/// Result of a heartbeat
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeartbeatOutcome {
    /// Deployment name
    pub deployment: String,
    /// Idle lifetime in seconds
    pub ttl: u64,
    /// Earliest time the sweep may reclaim it, RFC 3339
    pub expires_at: String,
}

/// Current unix time in seconds
pub(crate) fn now_secs() -> i64 {
    Utc::now().timestamp()
}

fn rfc3339(secs: i64) -> String {
    DateTime::<Utc>::from_timestamp(secs, 0)
        .map(|t| t.to_rfc3339())
        .unwrap_or_default()
}

/// Deploys and manages creature workloads
#[derive(Debug, Clone)]
pub struct Orchestrator {
    pub(crate) client: ClusterClient,
    pub(crate) config: ClusterConfig,
}

impl Orchestrator {
    /// Create an orchestrator
    pub fn new(config: ClusterConfig) -> ClusterResult<Self> {
        let client = ClusterClient::new(&config)?;
        Ok(Self { client, config })
    }

    /// Settings in use
    pub fn config(&self) -> &ClusterConfig {
        &self.config
    }

    /// Validate, sweep, check admission and submit a new deployment
    pub async fn deploy(&self, request: &DeployRequest) -> ClusterResult<DeployOutcome> {
        let raw_name = match &request.name {
            Value::String(s) => s.trim().to_string(),
            Value::Number(n) => n.to_string(),
            _ => String::new(),
        };
        if raw_name.is_empty() {
            return Err(ClusterError::InvalidRequest("Missing creature name".to_string()));
        }
        let replicas = coerce_replicas(&request.replicas, self.config.max_replicas);
        let strategy = Strategy::coerce(&request.strategy);

        if let Err(e) = self.sweep().await {
            warn!("Pre-deploy sweep failed: {}", e);
        }

        let running = self.client.list_pods(None).await?.len();
        if running + replicas as usize > self.config.max_pods {
            warn!(
                "Admission rejected: {} running + {} requested > {}",
                running, replicas, self.config.max_pods
            );
            return Err(ClusterError::CapacityExceeded {
                running,
                requested: replicas,
                ceiling: self.config.max_pods,
            });
        }

        let slug = sanitize_name(&raw_name);
        let name = deployment_name(&slug);
        let spec = CreatureSpec {
            name: &name,
            slug: &slug,
            display_name: &raw_name,
            replicas,
            strategy,
            created_at: now_secs(),
            ttl_secs: self.config.ttl_secs,
        };

        self.client
            .create_deployment(&spec.to_manifest(self.client.namespace()))
            .await
            .map_err(|e| {
                warn!("Create of {} failed: {}", name, e);
                e
            })?;
        info!("Deployed {} ({} x {})", name, replicas, strategy);

        Ok(DeployOutcome {
            deployment: name,
            replicas,
            strategy,
            ttl: self.config.ttl_secs,
        })
    }

    /// Pods and replica counts of a deployment
    ///
    /// Kicks off a background sweep without waiting for it. A failed pod list
    /// is an error; a failed deployment fetch is reported in the status.
    pub async fn status(&self, deployment: &str) -> ClusterResult<DeploymentStatus> {
        validate_resource_name(deployment)?;
        self.spawn_sweep();

        let pods = self
            .client
            .list_pods(Some(&manifest::deployment_selector(deployment)))
            .await?;

        let mut status = DeploymentStatus {
            deployment: deployment.to_string(),
            exists: Some(true),
            replicas: 0,
            ready_replicas: 0,
            pods: pods.iter().map(PodSummary::from).collect(),
            error: None,
        };

        match self.client.get_deployment(deployment).await {
            Ok(found) => {
                status.replicas = found.spec.replicas;
                status.ready_replicas = found.status.ready_replicas;
            }
            Err(e) if e.is_not_found() => status.exists = Some(false),
            Err(e) => {
                warn!("Status of {}: deployment fetch failed: {}", deployment, e);
                status.exists = None;
                status.error = Some(e.to_string());
            }
        }

        Ok(status)
    }

    /// Usage of a deployment's pods; empty on any upstream failure
    pub async fn metrics(&self, deployment: &str) -> ClusterResult<Vec<PodMetric>> {
        validate_resource_name(deployment)?;

        match self
            .client
            .pod_metrics(&manifest::deployment_selector(deployment))
            .await
        {
            Ok(items) => Ok(items
                .iter()
                .map(|m| PodMetric {
                    pod_name: m.metadata.name.clone().unwrap_or_default(),
                    cpu: m.usage("cpu").unwrap_or("0m").to_string(),
                    memory: m.usage("memory").unwrap_or("0Mi").to_string(),
                })
                .collect()),
            Err(e) => {
                warn!("Metrics for {} unavailable: {}", deployment, e);
                Ok(Vec::new())
            }
        }
    }

    /// Delete one pod so its controller replaces it; an absent pod counts as restarted
    pub async fn restart_pod(&self, pod: &str) -> ClusterResult<()> {
        validate_resource_name(pod)?;
        match self.client.delete_pod(pod).await {
            Ok(()) => {
                info!("Restarted pod {}", pod);
                Ok(())
            }
            Err(e) if e.is_not_found() => {
                info!("Pod {} already gone", pod);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Delete a deployment; an absent deployment counts as deleted
    pub async fn teardown(&self, deployment: &str) -> ClusterResult<TeardownOutcome> {
        validate_resource_name(deployment)?;
        match self.client.delete_deployment(deployment).await {
            Ok(()) => {
                info!("Tore down {}", deployment);
                Ok(TeardownOutcome { already_gone: false })
            }
            Err(e) if e.is_not_found() => Ok(TeardownOutcome { already_gone: true }),
            Err(e) => Err(e),
        }
    }

    /// Record viewer activity so the idle sweep leaves the deployment alone
    pub async fn heartbeat(&self, deployment: &str) -> ClusterResult<HeartbeatOutcome> {
        validate_resource_name(deployment)?;
        let now = now_secs();

        let mut labels = BTreeMap::new();
        labels.insert(HEARTBEAT_AT_LABEL, now.to_string());
        let updated = self.client.patch_deployment_labels(deployment, &labels).await?;

        let idle_deadline = now + self.config.ttl_secs as i64;
        let expires_at = updated
            .metadata
            .labels
            .get(CREATED_AT_LABEL)
            .and_then(|v| v.parse::<i64>().ok())
            .map(|created| idle_deadline.min(created + self.config.max_lifetime_secs as i64))
            .unwrap_or(idle_deadline);

        info!("Heartbeat for {}", deployment);
        Ok(HeartbeatOutcome {
            deployment: deployment.to_string(),
            ttl: self.config.ttl_secs,
            expires_at: rfc3339(expires_at),
        })
    }
}
