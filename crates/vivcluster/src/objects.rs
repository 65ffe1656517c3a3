//! Typed views of the cluster API objects the orchestrator reads
//!
//! Only the fields the orchestrator looks at are modelled; every field is
//! optional or defaulted so partial objects still decode.

use serde::Deserialize;
use std::collections::BTreeMap;

/// `{items: [...]}` list envelope
#[derive(Debug, Clone, Deserialize)]
pub struct ObjectList<T> {
    /// List items
    #[serde(default)]
    pub items: Vec<T>,
}

/// Object metadata
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ObjectMeta {
    /// Object name
    pub name: Option<String>,
    /// Labels
    pub labels: BTreeMap<String, String>,
}

/// Pod
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Pod {
    /// Metadata
    pub metadata: ObjectMeta,
    /// Observed status
    pub status: PodStatus,
}

/// Pod status
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PodStatus {
    /// Lifecycle phase
    pub phase: Option<String>,
    /// Conditions such as `Ready`
    pub conditions: Vec<PodCondition>,
    /// RFC 3339 start time
    pub start_time: Option<String>,
    /// Per-container status
    pub container_statuses: Vec<ContainerStatus>,
}

/// Pod condition
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PodCondition {
    /// Condition type
    #[serde(rename = "type")]
    pub kind: String,
    /// `"True"`, `"False"` or `"Unknown"`
    pub status: String,
}

/// Container status
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ContainerStatus {
    /// Restarts so far
    pub restart_count: u32,
}

impl Pod {
    /// True when the `Ready` condition is `"True"`
    pub fn is_ready(&self) -> bool {
        self.status
            .conditions
            .iter()
            .any(|c| c.kind == "Ready" && c.status == "True")
    }

    /// Restart count of the first container
    pub fn restarts(&self) -> u32 {
        self.status
            .container_statuses
            .first()
            .map(|c| c.restart_count)
            .unwrap_or(0)
    }
}

/// Deployment
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Deployment {
    /// Metadata
    pub metadata: ObjectMeta,
    /// Desired state
    pub spec: DeploymentSpec,
    /// Observed state
    pub status: DeploymentStatusView,
}

/// Deployment desired state
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DeploymentSpec {
    /// Declared replica count
    pub replicas: u32,
}

/// Deployment observed state
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DeploymentStatusView {
    /// Replicas passing readiness
    pub ready_replicas: u32,
}

/// Pod metrics from the metrics API
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PodMetrics {
    /// Metadata
    pub metadata: ObjectMeta,
    /// Per-container usage
    pub containers: Vec<ContainerMetrics>,
}

/// Container usage
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ContainerMetrics {
    /// Resource quantities keyed by `cpu` and `memory`
    pub usage: BTreeMap<String, String>,
}

impl PodMetrics {
    /// Usage of `resource` in the first container
    pub fn usage(&self, resource: &str) -> Option<&str> {
        self.containers
            .first()
            .and_then(|c| c.usage.get(resource))
            .map(String::as_str)
    }
}
