//! Response bodies that are not a library type serialized as-is

use serde::{Deserialize, Serialize};

use vivcluster::PodMetric;

/// GET /health
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always `ok`
    pub status: String,
    /// Service name
    pub service: String,
    /// Crate version
    pub version: String,
}

impl HealthResponse {
    /// Health of this build
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            service: "vivserve".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// DELETE /k8s/deploy/:name
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeletedResponse {
    /// Always true; a missing deployment counts as deleted
    pub deleted: bool,
    /// Set when nothing was left to delete
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl DeletedResponse {
    /// Deployment was removed now
    pub fn removed() -> Self {
        Self {
            deleted: true,
            message: None,
        }
    }

    /// Deployment was already gone
    pub fn already_gone() -> Self {
        Self {
            deleted: true,
            message: Some("Already gone".to_string()),
        }
    }
}

/// DELETE /k8s/pods/:pod
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestartedResponse {
    /// Always true; a missing pod counts as restarted
    pub restarted: bool,
}

/// GET /k8s/pod-metrics
#[derive(Debug, Clone, Serialize)]
pub struct MetricsResponse {
    /// Usage per pod, empty when metrics are unavailable
    pub metrics: Vec<PodMetric>,
}
