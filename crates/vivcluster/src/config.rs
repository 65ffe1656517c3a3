//! Cluster orchestrator settings

use serde::{Deserialize, Serialize};

/// Default cluster API base URL
pub const DEFAULT_API_URL: &str = "https://127.0.0.1:6443";

/// Default namespace creatures are deployed into
pub const DEFAULT_NAMESPACE: &str = "creatures";

/// Default namespace pod ceiling
pub const DEFAULT_MAX_PODS: usize = 30;

/// Default replica ceiling per deployment
pub const DEFAULT_MAX_REPLICAS: u32 = 6;

/// Default deployment TTL in seconds
pub const DEFAULT_TTL_SECS: u64 = 600;

/// Default interval between periodic sweeps in seconds
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 60;

/// Default per-request timeout in milliseconds
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;

/// Cluster API and lifecycle settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    /// Cluster API base URL
    pub api_url: String,

    /// Bearer token
    #[serde(skip_serializing)]
    pub token: String,

    /// Namespace all creature objects live in
    pub namespace: String,

    /// Pod ceiling enforced at admission
    pub max_pods: usize,

    /// Replica ceiling per deployment
    pub max_replicas: u32,

    /// Idle lifetime in seconds before the sweep reclaims a deployment
    pub ttl_secs: u64,

    /// Hard lifetime in seconds measured from creation, heartbeats notwithstanding
    pub max_lifetime_secs: u64,

    /// Seconds between periodic sweeps
    pub sweep_interval_secs: u64,

    /// Per-request timeout in milliseconds
    pub request_timeout_ms: u64,

    /// Accept self-signed cluster certificates
    pub accept_invalid_certs: bool,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            token: String::new(),
            namespace: DEFAULT_NAMESPACE.to_string(),
            max_pods: DEFAULT_MAX_PODS,
            max_replicas: DEFAULT_MAX_REPLICAS,
            ttl_secs: DEFAULT_TTL_SECS,
            max_lifetime_secs: DEFAULT_TTL_SECS * 3,
            sweep_interval_secs: DEFAULT_SWEEP_INTERVAL_SECS,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            accept_invalid_certs: false,
        }
    }
}

impl ClusterConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.api_url.is_empty() {
            return Err("Cluster API URL cannot be empty".to_string());
        }
        if self.namespace.is_empty() {
            return Err("Cluster namespace cannot be empty".to_string());
        }
        if self.max_replicas == 0 {
            return Err("Max replicas must be greater than zero".to_string());
        }
        if self.ttl_secs == 0 {
            return Err("Deployment TTL must be greater than zero".to_string());
        }
        if self.max_lifetime_secs < self.ttl_secs {
            return Err(format!(
                "Max lifetime ({}s) cannot be shorter than the TTL ({}s)",
                self.max_lifetime_secs, self.ttl_secs
            ));
        }
        if self.sweep_interval_secs == 0 {
            return Err("Sweep interval must be greater than zero".to_string());
        }
        if self.request_timeout_ms == 0 {
            return Err("Cluster request timeout must be greater than zero".to_string());
        }
        Ok(())
    }
}
