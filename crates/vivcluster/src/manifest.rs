//! Creature Deployment manifest and ownership labels

use serde_json::{json, Value};

use crate::naming::Strategy;

/// Label marking objects owned by this service
pub const APP_LABEL: &str = "app";

/// Value of [`APP_LABEL`]
pub const APP_VALUE: &str = "creature";

/// Label carrying the sanitised creature name
pub const NAME_LABEL: &str = "creature-name";

/// Label carrying the creation time in unix seconds
pub const CREATED_AT_LABEL: &str = "created-at";

/// Label carrying the last heartbeat in unix seconds
pub const HEARTBEAT_AT_LABEL: &str = "heartbeat-at";

/// Label tying pods to their deployment
pub const DEPLOYMENT_LABEL: &str = "creature-deployment";

/// Placeholder workload image
pub const WORKLOAD_IMAGE: &str = "busybox:latest";

/// Selector matching every deployment this service owns
pub fn ownership_selector() -> String {
    format!("{}={}", APP_LABEL, APP_VALUE)
}

/// Selector matching the pods of one deployment
pub fn deployment_selector(deployment: &str) -> String {
    format!("{}={}", DEPLOYMENT_LABEL, deployment)
}

/// Everything needed to build a creature Deployment
#[derive(Debug, Clone)]
pub struct CreatureSpec<'a> {
    /// Generated deployment name
    pub name: &'a str,
    /// Sanitised creature name
    pub slug: &'a str,
    /// Name as the caller typed it
    pub display_name: &'a str,
    /// Clamped replica count
    pub replicas: u32,
    /// Update strategy
    pub strategy: Strategy,
    /// Creation time in unix seconds
    pub created_at: i64,
    /// Seconds the placeholder workload sleeps
    pub ttl_secs: u64,
}

impl CreatureSpec<'_> {
    /// The `apps/v1` Deployment object
    ///
    /// The display name reaches the container as a positional shell
    /// argument and is never spliced into the script.
    pub fn to_manifest(&self, namespace: &str) -> Value {
        let mut strategy = json!({"type": self.strategy.as_str()});
        if self.strategy == Strategy::RollingUpdate {
            strategy["rollingUpdate"] = json!({"maxUnavailable": 0, "maxSurge": 1});
        }

        let script = format!("echo \"creature $1 alive\" && sleep {}", self.ttl_secs);

        json!({
            "apiVersion": "apps/v1",
            "kind": "Deployment",
            "metadata": {
                "name": self.name,
                "namespace": namespace,
                "labels": {
                    APP_LABEL: APP_VALUE,
                    NAME_LABEL: self.slug,
                    CREATED_AT_LABEL: self.created_at.to_string(),
                }
            },
            "spec": {
                "replicas": self.replicas,
                "strategy": strategy,
                "selector": {
                    "matchLabels": { DEPLOYMENT_LABEL: self.name }
                },
                "template": {
                    "metadata": {
                        "labels": {
                            APP_LABEL: APP_VALUE,
                            DEPLOYMENT_LABEL: self.name,
                            NAME_LABEL: self.slug,
                        }
                    },
                    "spec": {
                        "containers": [{
                            "name": "creature",
                            "image": WORKLOAD_IMAGE,
                            "command": ["sh", "-c", script, "creature", self.display_name],
                            "resources": {
                                "requests": {"cpu": "5m", "memory": "8Mi"},
                                "limits": {"cpu": "10m", "memory": "16Mi"}
                            }
                        }]
                    }
                }
            }
        })
    }
}
