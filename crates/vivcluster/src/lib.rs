//! vivcluster - Creature Deployments
//!
//! Short-lived creature workloads on a Kubernetes-style cluster: name
//! sanitisation, best-effort admission control against a namespace pod
//! ceiling, manifest construction, status and metrics queries, idempotent
//! restart and teardown, and a TTL sweep that reclaims expired deployments.

#![warn(missing_docs)]
#![warn(unused_extern_crates)]

/// Cluster API client
pub mod client;

/// Orchestrator settings
pub mod config;

/// Error types
pub mod error;

/// Deployment manifest and ownership labels
pub mod manifest;

/// Request validation and naming
pub mod naming;

/// Typed views of cluster API objects
pub mod objects;

/// Deploy, status, metrics, restart, teardown and heartbeat
pub mod orchestrator;

/// TTL garbage collection
pub mod sweep;

pub use client::ClusterClient;
pub use config::ClusterConfig;
pub use error::{ClusterError, ClusterResult};
pub use naming::{coerce_replicas, sanitize_name, validate_resource_name, Strategy};
pub use orchestrator::{
    DeployOutcome, DeployRequest, DeploymentStatus, HeartbeatOutcome, Orchestrator, PodMetric,
    PodSummary, TeardownOutcome,
};
pub use sweep::{LeaseState, SweepReport};
