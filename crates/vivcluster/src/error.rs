//! Orchestrator error types

use thiserror::Error;

/// Result type for cluster operations
pub type ClusterResult<T> = Result<T, ClusterError>;

/// Cluster operation failures
#[derive(Debug, Error)]
pub enum ClusterError {
    /// The caller's request is unusable
    #[error("{0}")]
    InvalidRequest(String),

    /// Admitting the request would exceed the namespace pod ceiling
    #[error("Cluster is busy: {running} pods running. Try fewer replicas or wait.")]
    CapacityExceeded {
        /// Pods currently in the namespace
        running: usize,
        /// Replicas requested
        requested: u32,
        /// Namespace pod ceiling
        ceiling: usize,
    },

    /// The API answered 404
    #[error("{kind} '{name}' not found")]
    NotFound {
        /// Object kind
        kind: &'static str,
        /// Object name
        name: String,
    },

    /// The API answered with a non-success status
    #[error("cluster API returned {status}: {body}")]
    Api {
        /// HTTP status
        status: u16,
        /// Response body preview
        body: String,
    },

    /// The API could not be reached
    #[error("cluster API unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    /// The API answered with an undecodable body
    #[error("undecodable cluster API response: {0}")]
    Decode(String),
}

impl ClusterError {
    /// True for a 404 from the API
    pub fn is_not_found(&self) -> bool {
        matches!(self, ClusterError::NotFound { .. })
    }
}
