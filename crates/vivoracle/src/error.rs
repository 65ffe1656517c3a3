//! Model caller and pipeline error types

use thiserror::Error;

/// Result type for pipeline operations
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Why a model call produced no reply
#[derive(Debug, Error)]
pub enum CallError {
    /// The per-attempt deadline elapsed; remaining models were not tried
    #[error("model '{model}' timed out after {timeout_ms} ms")]
    TimedOut {
        /// Model that was in flight
        model: String,
        /// Deadline that elapsed
        timeout_ms: u64,
    },

    /// Every model in every attempt failed
    #[error("no usable reply after {attempts} attempt(s) across {models} model(s)")]
    Exhausted {
        /// Outer attempts made
        attempts: u32,
        /// Models tried per attempt
        models: usize,
    },

    /// The HTTP client could not be constructed
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

impl CallError {
    /// True when the upstream was slow rather than wrong
    pub fn is_timeout(&self) -> bool {
        matches!(self, CallError::TimedOut { .. })
    }
}

/// Sprite pipeline failures surfaced to the caller
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Prompt missing or too long
    #[error("Bad prompt: {0}")]
    InvalidPrompt(String),

    /// Animation input missing a palette or shapes
    #[error("Bad sprite data: {0}")]
    InvalidSprite(String),

    /// The structure stage got no reply from any model
    #[error("structure stage unavailable: {0}")]
    StructureUnavailable(#[source] CallError),

    /// The structure stage replied with too few drawable shapes
    #[error("structure stage returned {found} shape(s), need at least {minimum}")]
    TooFewShapes {
        /// Shapes that decoded
        found: usize,
        /// Required minimum
        minimum: usize,
    },
}

impl PipelineError {
    /// True when retrying the same request may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            PipelineError::StructureUnavailable(_) | PipelineError::TooFewShapes { .. }
        )
    }
}
