//! API error types

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::warn;

use vivcluster::ClusterError;
use vivoracle::PipelineError;

/// Result type for API operations
pub type ApiResult<T> = Result<T, ApiError>;

/// API error with HTTP status code
#[derive(Debug, Clone, Serialize, Error)]
pub struct ApiError {
    /// HTTP status code
    #[serde(skip)]
    pub status: StatusCode,

    /// Error message
    #[serde(rename = "error")]
    pub message: String,

    /// Optional error code for client handling
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    /// Tells the caller a placeholder result is appropriate
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub fallback: bool,
}

impl ApiError {
    /// Create a new API error
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            code: None,
            fallback: false,
        }
    }

    /// Create a new API error with code
    pub fn with_code(
        status: StatusCode,
        message: impl Into<String>,
        code: impl Into<String>,
    ) -> Self {
        Self {
            code: Some(code.into()),
            ..Self::new(status, message)
        }
    }

    /// Mark the error as degradable
    #[must_use]
    pub fn with_fallback(mut self) -> Self {
        self.fallback = true;
        self
    }

    /// 400 Bad Request
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    /// 404 Not Found
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::with_code(StatusCode::NOT_FOUND, message, "NOT_FOUND")
    }

    /// 429 Too Many Requests
    pub fn busy(message: impl Into<String>) -> Self {
        Self::with_code(StatusCode::TOO_MANY_REQUESTS, message, "CLUSTER_BUSY")
    }

    /// 500 Internal Server Error; never carries details
    pub fn internal() -> Self {
        Self::with_code(StatusCode::INTERNAL_SERVER_ERROR, "Internal error", "INTERNAL_ERROR")
    }

    /// 502 Bad Gateway
    pub fn bad_gateway(message: impl Into<String>) -> Self {
        Self::with_code(StatusCode::BAD_GATEWAY, message, "UPSTREAM_ERROR")
    }

    /// 503 Service Unavailable, with `fallback: true`
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::with_code(StatusCode::SERVICE_UNAVAILABLE, message, "SERVICE_UNAVAILABLE")
            .with_fallback()
    }

    /// Map a cluster failure, naming the failed operation when the upstream is at fault
    pub fn cluster(context: &'static str) -> impl Fn(ClusterError) -> ApiError {
        move |e| {
            let mut error = ApiError::from(e);
            if error.status == StatusCode::BAD_GATEWAY {
                error.message = context.to_string();
            }
            error
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match &self.code {
            Some(code) => write!(f, "[{:?}] [{}] {}", self.status, code, self.message),
            None => write!(f, "[{:?}] {}", self.status, self.message),
        }
    }
}

impl From<PipelineError> for ApiError {
    fn from(e: PipelineError) -> Self {
        match e {
            PipelineError::InvalidPrompt(_) => ApiError::bad_request("Bad prompt"),
            PipelineError::InvalidSprite(_) => ApiError::bad_request("Bad sprite data"),
            PipelineError::StructureUnavailable(e) => {
                warn!("Sprite generation failed: {}", e);
                ApiError::unavailable("Failed to generate sprite")
            }
            PipelineError::TooFewShapes { found, minimum } => {
                warn!("Sprite rejected: {} shape(s), need {}", found, minimum);
                ApiError::unavailable("Invalid sprite format")
            }
        }
    }
}

impl From<ClusterError> for ApiError {
    fn from(e: ClusterError) -> Self {
        match e {
            ClusterError::InvalidRequest(message) => ApiError::bad_request(message),
            e @ ClusterError::CapacityExceeded { .. } => ApiError::busy(e.to_string()),
            e @ ClusterError::NotFound { .. } => ApiError::not_found(e.to_string()),
            e => {
                warn!("Cluster API failure: {}", e);
                ApiError::bad_gateway("Cluster API error")
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status;
        (status, Json(self)).into_response()
    }
}
