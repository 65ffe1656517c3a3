//! vivserve - HTTP surface of the vivarium
//!
//! Axum server exposing sprite generation and animation backed by
//! [`vivoracle`], and creature deployments backed by [`vivcluster`].

#![warn(missing_docs)]
#![warn(unused_extern_crates)]

/// API error types
pub mod error;

/// HTTP handlers and router
pub mod handlers;

/// Server configuration from TOML and environment
pub mod config;

/// Response bodies
pub mod responses;

/// Server instance management
pub mod server;

pub use config::{ConfigError, ServerConfig};
pub use error::{ApiError, ApiResult};
pub use handlers::{build_app, AppState};
pub use server::VivariumServer;
