//! Server configuration from TOML and environment

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use thiserror::Error;

use vivcluster::ClusterConfig;
use vivoracle::{InferenceConfig, SpriteConfig};

/// Default host address
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default port number
pub const DEFAULT_PORT: u16 = 8787;

/// Configuration loading failures
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read
    #[error("failed to read {path}: {source}")]
    Io {
        /// File that was read
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// The config file is not valid TOML for [`ServerConfig`]
    #[error("failed to parse {path}: {source}")]
    Parse {
        /// File that was parsed
        path: PathBuf,
        /// Underlying error
        source: toml::de::Error,
    },

    /// A value is out of range
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server host address
    pub host: String,

    /// Server port
    pub port: u16,

    /// Log level for tracing
    pub log_level: String,

    /// Chat-completion endpoint
    pub inference: InferenceConfig,

    /// Sprite pipeline limits
    pub sprite: SpriteConfig,

    /// Cluster API and deployment lifecycle
    pub cluster: ClusterConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            log_level: "info".to_string(),
            inference: InferenceConfig::default(),
            sprite: SpriteConfig::default(),
            cluster: ClusterConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Load from an optional TOML file, overlay the environment and validate
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env();
        config.validate().map_err(ConfigError::Invalid)?;
        Ok(config)
    }

    /// Parse a TOML file; missing keys take their defaults
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Defaults with the environment applied
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    /// Overlay environment variables
    ///
    /// Environment variables:
    /// - `VIVARIUM_HOST` - Server host
    /// - `VIVARIUM_PORT` - Server port
    /// - `VIVARIUM_LOG_LEVEL` - Log level (trace, debug, info, warn, error)
    /// - `VIVARIUM_INFERENCE_URL` - Chat-completion API base
    /// - `GITHUB_TOKEN` - Chat-completion bearer token
    /// - `K3S_API_URL` - Cluster API base
    /// - `K3S_TOKEN` - Cluster bearer token
    /// - `VIVARIUM_NAMESPACE` - Namespace for creature deployments
    pub fn apply_env(&mut self) {
        self.apply_vars(|key| std::env::var(key).ok());
    }

    /// Overlay values from `lookup`, keyed like [`ServerConfig::apply_env`]
    pub fn apply_vars(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(host) = lookup("VIVARIUM_HOST") {
            self.host = host;
        }
        if let Some(port) = lookup("VIVARIUM_PORT").and_then(|p| p.parse::<u16>().ok()) {
            self.port = port;
        }
        if let Some(level) = lookup("VIVARIUM_LOG_LEVEL") {
            self.log_level = level;
        }
        if let Some(url) = lookup("VIVARIUM_INFERENCE_URL") {
            self.inference.api_base = url;
        }
        if let Some(token) = lookup("GITHUB_TOKEN") {
            self.inference.token = token;
        }
        if let Some(url) = lookup("K3S_API_URL") {
            self.cluster.api_url = url;
        }
        if let Some(token) = lookup("K3S_TOKEN") {
            self.cluster.token = token;
        }
        if let Some(namespace) = lookup("VIVARIUM_NAMESPACE") {
            self.cluster.namespace = namespace;
        }
    }

    /// Get the socket address for the server
    pub fn socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| format!("Invalid address: {}", e))
    }

    /// Get the full server URL
    #[must_use]
    pub fn server_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.port == 0 {
            return Err("Port cannot be zero".to_string());
        }

        if self.host.is_empty() {
            return Err("Host cannot be empty".to_string());
        }

        match self.log_level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(format!(
                    "Invalid log level: {}. Must be one of: trace, debug, info, warn, error",
                    self.log_level
                ));
            }
        }

        self.inference.validate()?;
        self.sprite.validate()?;
        self.cluster.validate()
    }
}
