//! Server instance management

use axum::http::StatusCode;
use std::net::SocketAddr;
use tokio::signal;
use tracing::{error, info};

use crate::config::ServerConfig;
use crate::error::{ApiError, ApiResult};
use crate::handlers::{build_app, AppState};

/// Vivarium HTTP server
///
/// Owns the shared state, the listener and the periodic sweeper for the
/// lifetime of one `start` call.
pub struct VivariumServer {
    /// Server configuration
    config: ServerConfig,

    /// State handed to every handler
    state: AppState,
}

impl VivariumServer {
    /// Create new server instance
    ///
    /// # Arguments
    ///
    /// * `config` - Server configuration
    ///
    /// # Returns
    ///
    /// `Result<VivariumServer, ApiError>` - Server or error
    pub fn new(config: ServerConfig) -> ApiResult<Self> {
        if let Err(e) = config.validate() {
            return Err(startup_error(format!("Invalid config: {}", e)));
        }

        let state = AppState::new(config.clone())?;
        Ok(Self { config, state })
    }

    /// Get socket address for binding
    pub fn socket_addr(&self) -> ApiResult<SocketAddr> {
        self.config.socket_addr().map_err(startup_error)
    }

    /// Start server and run until Ctrl+C or SIGTERM
    pub async fn start(&self) -> ApiResult<()> {
        let addr = self.socket_addr()?;
        let app = build_app(self.state.clone());

        let listener = tokio::net::TcpListener::bind(addr).await.map_err(|e| {
            error!("Failed to bind to {}: {:?}", addr, e);
            startup_error(format!("Failed to bind to {}: {}", addr, e))
        })?;

        let sweeper = self.state.orchestrator.spawn_sweeper();
        info!("Server listening on: {}", self.server_url());

        let served = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| startup_error(format!("Server error: {}", e)));

        sweeper.abort();
        info!("Server stopped");
        served
    }

    /// State shared with the handlers
    #[must_use]
    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Get server URL
    #[must_use]
    pub fn server_url(&self) -> String {
        self.config.server_url()
    }
}

fn startup_error(message: impl Into<String>) -> ApiError {
    ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, message)
}

/// Resolves on Ctrl+C or, on unix, SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received shutdown signal"),
            Err(e) => {
                error!("Failed to install Ctrl+C handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix;
        match unix::signal(unix::SignalKind::terminate()) {
            Ok(mut term) => {
                term.recv().await;
                info!("Received TERM signal");
            }
            Err(e) => {
                error!("Failed to install TERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
