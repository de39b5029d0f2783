//! # op-server
//!
//! Reference axum server for the OpenID 2.0 provider engine.
//!
//! Mounts the protocol endpoint at a configurable path, supplies a
//! login-form auth handler, and serves with graceful shutdown. Real
//! deployments embed `op-protocol` behind their own authentication UI;
//! this crate is the runnable wiring the integration tests drive.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod config;
pub mod router;
pub mod state;
pub mod ui;

pub use config::ServerConfig;
pub use router::create_router;
pub use state::AppState;

use std::net::SocketAddr;

use axum::Router;
use tokio::net::TcpListener;

/// The OpenID provider server.
pub struct Server {
    config: ServerConfig,
}

impl Server {
    /// Creates a server instance.
    #[must_use]
    pub fn new(config: ServerConfig) -> Self {
        Self { config }
    }

    /// Builds the application router without binding a socket.
    ///
    /// Useful for tests that drive the router directly.
    #[must_use]
    pub fn router(&self) -> Router {
        create_router(AppState::new(self.config.clone()))
    }

    /// Runs the server until a shutdown signal arrives.
    pub async fn run(self) -> anyhow::Result<()> {
        let app = self.router();

        let addr: SocketAddr = format!("{}:{}", self.config.host, self.config.port).parse()?;
        let listener = TcpListener::bind(addr).await?;

        tracing::info!(
            endpoint = %self.config.endpoint_url(),
            "OpenID provider listening on http://{addr}"
        );

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("server shutdown complete");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!(%error, "failed to listen for shutdown signal");
    }
}
