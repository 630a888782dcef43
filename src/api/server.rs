//! REST facade server
//!
//! Binds the facade router and serves it until shutdown is requested.

use std::net::SocketAddr;
use tokio::sync::broadcast;
use tracing::info;

use crate::api::rest::{router, AppState};
use crate::error::{Error, Result};

/// Configuration for the facade server
#[derive(Debug, Clone)]
pub struct ApiServerConfig {
    /// Bind address
    pub addr: SocketAddr,
}

impl Default for ApiServerConfig {
    fn default() -> Self {
        Self {
            addr: "0.0.0.0:8090".parse().unwrap(),
        }
    }
}

/// REST facade over a configured adapter set
pub struct ApiServer {
    config: ApiServerConfig,
    state: AppState,
    shutdown_tx: broadcast::Sender<()>,
}

impl ApiServer {
    pub fn new(config: ApiServerConfig, state: AppState) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        Self {
            config,
            state,
            shutdown_tx,
        }
    }

    /// Serve until the process is stopped or `shutdown` is called.
    pub async fn run(&self) -> Result<()> {
        let app = router(self.state.clone());
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        info!("REST facade listening on {}", self.config.addr);
        let listener = tokio::net::TcpListener::bind(self.config.addr)
            .await
            .map_err(|err| {
                Error::Configuration(format!("failed to bind {}: {}", self.config.addr, err))
            })?;

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.recv().await;
                info!("REST facade shutting down");
            })
            .await
            .map_err(|err| Error::platform(format!("REST facade error: {}", err)))?;

        Ok(())
    }

    /// Trigger graceful shutdown
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ApiServerConfig::default();
        assert_eq!(config.addr.port(), 8090);
    }
}
