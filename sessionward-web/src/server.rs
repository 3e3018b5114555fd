//! Sessionward Web Server
//!
//! Main web server implementation using Axum.

use crate::{create_app, AppState, WebConfig, WebError, WebResult};
use axum::serve;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{error, info};

/// Main web server
pub struct SessionwardServer {
    config: WebConfig,
    state: AppState,
}

impl SessionwardServer {
    pub async fn new(config: WebConfig) -> WebResult<Self> {
        let state = AppState::new(config.clone()).await?;

        Ok(Self { config, state })
    }

    /// Start the web server
    pub async fn start(self) -> WebResult<()> {
        let address = self.config.address();

        info!("Starting sessionward web server");
        info!("Server address: http://{}", address);

        let app = create_app(self.state.clone());

        let listener = TcpListener::bind(&address)
            .await
            .map_err(WebError::Server)?;

        info!("Server listening on http://{}", address);

        // Periodic garbage collection of idle sessions
        let gc_state = self.state.clone();
        let gc_interval = Duration::from_secs(self.config.gc_interval_secs.max(1));
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(gc_interval);
            loop {
                interval.tick().await;
                gc_state.collect_garbage().await;
            }
        });

        if let Err(e) = serve(listener, app).await {
            error!("Server error: {}", e);
            return Err(WebError::Server(e));
        }

        Ok(())
    }

    pub fn config(&self) -> &WebConfig {
        &self.config
    }

    /// Get application state
    pub fn state(&self) -> &AppState {
        &self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_server_creation() {
        let config = WebConfig {
            port: 3000,
            ..WebConfig::default()
        };
        let server = SessionwardServer::new(config).await.unwrap();
        assert_eq!(server.config().address(), "127.0.0.1:3000");
        assert_eq!(server.state().config.port, 3000);
    }
}
