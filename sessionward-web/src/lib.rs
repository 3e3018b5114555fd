//! Sessionward Web Server
//!
//! Axum integration for the session lifecycle: a middleware that starts the
//! session before each handler and saves it afterwards, a [`Session`]
//! extractor, and a small demo API exercising login, logout and per-user
//! session purges.

pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;

// Re-export main types
pub use middleware::{request_context, session_middleware, Session};
pub use server::SessionwardServer;
pub use state::{AppState, SessionBackend};

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    Router,
};
use serde::{Deserialize, Serialize};
use sessionward_core::SessionError;
use std::path::{Path, PathBuf};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

/// Create the main application router
pub fn create_app(state: AppState) -> Router {
    Router::new()
        .nest("/api", routes::api_routes())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(axum::middleware::from_fn_with_state(
                    state.clone(),
                    session_middleware,
                )),
        )
        .with_state(state)
}

/// Configuration for the web server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// SQLite database URL; sessions stay in memory when unset
    pub database_url: Option<String>,
    /// TOML file with the session cookie configuration
    pub session_config: Option<PathBuf>,
    /// Treat every request as HTTPS
    pub secure: bool,
    /// Honour `X-Forwarded-Proto`; enable only behind a reverse proxy that sets it
    pub trust_forwarded_proto: bool,
    /// Seconds between garbage collection runs
    pub gc_interval_secs: u64,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            database_url: None,
            session_config: None,
            secure: false,
            trust_forwarded_proto: false,
            gc_interval_secs: 3600,
        }
    }
}

impl WebConfig {
    /// Load configuration from an optional TOML file, then `SESSIONWARD_*`
    /// environment variables on top
    pub fn load(path: Option<&Path>) -> WebResult<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        }

        builder
            .add_source(config::Environment::with_prefix("SESSIONWARD").try_parsing(true))
            .build()
            .and_then(|settings| settings.try_deserialize::<WebConfig>())
            .map_err(|e| WebError::Config(e.to_string()))
    }

    /// Get the server address
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Error types for the web server
#[derive(thiserror::Error, Debug)]
pub enum WebError {
    #[error("Server error: {0}")]
    Server(#[from] std::io::Error),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),
}

/// Result type for web operations
pub type WebResult<T> = Result<T, WebError>;

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let (status, error_code) = match &self {
            WebError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            WebError::Forbidden(_) => (StatusCode::FORBIDDEN, "forbidden"),
            WebError::Session(_) => (StatusCode::INTERNAL_SERVER_ERROR, "session_error"),
            WebError::Server(_) | WebError::Config(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error")
            }
        };

        if let WebError::Session(e) = &self {
            e.log();
        }

        (
            status,
            Json(serde_json::json!({
                "error": error_code,
                "message": self.to_string(),
            })),
        )
            .into_response()
    }
}
