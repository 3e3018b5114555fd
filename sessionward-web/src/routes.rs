//! Route definitions for the sessionward web server

use crate::{handlers, AppState};
use axum::{
    routing::{delete, get, post},
    Router,
};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Session lifecycle
        .route("/session", get(handlers::show_session))
        .route("/session/visit", post(handlers::record_visit))
        .route("/session/login/{uid}", post(handlers::login))
        .route("/session/logout", post(handlers::logout))
        // Per-user purge
        .route("/users/{uid}/sessions", delete(handlers::delete_user_sessions))
}
