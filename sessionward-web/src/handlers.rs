//! HTTP handlers

pub mod health;
pub mod session;

pub use health::{health_check, HealthResponse};
pub use session::{delete_user_sessions, login, logout, record_visit, show_session, SessionView};
