//! Sessionward Core - Shared session types and collaborator trait definitions
//!
//! This module defines the data model and the seams between the session
//! lifecycle policy, the native session store and the persistence backends.

pub mod config;
pub mod cookie;
pub mod error;
pub mod logging;
pub mod metadata;
pub mod payload;
pub mod request;
pub mod traits;
pub mod types;

pub use config::*;
pub use cookie::*;
pub use error::*;
pub use logging::*;
pub use metadata::*;
pub use payload::*;
pub use request::*;
pub use traits::*;
pub use types::*;

// Re-export commonly used external types
pub use async_trait::async_trait;
pub use tracing;
