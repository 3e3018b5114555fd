//! Sessionward Store - the native session store and its persistence backends
//!
//! [`NativeSessionStore`] owns a request's session identifier and talks to a
//! [`SessionHandler`](sessionward_core::SessionHandler) backend:
//!
//! - [`MemorySessionHandler`]: process-local map, for tests and single nodes
//! - [`SqliteSessionHandler`]: the `sessions` table through sqlx
//! - [`WriteSafeSessionHandler`]: wraps any handler with a write gate

pub mod id;
pub mod memory;
pub mod native;
#[cfg(feature = "sqlite")]
pub mod sqlite;
pub mod write_safe;

pub use id::{generate_session_id, hash_session_id};
pub use memory::MemorySessionHandler;
pub use native::NativeSessionStore;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteSessionHandler;
pub use write_safe::WriteSafeSessionHandler;
