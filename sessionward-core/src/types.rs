//! Core data type definitions

use crate::payload::SessionPayload;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Cookie `SameSite` attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SameSite {
    Strict,
    Lax,
    None,
}

impl fmt::Display for SameSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SameSite::Strict => write!(f, "Strict"),
            SameSite::Lax => write!(f, "Lax"),
            SameSite::None => write!(f, "None"),
        }
    }
}

/// Options negotiated for the current request's session cookie
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionOptions {
    /// Session cookie name
    pub cookie_name: String,
    /// Cookie lifetime in seconds, 0 for a browser-session cookie
    pub cookie_lifetime: u64,
    pub path: String,
    pub domain: Option<String>,
    pub secure: bool,
    pub http_only: bool,
    pub same_site: Option<SameSite>,
    /// Records idle longer than this are garbage collected
    pub gc_max_lifetime: u64,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            cookie_name: "SESS".to_string(),
            cookie_lifetime: 2_000_000,
            path: "/".to_string(),
            domain: None,
            secure: false,
            http_only: true,
            same_site: Some(SameSite::Lax),
            gc_max_lifetime: 200_000,
        }
    }
}

/// Whether the process can talk HTTP at all
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    /// Serving HTTP requests; cookies and store writes are meaningful
    Interactive,
    /// CLI, workers, tests without a request: every mutation is a no-op
    Headless,
}

impl ExecutionMode {
    pub fn is_headless(&self) -> bool {
        matches!(self, ExecutionMode::Headless)
    }
}

/// Per-request session state
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    /// The underlying store was physically started
    pub started: bool,
    /// A session exists only in memory, waiting for something to be written
    pub started_lazily: bool,
    pub closed: bool,
    pub data: SessionPayload,
    pub options: SessionOptions,
}

impl SessionState {
    /// The session was started either way and has not been closed since
    pub fn is_open(&self) -> bool {
        (self.started || self.started_lazily) && !self.closed
    }
}
