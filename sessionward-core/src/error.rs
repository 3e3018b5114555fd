//! Unified error handling system
//!
//! Provides structured error types with context and recovery suggestions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, warn};

pub type SessionResult<T> = Result<T, SessionError>;

/// Error context providing additional information for debugging and recovery
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorContext {
    /// Unique error ID for tracking
    pub error_id: String,
    /// Timestamp when error occurred
    pub timestamp: DateTime<Utc>,
    /// Component where error originated
    pub component: String,
    /// Operation being performed when error occurred
    pub operation: Option<String>,
    /// Additional metadata
    pub metadata: std::collections::HashMap<String, String>,
    /// Recovery suggestions
    pub recovery_suggestions: Vec<String>,
}

impl ErrorContext {
    pub fn new(component: &str) -> Self {
        Self {
            error_id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            component: component.to_string(),
            operation: None,
            metadata: std::collections::HashMap::new(),
            recovery_suggestions: Vec::new(),
        }
    }

    pub fn with_operation(mut self, operation: &str) -> Self {
        self.operation = Some(operation.to_string());
        self
    }

    pub fn with_metadata(mut self, key: &str, value: &str) -> Self {
        self.metadata.insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_suggestion(mut self, suggestion: &str) -> Self {
        self.recovery_suggestions.push(suggestion.to_string());
        self
    }
}

/// Main error type for session handling
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Storage error: {message}")]
    Storage {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: ErrorContext,
    },

    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: ErrorContext,
    },

    #[error("Session is not active: {operation}")]
    Inactive {
        operation: String,
        context: ErrorContext,
    },

    #[error("Invalid session payload: {message}")]
    InvalidPayload {
        message: String,
        context: ErrorContext,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {message}")]
    Internal {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: ErrorContext,
    },
}

impl SessionError {
    /// Get the error context
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            SessionError::Storage { context, .. } => Some(context),
            SessionError::Config { context, .. } => Some(context),
            SessionError::Inactive { context, .. } => Some(context),
            SessionError::InvalidPayload { context, .. } => Some(context),
            SessionError::Internal { context, .. } => Some(context),
            _ => None,
        }
    }

    /// Storage failures may clear up on their own (locked database, pool exhaustion)
    pub fn is_recoverable(&self) -> bool {
        match self {
            SessionError::Storage { .. } => true,
            SessionError::Io(_) => true,
            SessionError::Config { .. } => false,
            SessionError::Inactive { .. } => false,
            SessionError::InvalidPayload { .. } => false,
            _ => false,
        }
    }

    /// Create a storage error with a source
    pub fn storage<S, E>(message: S, operation: &str, source: E) -> Self
    where
        S: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    {
        SessionError::Storage {
            message: message.into(),
            source: Some(Box::new(source)),
            context: ErrorContext::new("storage").with_operation(operation),
        }
    }

    /// Create an error for an operation that needs an active session
    pub fn inactive(operation: &str) -> Self {
        SessionError::Inactive {
            operation: operation.to_string(),
            context: ErrorContext::new("store")
                .with_operation(operation)
                .with_suggestion("Start the session before calling this operation"),
        }
    }

    /// Log the error with appropriate level
    pub fn log(&self) {
        match self {
            SessionError::Internal { .. } => {
                error!(
                    error_id = ?self.context().map(|c| &c.error_id),
                    error = %self,
                    "Internal session error occurred"
                );
            }
            SessionError::Config { .. } => {
                error!(
                    error_id = ?self.context().map(|c| &c.error_id),
                    error = %self,
                    "Session configuration error"
                );
            }
            SessionError::Storage { .. } | SessionError::Io(_) => {
                warn!(
                    error_id = ?self.context().map(|c| &c.error_id),
                    error = %self,
                    "Session storage error (may be recoverable)"
                );
            }
            SessionError::Inactive { .. } => {
                debug!(error = %self, "Session operation on inactive store");
            }
            _ => {
                error!(
                    error_id = ?self.context().map(|c| &c.error_id),
                    error = %self,
                    "Session error occurred"
                );
            }
        }
    }
}

/// Convenience macros for creating errors with context
#[macro_export]
macro_rules! storage_error {
    ($msg:expr, $component:expr) => {
        $crate::SessionError::Storage {
            message: $msg.to_string(),
            source: None,
            context: $crate::ErrorContext::new($component),
        }
    };
    ($msg:expr, $component:expr, $source:expr) => {
        $crate::SessionError::Storage {
            message: $msg.to_string(),
            source: Some(Box::new($source)),
            context: $crate::ErrorContext::new($component),
        }
    };
}

#[macro_export]
macro_rules! config_error {
    ($msg:expr, $component:expr) => {
        $crate::SessionError::Config {
            message: $msg.to_string(),
            source: None,
            context: $crate::ErrorContext::new($component)
                .with_suggestion("Check your session configuration file"),
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_error_has_context() {
        let error = storage_error!("table missing", "sqlite");

        match &error {
            SessionError::Storage {
                message, context, ..
            } => {
                assert_eq!(message, "table missing");
                assert_eq!(context.component, "sqlite");
                assert!(!context.error_id.is_empty());
            }
            _ => panic!("Expected Storage error"),
        }
        assert!(error.is_recoverable());
        error.log();
    }

    #[test]
    fn test_inactive_error_is_not_recoverable() {
        let error = SessionError::inactive("save");
        assert!(!error.is_recoverable());
        assert_eq!(
            error.context().and_then(|c| c.operation.as_deref()),
            Some("save")
        );
        assert_eq!(error.to_string(), "Session is not active: save");
    }

    #[test]
    fn test_config_error_macro() {
        let error = config_error!("cookie_lifetime out of range", "config");
        assert!(!error.is_recoverable());
        assert_eq!(
            error.context().map(|c| c.recovery_suggestions.len()),
            Some(1)
        );
    }
}
