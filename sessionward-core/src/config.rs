//! 配置管理

use crate::cookie::MAX_COOKIE_LIFETIME;
use crate::error::{ErrorContext, SessionError, SessionResult};
use crate::types::{ExecutionMode, SameSite};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Session cookie and lifecycle configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Fixed cookie name; derived from the request host when unset
    pub cookie_name: Option<String>,
    /// Cookie lifetime in seconds, 0 for a browser-session cookie
    pub cookie_lifetime: u64,
    pub cookie_path: String,
    pub cookie_domain: Option<String>,
    pub cookie_http_only: bool,
    pub cookie_same_site: Option<SameSite>,
    /// Records idle for longer than this are garbage collected
    pub gc_max_lifetime: u64,
    /// Minimum seconds between metadata `last_used` refreshes
    pub write_interval: u64,
    pub execution_mode: ExecutionMode,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: None,
            cookie_lifetime: 2_000_000,
            cookie_path: "/".to_string(),
            cookie_domain: None,
            cookie_http_only: true,
            cookie_same_site: Some(SameSite::Lax),
            gc_max_lifetime: 200_000,
            write_interval: 180,
            execution_mode: ExecutionMode::Interactive,
        }
    }
}

impl SessionConfig {
    /// 从文件加载配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> SessionResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| SessionError::Config {
            message: format!("Failed to read config file: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("read_file")
                .with_suggestion("Check if the config file exists and is readable"),
        })?;

        let config: SessionConfig = toml::from_str(&content).map_err(|e| SessionError::Config {
            message: format!("Failed to parse config: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("parse_toml")
                .with_suggestion("Check TOML syntax in config file"),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// 保存配置到文件
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> SessionResult<()> {
        let content = toml::to_string_pretty(self).map_err(|e| SessionError::Config {
            message: format!("Failed to serialize config: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config").with_operation("serialize_toml"),
        })?;

        std::fs::write(path, content).map_err(|e| SessionError::Config {
            message: format!("Failed to write config file: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("write_file")
                .with_suggestion("Check if the directory exists and is writable"),
        })?;

        Ok(())
    }

    /// 验证配置
    pub fn validate(&self) -> SessionResult<()> {
        if let Some(name) = &self.cookie_name {
            let invalid = name.is_empty()
                || name
                    .chars()
                    .any(|c| c.is_whitespace() || c.is_control() || "=;,\"".contains(c));
            if invalid {
                return Err(SessionError::Config {
                    message: format!("Invalid session cookie name: {:?}", name),
                    source: None,
                    context: ErrorContext::new("config")
                        .with_operation("validate")
                        .with_suggestion("Use a cookie name without separators or whitespace"),
                });
            }
        }

        if self.cookie_lifetime > MAX_COOKIE_LIFETIME {
            return Err(SessionError::Config {
                message: format!(
                    "cookie_lifetime {} exceeds the maximum of {} seconds",
                    self.cookie_lifetime, MAX_COOKIE_LIFETIME
                ),
                source: None,
                context: ErrorContext::new("config")
                    .with_operation("validate")
                    .with_suggestion("Use at most 400 days, or 0 for a browser-session cookie"),
            });
        }

        if !self.cookie_path.starts_with('/') {
            return Err(SessionError::Config {
                message: "cookie_path must start with '/'".to_string(),
                source: None,
                context: ErrorContext::new("config")
                    .with_operation("validate")
                    .with_suggestion("Set cookie_path to \"/\" or an absolute path"),
            });
        }

        if self.gc_max_lifetime == 0 {
            return Err(SessionError::Config {
                message: "gc_max_lifetime must be greater than 0".to_string(),
                source: None,
                context: ErrorContext::new("config")
                    .with_operation("validate")
                    .with_suggestion("Set gc_max_lifetime to a positive number of seconds"),
            });
        }

        if self.cookie_same_site == Some(SameSite::None) && !self.cookie_http_only {
            tracing::warn!("SameSite=None session cookie readable from scripts");
        }

        Ok(())
    }
}
