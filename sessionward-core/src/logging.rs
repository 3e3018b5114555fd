//! Unified logging system
//!
//! Structured logging for the session crates with configurable output

use serde::{Deserialize, Serialize};
use std::io;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Output format (json, pretty, compact)
    pub format: LogFormat,
    /// Whether to include file and line information
    pub include_location: bool,
    /// Whether to include thread information
    pub include_thread: bool,
    /// Log file path; stdout when unset
    pub log_file_path: Option<String>,
    /// Emit span close events with timings
    pub log_span_timings: bool,
    /// Custom filter directives
    pub filter_directives: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Pretty,
    Compact,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Compact,
            include_location: false,
            include_thread: false,
            log_file_path: None,
            log_span_timings: false,
            filter_directives: vec![
                "sessionward_core=info".to_string(),
                "sessionward_store=info".to_string(),
                "sessionward_lifecycle=debug".to_string(),
                "sessionward_web=debug".to_string(),
            ],
        }
    }
}

/// Initialize the logging system
///
/// `RUST_LOG` wins over `config.level` when set.
pub fn init_logging(
    config: &LoggingConfig,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    for directive in &config.filter_directives {
        filter = filter.add_directive(directive.parse()?);
    }

    let span_events = if config.log_span_timings {
        FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    let registry = tracing_subscriber::registry().with(filter);

    macro_rules! install {
        ($layer:expr) => {{
            let layer = $layer
                .with_span_events(span_events)
                .with_file(config.include_location)
                .with_line_number(config.include_location)
                .with_thread_ids(config.include_thread)
                .with_thread_names(config.include_thread);

            match &config.log_file_path {
                Some(log_path) => {
                    let file = std::fs::OpenOptions::new()
                        .create(true)
                        .append(true)
                        .open(log_path)?;
                    registry
                        .with(layer.with_writer(std::sync::Mutex::new(file)))
                        .try_init()?;
                }
                None => {
                    registry.with(layer.with_writer(io::stdout)).try_init()?;
                }
            }
        }};
    }

    match config.format {
        LogFormat::Json => install!(fmt::layer().json()),
        LogFormat::Pretty => install!(fmt::layer().pretty()),
        LogFormat::Compact => install!(fmt::layer().compact()),
    }

    Ok(())
}
