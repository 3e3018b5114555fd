//! Sessionward Web Server
//!
//! Demo server for cookie-based sessions with lazy start.

use anyhow::Context;
use clap::Parser;
use sessionward_core::{init_logging, LogFormat, LoggingConfig};
use sessionward_web::{SessionwardServer, WebConfig};
use std::path::PathBuf;

/// Sessionward Web Server - cookie sessions that start only when needed
#[derive(Parser)]
#[command(name = "sessionward-web")]
#[command(about = "Demo server for sessionward sessions")]
#[command(version)]
struct Args {
    /// Server configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Server host to bind to
    #[arg(long)]
    host: Option<String>,

    /// Server port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Database URL for session storage
    #[arg(long)]
    database_url: Option<String>,

    /// Session cookie configuration file (TOML)
    #[arg(long)]
    session_config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,
}

impl Args {
    /// Command line values override the file and environment
    fn apply(self, config: &mut WebConfig) {
        if let Some(host) = self.host {
            config.host = host;
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if self.database_url.is_some() {
            config.database_url = self.database_url;
        }
        if self.session_config.is_some() {
            config.session_config = self.session_config;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let logging = LoggingConfig {
        level: args.log_level.clone(),
        format: if args.json_logs {
            LogFormat::Json
        } else {
            LogFormat::Compact
        },
        ..LoggingConfig::default()
    };
    init_logging(&logging).map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    let mut config = WebConfig::load(args.config.as_deref()).context("Failed to load configuration")?;
    args.apply(&mut config);

    let server = SessionwardServer::new(config)
        .await
        .context("Failed to build server")?;
    server.start().await.context("Server failed")?;

    Ok(())
}
