//! PhishTank MCP Server
//!
//! A PhishTank phishing-intelligence MCP server with a cached, rate-limited
//! data-access layer and support for multiple transport protocols.

#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod cache;
pub mod config;
pub mod error;
pub mod server;
pub mod throttle;
pub mod tools;
pub mod utils;

/// Re-export common types
pub use crate::error::{Error, Result};
pub use crate::server::{PhishTankServer, ServerConfig};

/// Server version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Server name
pub const NAME: &str = "phishtank-mcp";

/// Initialize logging system with configuration
///
/// # Errors
/// Returns an error if logging system initialization fails
pub fn init_logging_with_config(config: &crate::config::LoggingConfig) -> Result<()> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    // Parse log level
    let level = match config.level.to_lowercase().as_str() {
        "trace" => "trace",
        "debug" => "debug",
        "warn" => "warn",
        "error" => "error",
        _ => "info",
    };

    let filter = EnvFilter::new(level);

    let console_layer = || {
        fmt::layer()
            .with_target(true)
            .with_thread_ids(true)
            .with_thread_names(true)
            .compact()
    };

    // Build log layers based on configuration
    match (config.enable_console, config.enable_file, &config.file_path) {
        // Enable both console and file logging
        (true, true, Some(file_path)) => {
            let file_appender = file_appender(file_path)?;

            tracing_subscriber::registry()
                .with(filter)
                .with(console_layer())
                .with(
                    fmt::layer()
                        .with_writer(file_appender)
                        .with_target(true)
                        .with_thread_ids(true)
                        .with_thread_names(true)
                        .compact(),
                )
                .try_init()
                .map_err(|e| error::Error::Initialization(e.to_string()))?;
        }

        // Enable file logging only
        (false, true, Some(file_path)) => {
            let file_appender = file_appender(file_path)?;

            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .with_writer(file_appender)
                        .with_target(true)
                        .with_thread_ids(true)
                        .with_thread_names(true)
                        .compact(),
                )
                .try_init()
                .map_err(|e| error::Error::Initialization(e.to_string()))?;
        }

        // Console logging for all other cases
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(console_layer())
                .try_init()
                .map_err(|e| error::Error::Initialization(e.to_string()))?;
        }
    }

    Ok(())
}

/// Create a daily-rolling file appender, creating the log directory if needed
fn file_appender(file_path: &str) -> Result<tracing_appender::rolling::RollingFileAppender> {
    let log_dir = std::path::Path::new(file_path)
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| std::path::Path::new("."));
    let log_file_name = std::path::Path::new(file_path)
        .file_name()
        .unwrap_or(std::ffi::OsStr::new("phishtank-mcp.log"));

    std::fs::create_dir_all(log_dir).map_err(|e| {
        error::Error::Initialization(format!("Failed to create log directory: {e}"))
    })?;

    Ok(tracing_appender::rolling::daily(log_dir, log_file_name))
}
