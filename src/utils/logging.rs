//! Logging system initialization
//!
//! The library logs to %APPDATA%\WinGetInterop\interop.log, rotated each time the
//! library initializes logging and keeping 9 historical files. The redirector logs
//! to stdout. Both honor `RUST_LOG`.

use crate::config::{ConfigManager, LoggingSettings};
use crate::error::{InteropError, Result, StringError};
use std::path::Path;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt};

/// Maximum number of historical log files to keep (interop.log.1 through interop.log.9)
const MAX_LOG_FILES: u8 = 9;

fn env_filter(default_filter: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter))
}

/// Initialize file logging for the library
///
/// Fails if another global subscriber is already installed (for example by a host
/// that embeds its own tracing setup); callers treat that as non-fatal.
pub fn init_logging(settings: &LoggingSettings) -> Result<()> {
    if !settings.log_to_file {
        return Ok(());
    }

    let log_dir = ConfigManager::get_app_dir();
    std::fs::create_dir_all(&log_dir)?;

    // Rotate existing log files on startup
    let log_path = log_dir.join("interop.log");
    rotate_logs_on_startup(&log_path)?;

    // Rotation is handled manually on startup
    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix("interop")
        .filename_suffix("log")
        .build(log_dir)
        .map_err(|e| InteropError::ConfigError(Box::new(e)))?;

    let subscriber = fmt()
        .with_writer(file_appender)
        .with_env_filter(env_filter(&settings.default_filter))
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| InteropError::ConfigError(Box::new(e)))?;

    tracing::info!("winget-interop v{} loaded", env!("CARGO_PKG_VERSION"));

    Ok(())
}

/// Initialize stdout logging for the redirector executable
pub fn init_console_logging() -> Result<()> {
    let subscriber = fmt()
        .with_env_filter(env_filter("info"))
        .with_target(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| InteropError::ConfigError(Box::new(e)))
}

/// Rotate log files on startup
///
/// - interop.log.9 is deleted (oldest log)
/// - interop.log.8 -> interop.log.9, ..., interop.log.1 -> interop.log.2
/// - interop.log -> interop.log.1
/// - A fresh interop.log will be created by the logger
fn rotate_logs_on_startup(log_path: &Path) -> Result<()> {
    if !log_path.exists() {
        return Ok(());
    }

    let log_dir = log_path
        .parent()
        .ok_or_else(|| InteropError::ConfigError(StringError::new("Invalid log path")))?;

    let log_name = log_path
        .file_name()
        .ok_or_else(|| InteropError::ConfigError(StringError::new("Invalid log filename")))?
        .to_string_lossy();

    let oldest_log = log_dir.join(format!("{log_name}.{MAX_LOG_FILES}"));
    if oldest_log.exists() {
        std::fs::remove_file(&oldest_log)?;
    }

    for i in (1..MAX_LOG_FILES).rev() {
        let current_log = log_dir.join(format!("{log_name}.{i}"));
        let next_log = log_dir.join(format!("{log_name}.{}", i + 1));

        if current_log.exists() {
            std::fs::rename(&current_log, &next_log)?;
        }
    }

    let log_1 = log_dir.join(format!("{log_name}.1"));
    std::fs::rename(log_path, &log_1)?;

    Ok(())
}
