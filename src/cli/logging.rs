//! Logging initialization

use crate::config::LoggerConfig;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// Initialize logging from the debug flag and logger configuration
///
/// RUST_LOG wins over the configured level. With `debug` the level is forced
/// to `debug` and output goes to a file: `logger.file` when set, otherwise a
/// fresh temporary file. Returns the log file path when logging to a file.
pub fn init_logging(debug: bool, logger: &LoggerConfig) -> Result<Option<PathBuf>> {
    let level = if debug { "debug" } else { logger.level.as_str() };
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .with_context(|| format!("Invalid log level: '{}'", level))?;

    let log_path = match (&logger.file, debug) {
        (Some(path), _) => Some(path.clone()),
        (None, true) => Some(temp_log_path()),
        (None, false) => None,
    };

    match &log_path {
        Some(path) => {
            let file = open_log_file(path)?;
            tracing_subscriber::fmt()
                .with_writer(Mutex::new(file))
                .with_env_filter(filter)
                .with_ansi(false) // No ANSI codes in log file
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_writer(std::io::stderr)
                .with_env_filter(filter)
                .with_target(false)
                .init();
        }
    }

    Ok(log_path)
}

/// Create a named temp file that outlives this process
fn temp_log_path() -> PathBuf {
    tempfile::Builder::new()
        .prefix("kubelinks-")
        .suffix(".log")
        .tempfile()
        .ok()
        .and_then(|f| f.keep().ok())
        .map(|(_, path)| path)
        .unwrap_or_else(|| {
            // Fallback: create file directly in temp_dir
            std::env::temp_dir().join(format!("kubelinks-{}.log", std::process::id()))
        })
}

fn open_log_file(path: &Path) -> Result<std::fs::File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        crate::config::paths::ensure_dir(parent)
            .with_context(|| format!("Failed to create log directory: {}", parent.display()))?;
    }

    std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file: {}", path.display()))
}
