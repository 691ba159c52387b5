//! Logging initialisation via tracing-subscriber.

use std::path::{Path, PathBuf};

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::BoxMakeWriter;

use crate::error::ToolError;

const DEFAULT_LEVEL: &str = "info";

/// Where the interactive chat writes its log, since the TUI owns the terminal.
pub fn default_log_file() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("topica")
        .join("topica.log")
}

/// Builds the filter. An explicit `level` wins over `RUST_LOG`, which wins
/// over the default.
fn build_filter(level: Option<&str>) -> Result<EnvFilter, ToolError> {
    match level {
        Some(level) => EnvFilter::try_new(level)
            .map_err(|e| ToolError::Logger(format!("invalid log level '{level}': {e}"))),
        None => EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(DEFAULT_LEVEL))
            .map_err(|e| ToolError::Logger(format!("invalid RUST_LOG: {e}"))),
    }
}

/// Installs the global subscriber, writing to `log_file` (appending) or to
/// stderr.
pub fn init(level: Option<&str>, log_file: Option<&Path>) -> Result<(), ToolError> {
    let filter = build_filter(level)?;

    let writer = match log_file {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| {
                    ToolError::Logger(format!("failed to open log file '{}': {e}", path.display()))
                })?;
            BoxMakeWriter::new(file)
        }
        None => BoxMakeWriter::new(std::io::stderr),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(log_file.is_none())
        .try_init()
        .map_err(|e| ToolError::Logger(format!("failed to set subscriber: {e}")))
}
