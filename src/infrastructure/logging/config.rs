//! Logger settings derived from the `logging` config section.

use std::path::PathBuf;

use crate::domain::models::LoggingConfig;

/// Console output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// One JSON object per line
    Json,
    /// Human-readable
    Pretty,
}

/// Where console output goes.
///
/// MCP stdio servers must log to stderr because stdout carries JSON-RPC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogWriter {
    /// Standard output
    Stdout,
    /// Standard error
    Stderr,
}

/// Resolved logger settings
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Default level for the env filter
    pub level: String,
    /// Console format
    pub format: LogFormat,
    /// Console stream
    pub writer: LogWriter,
    /// Directory for daily-rolling JSON log files
    pub log_dir: Option<PathBuf>,
}

impl LogConfig {
    /// Resolve the config section for a given console stream
    pub fn from_settings(settings: &LoggingConfig, writer: LogWriter) -> Self {
        let format = if settings.format.eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Pretty
        };

        Self {
            level: settings.level.clone(),
            format,
            writer,
            log_dir: settings.log_dir.as_ref().map(PathBuf::from),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self::from_settings(&LoggingConfig::default(), LogWriter::Stdout)
    }
}
