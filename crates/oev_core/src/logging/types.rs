//! Logging types and configuration.

use serde::{Deserialize, Serialize};

/// Log level for filtering messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Trace-level debugging (very verbose).
    Trace,
    /// Debug information.
    Debug,
    /// General information.
    #[default]
    Info,
    /// Warnings.
    Warn,
    /// Errors.
    Error,
}

impl LogLevel {
    /// Convert to tracing level.
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }

    /// Filter directive understood by `EnvFilter`.
    pub fn as_filter_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Configuration for a run logger.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Number of recent lines kept for error diagnosis.
    pub error_tail: usize,
    /// Prefix every line with `[HH:MM:SS]`.
    pub show_timestamps: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            error_tail: 20,
            show_timestamps: true,
        }
    }
}

/// Callback receiving every log line (the interactive log view).
pub type LogCallback = Box<dyn Fn(&str) + Send + Sync>;

/// Callback receiving the curated summary lines.
pub type OutputCallback = Box<dyn Fn(&str) + Send + Sync>;

/// Leading markers that promote a log line to the summary channel.
pub const SUMMARY_PREFIXES: &[&str] = &[
    "[DONE]",
    "Combined",
    "Generated",
    "Translated",
    "Saved",
    "Selected",
    "Starting",
    "[WARN]",
    "[ERROR]",
];

/// Whether an (untimestamped) line belongs on the summary channel.
pub fn is_summary_line(line: &str) -> bool {
    let trimmed = line.trim_start();
    SUMMARY_PREFIXES.iter().any(|prefix| trimmed.starts_with(prefix))
}

/// Message prefix types for consistent formatting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessagePrefix {
    /// Informational: `[INFO]`
    Info,
    /// Warning: `[WARN]`
    Warn,
    /// Error: `[ERROR]`
    Error,
    /// Run finished: `[DONE]`
    Done,
    /// Step dispatch: `Starting: name`
    Starting,
    /// No prefix
    None,
}

impl MessagePrefix {
    /// Format a message with this prefix.
    pub fn format(&self, message: &str) -> String {
        match self {
            MessagePrefix::Info => format!("[INFO] {}", message),
            MessagePrefix::Warn => format!("[WARN] {}", message),
            MessagePrefix::Error => format!("[ERROR] {}", message),
            MessagePrefix::Done => format!("[DONE] {}", message),
            MessagePrefix::Starting => format!("Starting: {}", message),
            MessagePrefix::None => message.to_string(),
        }
    }
}

/// Anything that accepts human-readable log lines.
///
/// Implemented by the run logger on the controlling task and by the step
/// reporter that forwards lines from worker threads.
pub trait LogSink: Send + Sync {
    /// Emit one already-formatted line.
    fn log(&self, line: &str);

    fn info(&self, message: &str) {
        self.log(&MessagePrefix::Info.format(message));
    }

    fn warn(&self, message: &str) {
        self.log(&MessagePrefix::Warn.format(message));
    }

    fn error(&self, message: &str) {
        self.log(&MessagePrefix::Error.format(message));
    }
}

/// Sink that drops everything.
pub struct NullSink;

impl LogSink for NullSink {
    fn log(&self, _line: &str) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_allowlist() {
        assert!(is_summary_line("Starting: Transcribe"));
        assert!(is_summary_line("[WARN] Please confirm"));
        assert!(is_summary_line("Translated 3 transcript files to: /tmp/x"));
        assert!(is_summary_line("[DONE] All selected steps completed."));
        assert!(!is_summary_line("[INFO] Translating chunk 1/3"));
        assert!(!is_summary_line("Loading model"));
    }

    #[test]
    fn prefixes_format() {
        assert_eq!(MessagePrefix::Warn.format("x"), "[WARN] x");
        assert_eq!(MessagePrefix::Starting.format("Transcribe"), "Starting: Transcribe");
        assert_eq!(MessagePrefix::None.format("plain"), "plain");
    }
}
