//! Logging infrastructure for OpenEduVoice.
//!
//! This module provides:
//! - Per-run loggers with file + log view + summary outputs
//! - A summary allowlist for outcome lines
//! - Tail buffer for error diagnosis
//! - Integration with the `tracing` ecosystem
//!
//! # Example
//!
//! ```no_run
//! use oev_core::logging::{LogSink, RunLoggerBuilder};
//!
//! let logger = RunLoggerBuilder::new("lecture_run")
//!     .log_dir("/path/to/logs")
//!     .output_callback(Box::new(|line| println!("{line}")))
//!     .build();
//!
//! logger.log("Starting: Transcribe");
//! logger.info("Transcribed: a.wav -> a.txt (120 chars)");
//! logger.warn("Model init failed with device=cuda");
//! ```

mod run_logger;
mod types;

pub use run_logger::{RunLogger, RunLoggerBuilder};
pub use types::{
    is_summary_line, LogCallback, LogConfig, LogLevel, LogSink, MessagePrefix, NullSink,
    OutputCallback, SUMMARY_PREFIXES,
};

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize global tracing subscriber for application-wide logging.
///
/// Respects `RUST_LOG` and falls back to the provided level. Output goes to
/// stderr. Should be called once at application startup.
pub fn init_tracing(default_level: LogLevel) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level.as_filter_str()));

    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(false))
        .with(filter)
        .try_init();
}

/// Initialize tracing with a daily rolling file under `logs_dir`.
///
/// Keep the returned guard alive for the lifetime of the program; dropping it
/// flushes the background writer.
pub fn init_tracing_with_file(default_level: LogLevel, logs_dir: &Path) -> Option<WorkerGuard> {
    if let Err(e) = std::fs::create_dir_all(logs_dir) {
        eprintln!("Warning: cannot create {}: {}", logs_dir.display(), e);
        init_tracing(default_level);
        return None;
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level.as_filter_str()));
    let appender = tracing_appender::rolling::daily(logs_dir, "openeduvoice.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let _ = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(true)
                .with_ansi(false)
                .with_writer(writer),
        )
        .with(filter)
        .try_init();

    Some(guard)
}

/// Initialize tracing for tests (only logs warnings and above).
#[cfg(test)]
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("warn")
        .with_test_writer()
        .try_init();
}
