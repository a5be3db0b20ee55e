//! Per-run logger with file, log view and summary outputs.
//!
//! Each pipeline run gets its own logger that:
//! - Writes to a dedicated log file (or stderr when the file is unavailable)
//! - Mirrors every line to the interactive log callback
//! - Forwards allowlisted lines to the summary callback
//! - Maintains a tail buffer for error diagnosis

use std::collections::VecDeque;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::Local;
use parking_lot::Mutex;

use super::types::{is_summary_line, LogCallback, LogConfig, LogSink, OutputCallback};

enum Sink {
    File(BufWriter<File>),
    Stderr,
}

/// Per-run logger. Never fails: sink errors are swallowed.
pub struct RunLogger {
    run_name: String,
    log_path: Option<PathBuf>,
    sink: Mutex<Option<Sink>>,
    log_callback: Option<LogCallback>,
    output_callback: Option<OutputCallback>,
    config: LogConfig,
    tail_buffer: Mutex<VecDeque<String>>,
}

impl RunLogger {
    /// Create a logger writing to `<log_dir>/<run_name>.log`.
    ///
    /// If the directory or file cannot be created the logger writes to stderr
    /// instead.
    pub fn new(
        run_name: impl Into<String>,
        log_dir: Option<&Path>,
        config: LogConfig,
        log_callback: Option<LogCallback>,
        output_callback: Option<OutputCallback>,
    ) -> Self {
        let run_name = run_name.into();
        let (sink, log_path) = match log_dir {
            Some(dir) => match open_log_file(dir, &run_name) {
                Ok((writer, path)) => (Sink::File(writer), Some(path)),
                Err(e) => {
                    tracing::warn!("Log file unavailable in {}: {}", dir.display(), e);
                    (Sink::Stderr, None)
                }
            },
            None => (Sink::Stderr, None),
        };

        Self {
            run_name,
            log_path,
            sink: Mutex::new(Some(sink)),
            log_callback,
            output_callback,
            tail_buffer: Mutex::new(VecDeque::with_capacity(config.error_tail)),
            config,
        }
    }

    /// Get the run name.
    pub fn run_name(&self) -> &str {
        &self.run_name
    }

    /// Path of the log file, if one could be opened.
    pub fn log_path(&self) -> Option<&Path> {
        self.log_path.as_deref()
    }

    /// Get the current tail buffer contents.
    pub fn get_tail(&self) -> Vec<String> {
        self.tail_buffer.lock().iter().cloned().collect()
    }

    /// Flush the log file.
    pub fn flush(&self) {
        if let Some(Sink::File(ref mut writer)) = *self.sink.lock() {
            let _ = writer.flush();
        }
    }

    /// Close the logger and release the file.
    pub fn close(&self) {
        self.flush();
        *self.sink.lock() = None;
    }

    fn format_message(&self, message: &str) -> String {
        if self.config.show_timestamps {
            let timestamp = Local::now().format("%H:%M:%S");
            format!("[{}] {}", timestamp, message)
        } else {
            message.to_string()
        }
    }

    fn write_line(&self, formatted: &str) {
        match *self.sink.lock() {
            Some(Sink::File(ref mut writer)) => {
                let _ = writeln!(writer, "{}", formatted);
            }
            Some(Sink::Stderr) => eprintln!("{}", formatted),
            None => {}
        }

        if let Some(ref callback) = self.log_callback {
            callback(formatted);
        }
    }
}

impl LogSink for RunLogger {
    fn log(&self, line: &str) {
        {
            let mut buffer = self.tail_buffer.lock();
            if buffer.len() >= self.config.error_tail.max(1) {
                buffer.pop_front();
            }
            buffer.push_back(line.to_string());
        }

        self.write_line(&self.format_message(line));

        if is_summary_line(line) {
            if let Some(ref callback) = self.output_callback {
                callback(line);
            }
        }
    }
}

impl Drop for RunLogger {
    fn drop(&mut self) {
        self.close();
    }
}

fn open_log_file(dir: &Path, run_name: &str) -> std::io::Result<(BufWriter<File>, PathBuf)> {
    fs::create_dir_all(dir)?;
    let path = dir.join(format!("{}.log", sanitize_filename(run_name)));
    let file = File::create(&path)?;
    Ok((BufWriter::new(file), path))
}

/// Sanitize a string to be safe for use as a filename.
pub(crate) fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            _ => c,
        })
        .collect()
}

/// Builder for creating a RunLogger with fluent API.
pub struct RunLoggerBuilder {
    run_name: String,
    log_dir: Option<PathBuf>,
    config: LogConfig,
    log_callback: Option<LogCallback>,
    output_callback: Option<OutputCallback>,
}

impl RunLoggerBuilder {
    /// Create a new builder.
    pub fn new(run_name: impl Into<String>) -> Self {
        Self {
            run_name: run_name.into(),
            log_dir: None,
            config: LogConfig::default(),
            log_callback: None,
            output_callback: None,
        }
    }

    /// Directory for the log file.
    pub fn log_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.log_dir = Some(dir.into());
        self
    }

    /// Set the logging configuration.
    pub fn config(mut self, config: LogConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the log view callback.
    pub fn log_callback(mut self, callback: LogCallback) -> Self {
        self.log_callback = Some(callback);
        self
    }

    /// Set the summary callback.
    pub fn output_callback(mut self, callback: OutputCallback) -> Self {
        self.output_callback = Some(callback);
        self
    }

    /// Build the RunLogger.
    pub fn build(self) -> RunLogger {
        RunLogger::new(
            self.run_name,
            self.log_dir.as_deref(),
            self.config,
            self.log_callback,
            self.output_callback,
        )
    }
}
