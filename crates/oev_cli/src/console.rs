//! Terminal rendering of a run: full log on stderr, outcome lines on stdout.

use std::io::{self, Write};

use oev_core::logging::{LogCallback, OutputCallback};
use oev_core::orchestrator::ProgressCallback;

/// Builds the callbacks a run reports through.
#[derive(Debug, Clone, Copy)]
pub struct ConsoleObserver {
    quiet: bool,
}

impl ConsoleObserver {
    pub fn new(quiet: bool) -> Self {
        Self { quiet }
    }

    /// Every log line, unless quiet.
    pub fn log_callback(&self) -> Option<LogCallback> {
        if self.quiet {
            return None;
        }
        Some(Box::new(|line: &str| eprintln!("{}", line)))
    }

    /// Outcome lines.
    pub fn output_callback(&self) -> OutputCallback {
        Box::new(|line: &str| {
            let mut out = io::stdout().lock();
            let _ = writeln!(out, "{}", line);
            let _ = out.flush();
        })
    }

    pub fn progress_callback(&self) -> ProgressCallback {
        Box::new(|step: &str, percent: u32, message: &str| {
            eprintln!("{}", progress_line(step, percent, message));
        })
    }
}

fn progress_line(step: &str, percent: u32, message: &str) -> String {
    if step.is_empty() {
        format!("[{:>3}%] {}", percent, message)
    } else {
        format!("[{:>3}%] {}: {}", percent, step, message)
    }
}
