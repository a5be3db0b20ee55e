//! Core types for the orchestrator pipeline.

use std::sync::Arc;

use chrono::{DateTime, Local};
use serde::Serialize;
use tokio::sync::mpsc::UnboundedSender;
use uuid::Uuid;

use super::errors::StepResult;
use crate::config::Settings;
use crate::logging::LogSink;
use crate::workspace::{DeckJob, DeckWorkspace};

/// Progress callback type for reporting pipeline progress.
///
/// Arguments: (step_name, percent_complete, message)
pub type ProgressCallback = Box<dyn Fn(&str, u32, &str) + Send + Sync>;

/// Result of executing a pipeline step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// Step completed successfully.
    Success,
    /// Step had nothing to do (not an error).
    Skipped(String),
}

/// Message sent from a step's worker back to the controller.
#[derive(Debug)]
pub enum RunEvent {
    /// One log line, unformatted.
    Log { line: String },
    /// The step returned. Always the last event of a step.
    Finished { result: StepResult<StepOutcome> },
}

/// Worker-side handle for sending events to the controller.
///
/// Sending never blocks. Events sent after the controller went away
/// are dropped.
#[derive(Debug, Clone)]
pub struct StepReporter {
    tx: UnboundedSender<RunEvent>,
}

impl StepReporter {
    pub fn new(tx: UnboundedSender<RunEvent>) -> Self {
        Self { tx }
    }

    pub fn finish(&self, result: StepResult<StepOutcome>) {
        let _ = self.tx.send(RunEvent::Finished { result });
    }
}

impl LogSink for StepReporter {
    fn log(&self, message: &str) {
        let _ = self.tx.send(RunEvent::Log {
            line: message.to_string(),
        });
    }
}

/// Read-only context passed to a pipeline step.
///
/// Everything a step logs goes through the reporter, so a step never
/// touches the run logger directly.
pub struct StepContext {
    /// Name of the running step.
    pub step_name: String,
    /// Application settings.
    pub settings: Arc<Settings>,
    /// The deck being processed.
    pub job: Arc<DeckJob>,
    reporter: StepReporter,
}

impl StepContext {
    pub fn new(
        step_name: impl Into<String>,
        settings: Arc<Settings>,
        job: Arc<DeckJob>,
        reporter: StepReporter,
    ) -> Self {
        Self {
            step_name: step_name.into(),
            settings,
            job,
            reporter,
        }
    }

    /// Working folders of the deck.
    pub fn workspace(&self) -> &DeckWorkspace {
        &self.job.workspace
    }

    pub fn reporter(&self) -> &StepReporter {
        &self.reporter
    }
}

impl LogSink for StepContext {
    fn log(&self, message: &str) {
        self.reporter.log(message);
    }
}

/// Bookkeeping for one run, owned by the controller.
#[derive(Debug, Clone)]
pub struct RunSession {
    pub run_id: Uuid,
    pub started_at: DateTime<Local>,
    /// Number of selected steps, at least 1.
    pub total: usize,
    /// Steps that finished with success or skip.
    pub progress: usize,
}

impl RunSession {
    pub fn new(step_count: usize) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Local::now(),
            total: step_count.max(1),
            progress: 0,
        }
    }

    /// Count one finished step. Never exceeds `total`.
    pub fn advance(&mut self) {
        self.progress = (self.progress + 1).min(self.total);
    }

    pub fn percent(&self) -> u32 {
        ((self.progress * 100) / self.total) as u32
    }

    pub fn is_complete(&self) -> bool {
        self.progress >= self.total
    }
}

/// Summary of a finished run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Local>,
    pub completed: Vec<String>,
    pub skipped: Vec<String>,
    /// `(step, cause)` for each failed step.
    pub failed: Vec<(String, String)>,
    /// Log tail captured when the last failure was reported.
    pub error_tail: Vec<String>,
}

impl RunReport {
    pub fn new(session: &RunSession) -> Self {
        Self {
            run_id: session.run_id,
            started_at: session.started_at,
            completed: Vec::new(),
            skipped: Vec::new(),
            failed: Vec::new(),
            error_tail: Vec::new(),
        }
    }

    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }
}
