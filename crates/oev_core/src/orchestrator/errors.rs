//! Error types for the orchestrator pipeline.
//!
//! Errors carry context that chains through layers:
//! Run → Step → Operation → Detail

use std::io;
use std::path::Path;

use thiserror::Error;

use crate::backend::InitializationError;
use crate::collaborators::CollaboratorError;
use crate::translation::TranslationError;

/// Top-level error for a run that could not start.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The run was requested without the acknowledgement gate open.
    #[error("Precondition not met: {message}")]
    PreconditionNotMet { message: String },

    /// Two selected steps share a name.
    #[error("Step '{name}' was selected more than once")]
    DuplicateStep { name: String },

    /// A requested step name is not in the catalog.
    #[error("Unknown step '{name}'")]
    UnknownStep { name: String },
}

impl PipelineError {
    /// Create a precondition error.
    pub fn precondition_not_met(message: impl Into<String>) -> Self {
        Self::PreconditionNotMet {
            message: message.into(),
        }
    }

    /// Create a duplicate step error.
    pub fn duplicate_step(name: impl Into<String>) -> Self {
        Self::DuplicateStep { name: name.into() }
    }

    /// Create an unknown step error.
    pub fn unknown_step(name: impl Into<String>) -> Self {
        Self::UnknownStep { name: name.into() }
    }
}

/// Error from a pipeline step with operation context.
#[derive(Error, Debug)]
pub enum StepError {
    /// Input validation failed.
    #[error("Input validation failed: {0}")]
    InvalidInput(String),

    /// File I/O error.
    #[error("I/O error in {operation}: {source}")]
    IoError {
        operation: String,
        #[source]
        source: io::Error,
    },

    /// A required file was not found.
    #[error("Required file not found: {path}")]
    FileNotFound { path: String },

    /// No model could be loaded.
    #[error(transparent)]
    Initialization(#[from] InitializationError),

    #[error(transparent)]
    Translation(#[from] TranslationError),

    #[error(transparent)]
    Collaborator(#[from] CollaboratorError),

    /// The step's worker panicked.
    #[error("Step panicked: {0}")]
    Panicked(String),

    /// Generic step error with message.
    #[error("{0}")]
    Other(String),
}

impl StepError {
    /// Create an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Create an I/O error with context.
    pub fn io_error(operation: impl Into<String>, source: io::Error) -> Self {
        Self::IoError {
            operation: operation.into(),
            source,
        }
    }

    /// Create a file not found error.
    pub fn file_not_found(path: &Path) -> Self {
        Self::FileNotFound {
            path: path.display().to_string(),
        }
    }

    /// Create a panic error.
    pub fn panicked(message: impl Into<String>) -> Self {
        Self::Panicked(message.into())
    }

    /// Create a generic error.
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }
}

/// Result type for step operations.
pub type StepResult<T> = Result<T, StepError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_error_keeps_operation_context() {
        let err = StepError::io_error(
            "creating transcripts folder",
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        assert_eq!(
            err.to_string(),
            "I/O error in creating transcripts folder: denied"
        );
    }

    #[test]
    fn pipeline_error_messages() {
        assert_eq!(
            PipelineError::duplicate_step("Transcribe").to_string(),
            "Step 'Transcribe' was selected more than once"
        );
        assert_eq!(
            PipelineError::precondition_not_met("acknowledgement missing").to_string(),
            "Precondition not met: acknowledgement missing"
        );
    }

    #[test]
    fn collaborator_errors_convert() {
        let err: StepError = CollaboratorError::ToolMissing {
            tool: "ffmpeg".to_string(),
        }
        .into();
        assert!(matches!(err, StepError::Collaborator(_)));
    }
}
