//! Model initialization errors.

use thiserror::Error;

use super::profile::{DeviceKind, ModelKind};

/// One failed initialization attempt.
#[derive(Error, Debug, Clone)]
#[error("{message}")]
pub struct InitFailure {
    pub message: String,
}

impl InitFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Every candidate configuration failed.
#[derive(Error, Debug)]
#[error("Failed to initialize {} model '{model}' on device '{device}' after {attempts} attempt(s): {last}", .kind.label())]
pub struct InitializationError {
    pub kind: ModelKind,
    pub model: String,
    pub device: DeviceKind,
    pub attempts: usize,
    #[source]
    pub last: InitFailure,
}

/// Inference call failed on an already loaded model.
#[derive(Error, Debug, Clone)]
#[error("{message}")]
pub struct InferenceError {
    pub message: String,
}

impl InferenceError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
