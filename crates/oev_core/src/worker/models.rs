//! Model handles and initializers backed by the worker process.

use std::path::Path;
use std::sync::Arc;

use super::process::{WorkerCommand, WorkerError, WorkerProcess};
use super::protocol::WorkerRequest;
use crate::backend::{
    InferenceError, InitFailure, LoadRequest, ModelInitializer, ModelKind, RuntimeEnvironment,
};
use crate::transcription::{Segment, SpeechModel, TranscribeOptions};
use crate::translation::{DecodingOptions, TranslationModel};

impl From<WorkerError> for InitFailure {
    fn from(e: WorkerError) -> Self {
        InitFailure::new(e.to_string())
    }
}

impl From<WorkerError> for InferenceError {
    fn from(e: WorkerError) -> Self {
        InferenceError::new(e.to_string())
    }
}

/// Start a worker and ask it to load the requested model.
fn spawn_loaded(
    command: &WorkerCommand,
    environment: &dyn RuntimeEnvironment,
    request: &LoadRequest<'_>,
) -> Result<WorkerProcess, InitFailure> {
    let mut process = WorkerProcess::spawn(command, environment)?;
    process.request(&WorkerRequest::Load {
        kind: request.kind,
        model: request.model,
        device: request.profile.device,
        compute_type: request.profile.precision,
        languages: request.languages,
    })?;
    Ok(process)
}

/// Speech model living in a worker process.
pub struct WorkerSpeechModel {
    process: WorkerProcess,
}

impl SpeechModel for WorkerSpeechModel {
    fn transcribe(
        &mut self,
        audio: &Path,
        options: &TranscribeOptions,
    ) -> Result<Vec<Segment>, InferenceError> {
        let response = self
            .process
            .request(&WorkerRequest::Transcribe { audio, options })?;
        Ok(response.segments)
    }
}

/// Translation model living in a worker process.
pub struct WorkerTranslationModel {
    process: WorkerProcess,
}

impl TranslationModel for WorkerTranslationModel {
    fn translate_chunk(
        &mut self,
        text: &str,
        options: &DecodingOptions,
    ) -> Result<String, InferenceError> {
        let response = self
            .process
            .request(&WorkerRequest::Translate { text, options })?;
        response
            .text
            .ok_or_else(|| InferenceError::new("worker returned no text"))
    }

    fn release_cache(&mut self) {
        if let Err(e) = self.process.request(&WorkerRequest::ReleaseCache) {
            tracing::debug!("release_cache failed: {}", e);
        }
    }
}

/// Loads speech models in fresh worker processes.
pub struct WorkerSpeechInitializer {
    command: WorkerCommand,
    environment: Arc<dyn RuntimeEnvironment>,
}

impl WorkerSpeechInitializer {
    pub fn new(command: WorkerCommand, environment: Arc<dyn RuntimeEnvironment>) -> Self {
        Self {
            command,
            environment,
        }
    }
}

impl ModelInitializer for WorkerSpeechInitializer {
    type Handle = Box<dyn SpeechModel>;

    fn initialize(&self, request: &LoadRequest<'_>) -> Result<Self::Handle, InitFailure> {
        debug_assert_eq!(request.kind, ModelKind::Speech);
        let process = spawn_loaded(&self.command, self.environment.as_ref(), request)?;
        Ok(Box::new(WorkerSpeechModel { process }))
    }
}

/// Loads translation models in fresh worker processes.
pub struct WorkerTranslationInitializer {
    command: WorkerCommand,
    environment: Arc<dyn RuntimeEnvironment>,
}

impl WorkerTranslationInitializer {
    pub fn new(command: WorkerCommand, environment: Arc<dyn RuntimeEnvironment>) -> Self {
        Self {
            command,
            environment,
        }
    }
}

impl ModelInitializer for WorkerTranslationInitializer {
    type Handle = Box<dyn TranslationModel>;

    fn initialize(&self, request: &LoadRequest<'_>) -> Result<Self::Handle, InitFailure> {
        if request.languages.is_none() {
            return Err(InitFailure::new("translation model requires a language pair"));
        }
        let process = spawn_loaded(&self.command, self.environment.as_ref(), request)?;
        Ok(Box::new(WorkerTranslationModel { process }))
    }
}
