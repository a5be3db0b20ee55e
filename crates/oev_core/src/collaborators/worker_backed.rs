//! Speech synthesis and reintegration delegated to the inference worker.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::{
    CollaboratorResult, DeckReintegrator, SpeechSynthesizer, SynthesisRequest,
};
use crate::backend::RuntimeEnvironment;
use crate::logging::LogSink;
use crate::worker::{WorkerCommand, WorkerProcess, WorkerRequest};

/// Text-to-speech through a short-lived worker.
pub struct WorkerSynthesizer {
    command: WorkerCommand,
    environment: Arc<dyn RuntimeEnvironment>,
}

impl WorkerSynthesizer {
    pub fn new(command: WorkerCommand, environment: Arc<dyn RuntimeEnvironment>) -> Self {
        Self {
            command,
            environment,
        }
    }
}

impl SpeechSynthesizer for WorkerSynthesizer {
    fn synthesize(
        &self,
        request: &SynthesisRequest,
        log: &dyn LogSink,
    ) -> CollaboratorResult<Vec<PathBuf>> {
        let voice = request
            .model_map
            .get(&request.tts_language)
            .map(String::as_str)
            .unwrap_or("default");
        log.info(&format!(
            "Synthesizing {} speech with '{}'",
            request.tts_language, voice
        ));

        let mut worker = WorkerProcess::spawn(&self.command, self.environment.as_ref())?;
        let response = worker.request(&WorkerRequest::Synthesize { request })?;
        Ok(response.files)
    }
}

/// Deck reintegration through a short-lived worker.
pub struct WorkerReintegrator {
    command: WorkerCommand,
    environment: Arc<dyn RuntimeEnvironment>,
}

impl WorkerReintegrator {
    pub fn new(command: WorkerCommand, environment: Arc<dyn RuntimeEnvironment>) -> Self {
        Self {
            command,
            environment,
        }
    }
}

impl DeckReintegrator for WorkerReintegrator {
    fn reintegrate(
        &self,
        deck: &Path,
        text_dir: &Path,
        audio_dir: &Path,
        output: &Path,
        log: &dyn LogSink,
    ) -> CollaboratorResult<PathBuf> {
        log.info(&format!("Reintegrating into {}", output.display()));
        let mut worker = WorkerProcess::spawn(&self.command, self.environment.as_ref())?;
        let response = worker.request(&WorkerRequest::Reintegrate {
            deck,
            text_dir,
            audio_dir,
            output,
        })?;
        Ok(response.output.unwrap_or_else(|| output.to_path_buf()))
    }
}
