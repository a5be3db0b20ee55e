//! Transcribe step - speech recognition over the converted WAV files.

use std::sync::Arc;

use super::StepServices;
use crate::backend::LoadPolicy;
use crate::logging::LogSink;
use crate::orchestrator::errors::StepResult;
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{StepContext, StepOutcome};
use crate::transcription::TranscriptionEngine;

pub struct TranscribeStep {
    services: Arc<StepServices>,
}

impl TranscribeStep {
    pub fn new(services: Arc<StepServices>) -> Self {
        Self { services }
    }
}

impl PipelineStep for TranscribeStep {
    fn name(&self) -> &str {
        "Transcribe"
    }

    fn description(&self) -> &str {
        "Transcribe converted audio to text"
    }

    fn execute(&self, ctx: &StepContext) -> StepResult<StepOutcome> {
        let settings = &ctx.settings;
        let workspace = ctx.workspace();
        let output_dir = workspace.transcripts_dir();

        let engine = TranscriptionEngine::new(
            &self.services.loader,
            self.services.speech_models.as_ref(),
            LoadPolicy::speech(&settings.transcription, &settings.backend),
            &settings.transcription,
        );
        // Load and per-file failures are logged by the engine.
        let written = engine.transcribe_all(&workspace.converted_wav_dir(), &output_dir, None, ctx);
        ctx.log(&format!(
            "Saved {} transcripts to: {}",
            written.len(),
            output_dir.display()
        ));

        Ok(StepOutcome::Success)
    }
}
