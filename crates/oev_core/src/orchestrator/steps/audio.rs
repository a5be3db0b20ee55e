//! Extract + Convert Audio step - pulls embedded audio out of the deck and
//! converts it to mono WAV for transcription.

use std::sync::Arc;

use super::StepServices;
use crate::logging::LogSink;
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{StepContext, StepOutcome};

pub struct ExtractConvertAudioStep {
    services: Arc<StepServices>,
}

impl ExtractConvertAudioStep {
    pub fn new(services: Arc<StepServices>) -> Self {
        Self { services }
    }
}

impl PipelineStep for ExtractConvertAudioStep {
    fn name(&self) -> &str {
        "Extract + Convert Audio"
    }

    fn description(&self) -> &str {
        "Extract embedded audio and convert it to WAV"
    }

    fn validate_input(&self, ctx: &StepContext) -> StepResult<()> {
        let deck = ctx.workspace().deck();
        if !deck.is_file() {
            return Err(StepError::file_not_found(deck));
        }
        Ok(())
    }

    fn execute(&self, ctx: &StepContext) -> StepResult<StepOutcome> {
        let workspace = ctx.workspace();
        let media_dir = workspace.media_dir();
        let wav_dir = workspace.converted_wav_dir();

        let extracted = self
            .services
            .deck
            .extract_audio(workspace.deck(), &media_dir, ctx)?;
        ctx.log(&format!(
            "Extracted {} audio files to: {}",
            extracted.len(),
            media_dir.display()
        ));

        let converted = self
            .services
            .converter
            .convert_to_wav(&media_dir, &wav_dir, ctx)?;
        ctx.log(&format!(
            "Converted {} audio files to WAV in: {}",
            converted.len(),
            wav_dir.display()
        ));

        Ok(StepOutcome::Success)
    }
}
