//! Generate TTS Audio step.

use std::sync::Arc;

use super::StepServices;
use crate::collaborators::{SynthesisRequest, TempoAlignment};
use crate::logging::LogSink;
use crate::orchestrator::errors::StepResult;
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{StepContext, StepOutcome};
use crate::workspace::DeckWorkspace;

pub struct GenerateSpeechStep {
    services: Arc<StepServices>,
}

impl GenerateSpeechStep {
    pub fn new(services: Arc<StepServices>) -> Self {
        Self { services }
    }
}

impl PipelineStep for GenerateSpeechStep {
    fn name(&self) -> &str {
        "Generate TTS Audio"
    }

    fn description(&self) -> &str {
        "Synthesize speech from the translated transcripts"
    }

    fn execute(&self, ctx: &StepContext) -> StepResult<StepOutcome> {
        let workspace = ctx.workspace();
        let output_dir = workspace.tts_audio_dir();

        let reference_audio_dir = workspace.reference_audio_dir();
        if reference_audio_dir.is_none() {
            ctx.info(&format!(
                "No original audio folder found ({}/). Tempo alignment will be skipped.",
                DeckWorkspace::REFERENCE_AUDIO_CANDIDATES.join("/, ")
            ));
        }

        let speech = &ctx.settings.speech;
        let request = SynthesisRequest {
            text_dir: workspace.translated_transcripts_dir(),
            output_dir: output_dir.clone(),
            source_language: ctx.job.source_language.clone(),
            target_language: ctx.job.target_language.clone(),
            tts_language: ctx.job.tts_language.clone(),
            model_map: speech.models.clone(),
            reference_audio_dir,
            tempo: TempoAlignment::from_settings(speech),
        };

        let audio_files = self.services.synthesizer.synthesize(&request, ctx)?;
        ctx.log(&format!(
            "Generated {} TTS audio files to: {}",
            audio_files.len(),
            output_dir.display()
        ));

        Ok(StepOutcome::Success)
    }
}
