//! Reintegrate step - writes translated slide text and generated audio into
//! a copy of the deck.

use std::sync::Arc;

use super::StepServices;
use crate::logging::LogSink;
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{StepContext, StepOutcome};

pub struct ReintegrateStep {
    services: Arc<StepServices>,
}

impl ReintegrateStep {
    pub fn new(services: Arc<StepServices>) -> Self {
        Self { services }
    }
}

impl PipelineStep for ReintegrateStep {
    fn name(&self) -> &str {
        "Reintegrate Text and Audio (Combined)"
    }

    fn description(&self) -> &str {
        "Build the combined translated deck"
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
        let output = self.services.reintegrator.reintegrate(
            workspace.deck(),
            &workspace.translated_slide_text_dir(),
            &workspace.tts_audio_dir(),
            &workspace.combined_output(),
            ctx,
        )?;
        ctx.log(&format!(
            "Combined reintegrated PPTX saved to: {}",
            output.display()
        ));

        Ok(StepOutcome::Success)
    }
}
