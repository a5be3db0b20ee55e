//! Extract Slide Text step - one text file per slide.

use std::sync::Arc;

use super::StepServices;
use crate::logging::LogSink;
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{StepContext, StepOutcome};

pub struct ExtractSlideTextStep {
    services: Arc<StepServices>,
}

impl ExtractSlideTextStep {
    pub fn new(services: Arc<StepServices>) -> Self {
        Self { services }
    }
}

impl PipelineStep for ExtractSlideTextStep {
    fn name(&self) -> &str {
        "Extract Slide Text (.txt)"
    }

    fn description(&self) -> &str {
        "Write the text of every slide to slide_<n>.txt"
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
        let output_dir = workspace.slide_text_dir();

        let extracted = self
            .services
            .deck
            .extract_slide_text(workspace.deck(), &output_dir, ctx)?;
        ctx.log(&format!(
            "Extracted {} text files to: {}",
            extracted.len(),
            output_dir.display()
        ));

        Ok(StepOutcome::Success)
    }
}
