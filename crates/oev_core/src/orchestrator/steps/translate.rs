//! Translation steps for audio transcripts and slide text.
//!
//! Both load a translation model for the job's language pair, then translate
//! every `.txt` file of one folder into another. The model is only loaded
//! when there is something to translate.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::StepServices;
use crate::backend::LoadPolicy;
use crate::batch::list_files_with_extension;
use crate::logging::LogSink;
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{StepContext, StepOutcome};
use crate::translation::{translate_files, ChunkedTranslator};

/// Translate every `.txt` in `input_dir`. `None` when there was nothing to do.
fn translate_folder(
    services: &StepServices,
    ctx: &StepContext,
    input_dir: &Path,
    output_dir: &Path,
) -> StepResult<Option<Vec<PathBuf>>> {
    let inputs = list_files_with_extension(input_dir, "txt")
        .map_err(|e| StepError::io_error(format!("listing {}", input_dir.display()), e))?;
    if inputs.is_empty() {
        ctx.info(&format!("No .txt files found in: {}", input_dir.display()));
        return Ok(None);
    }

    let settings = &ctx.settings.translation;
    let policy = LoadPolicy::translation(settings, &ctx.settings.backend);
    let (mut translator, _) = ChunkedTranslator::load(
        &services.loader,
        services.translation_models.as_ref(),
        settings,
        &policy,
        &ctx.job.source_language,
        &ctx.job.target_language,
        ctx,
    )?;

    let written = translate_files(&mut translator, input_dir, output_dir, settings.max_chars, ctx)
        .map_err(|e| StepError::io_error("translating text files", e))?;
    Ok(Some(written))
}

/// Translate Audio Transcripts step.
pub struct TranslateTranscriptsStep {
    services: Arc<StepServices>,
}

impl TranslateTranscriptsStep {
    pub fn new(services: Arc<StepServices>) -> Self {
        Self { services }
    }
}

impl PipelineStep for TranslateTranscriptsStep {
    fn name(&self) -> &str {
        "Translate Audio Transcripts"
    }

    fn description(&self) -> &str {
        "Translate the audio transcripts"
    }

    fn execute(&self, ctx: &StepContext) -> StepResult<StepOutcome> {
        let workspace = ctx.workspace();
        let input_dir = workspace.transcripts_dir();
        let output_dir = workspace.translated_transcripts_dir();

        match translate_folder(&self.services, ctx, &input_dir, &output_dir)? {
            Some(written) => {
                ctx.log(&format!(
                    "Translated {} transcript files to: {}",
                    written.len(),
                    output_dir.display()
                ));
                Ok(StepOutcome::Success)
            }
            None => Ok(StepOutcome::Skipped("no transcripts to translate".to_string())),
        }
    }
}

/// Translate Slide Text step.
pub struct TranslateSlideTextStep {
    services: Arc<StepServices>,
}

impl TranslateSlideTextStep {
    pub fn new(services: Arc<StepServices>) -> Self {
        Self { services }
    }
}

impl PipelineStep for TranslateSlideTextStep {
    fn name(&self) -> &str {
        "Translate Slide Text (.txt)"
    }

    fn description(&self) -> &str {
        "Translate the extracted slide text"
    }

    fn execute(&self, ctx: &StepContext) -> StepResult<StepOutcome> {
        let workspace = ctx.workspace();
        let input_dir = workspace.slide_text_dir();
        let output_dir = workspace.translated_slide_text_dir();

        match translate_folder(&self.services, ctx, &input_dir, &output_dir)? {
            Some(written) => {
                ctx.log(&format!(
                    "Translated {} slide text files to: {}",
                    written.len(),
                    output_dir.display()
                ));
                Ok(StepOutcome::Success)
            }
            None => Ok(StepOutcome::Skipped("no slide text to translate".to_string())),
        }
    }
}
