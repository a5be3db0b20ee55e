//! Pipeline orchestrator for running deck processing steps.
//!
//! A run takes an ordered selection of steps and executes them one at a
//! time. Each step does its work on a blocking worker; the runner relays
//! the step's log lines, tracks progress and isolates failures so one
//! broken step never stops the ones after it.
//!
//! # Architecture
//!
//! ```text
//! Orchestrator (controller, owns RunLogger + progress)
//!     ├── Step: Extract + Convert Audio
//!     ├── Step: Extract Slide Text (.txt)
//!     ├── Step: Transcribe
//!     ├── Step: Translate Audio Transcripts
//!     ├── Step: Translate Slide Text (.txt)
//!     ├── Step: Generate TTS Audio
//!     └── Step: Reintegrate Text and Audio (Combined)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use oev_core::orchestrator::{create_standard_pipeline, Orchestrator, StepServices};
//!
//! let services = Arc::new(StepServices::from_settings(&settings));
//! let pipeline = create_standard_pipeline(services);
//! let steps = pipeline.select(&["Transcribe", "Translate Audio Transcripts"])?;
//!
//! let orchestrator = Orchestrator::new(logger, settings, job);
//! let report = orchestrator.run(&steps, acknowledged).await?;
//! println!("Completed: {:?}", report.completed);
//! ```

mod errors;
mod pipeline;
mod runner;
mod step;
pub mod steps;
mod types;

use std::sync::Arc;

pub use errors::{PipelineError, PipelineResult, StepError, StepResult};
pub use pipeline::Pipeline;
pub use runner::{Orchestrator, ACKNOWLEDGEMENT_REQUIRED, RUN_COMPLETE};
pub use step::PipelineStep;
pub use steps::{
    ExtractConvertAudioStep, ExtractSlideTextStep, GenerateSpeechStep, ReintegrateStep,
    SpeechInitializer, StepServices, TranscribeStep, TranslateSlideTextStep,
    TranslateTranscriptsStep, TranslationInitializer,
};
pub use types::{
    ProgressCallback, RunEvent, RunReport, RunSession, StepContext, StepOutcome, StepReporter,
};

/// Create the catalog of all steps in canonical order.
///
/// 1. Extract + Convert Audio - embedded audio to mono WAV
/// 2. Extract Slide Text - one text file per slide
/// 3. Transcribe - speech recognition
/// 4. Translate Audio Transcripts
/// 5. Translate Slide Text
/// 6. Generate TTS Audio - speech from translated transcripts
/// 7. Reintegrate - combined translated deck
pub fn create_standard_pipeline(services: Arc<StepServices>) -> Pipeline {
    Pipeline::new()
        .with_step(ExtractConvertAudioStep::new(Arc::clone(&services)))
        .with_step(ExtractSlideTextStep::new(Arc::clone(&services)))
        .with_step(TranscribeStep::new(Arc::clone(&services)))
        .with_step(TranslateTranscriptsStep::new(Arc::clone(&services)))
        .with_step(TranslateSlideTextStep::new(Arc::clone(&services)))
        .with_step(GenerateSpeechStep::new(Arc::clone(&services)))
        .with_step(ReintegrateStep::new(services))
}
