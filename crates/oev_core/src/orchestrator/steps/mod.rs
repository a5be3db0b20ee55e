//! The deck processing steps and the services they share.

mod audio;
mod reintegrate;
mod slide_text;
mod speech;
mod transcribe;
mod translate;

use std::sync::Arc;

use crate::backend::{AdaptiveModelLoader, ModelInitializer, ProcessEnvironment, SystemProbe};
use crate::collaborators::{
    AudioConverter, DeckExtractor, DeckReintegrator, FfmpegConverter, PptxDeck,
    SpeechSynthesizer, WorkerReintegrator, WorkerSynthesizer,
};
use crate::config::Settings;
use crate::transcription::SpeechModel;
use crate::translation::TranslationModel;
use crate::worker::{WorkerCommand, WorkerSpeechInitializer, WorkerTranslationInitializer};

pub use audio::ExtractConvertAudioStep;
pub use reintegrate::ReintegrateStep;
pub use slide_text::ExtractSlideTextStep;
pub use speech::GenerateSpeechStep;
pub use transcribe::TranscribeStep;
pub use translate::{TranslateSlideTextStep, TranslateTranscriptsStep};

/// Creates speech recognition model handles.
pub type SpeechInitializer = dyn ModelInitializer<Handle = Box<dyn SpeechModel>>;

/// Creates translation model handles.
pub type TranslationInitializer = dyn ModelInitializer<Handle = Box<dyn TranslationModel>>;

/// Collaborators and model backends used by the steps.
pub struct StepServices {
    pub deck: Arc<dyn DeckExtractor>,
    pub converter: Arc<dyn AudioConverter>,
    pub synthesizer: Arc<dyn SpeechSynthesizer>,
    pub reintegrator: Arc<dyn DeckReintegrator>,
    pub loader: AdaptiveModelLoader,
    pub speech_models: Arc<SpeechInitializer>,
    pub translation_models: Arc<TranslationInitializer>,
}

impl StepServices {
    /// Wire the real adapters: zip deck reader, ffmpeg, and the inference
    /// worker for models and speech.
    pub fn from_settings(settings: &Settings) -> Self {
        let environment = Arc::new(ProcessEnvironment::new());
        let probe = Arc::new(SystemProbe::from_settings(&settings.backend));
        let command = WorkerCommand::from_settings(&settings.backend);

        Self {
            deck: Arc::new(PptxDeck::new()),
            converter: Arc::new(FfmpegConverter::from_settings(&settings.tools)),
            synthesizer: Arc::new(WorkerSynthesizer::new(command.clone(), environment.clone())),
            reintegrator: Arc::new(WorkerReintegrator::new(command.clone(), environment.clone())),
            loader: AdaptiveModelLoader::new(probe, environment.clone()),
            speech_models: Arc::new(WorkerSpeechInitializer::new(
                command.clone(),
                environment.clone(),
            )),
            translation_models: Arc::new(WorkerTranslationInitializer::new(command, environment)),
        }
    }
}
