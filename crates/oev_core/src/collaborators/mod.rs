//! External stages the pipeline delegates to.
//!
//! Each seam is a trait so steps can be exercised with fakes; the concrete
//! adapters read the deck container directly, shell out to ffmpeg, or hand the
//! work to the inference worker.

mod deck;
mod ffmpeg;
mod worker_backed;

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

use crate::config::SpeechSettings;
use crate::logging::LogSink;
use crate::worker::WorkerError;

pub use deck::PptxDeck;
pub use ffmpeg::FfmpegConverter;
pub use worker_backed::{WorkerReintegrator, WorkerSynthesizer};

/// Errors from collaborator adapters.
#[derive(Error, Debug)]
pub enum CollaboratorError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid deck archive: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("Invalid slide XML in {part}: {source}")]
    Xml {
        part: String,
        #[source]
        source: roxmltree::Error,
    },

    #[error("{tool} not found on PATH")]
    ToolMissing { tool: String },

    #[error(transparent)]
    Worker(#[from] WorkerError),

    #[error("File not found: {0}")]
    NotFound(PathBuf),
}

impl CollaboratorError {
    pub fn xml(part: impl Into<String>, source: roxmltree::Error) -> Self {
        Self::Xml {
            part: part.into(),
            source,
        }
    }
}

/// Result type for collaborator calls.
pub type CollaboratorResult<T> = Result<T, CollaboratorError>;

/// Reads embedded media and slide text out of a deck.
pub trait DeckExtractor: Send + Sync {
    /// Write embedded audio into `media_dir`; returns the written paths.
    fn extract_audio(
        &self,
        deck: &Path,
        media_dir: &Path,
        log: &dyn LogSink,
    ) -> CollaboratorResult<Vec<PathBuf>>;

    /// Write `slide_<n>.txt` per slide into `out_dir`.
    fn extract_slide_text(
        &self,
        deck: &Path,
        out_dir: &Path,
        log: &dyn LogSink,
    ) -> CollaboratorResult<Vec<PathBuf>>;
}

/// Converts audio files to mono WAV.
pub trait AudioConverter: Send + Sync {
    fn convert_to_wav(
        &self,
        input_dir: &Path,
        output_dir: &Path,
        log: &dyn LogSink,
    ) -> CollaboratorResult<Vec<PathBuf>>;
}

/// Tempo alignment bounds for synthesized audio.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TempoAlignment {
    pub deadband_sec: f64,
    pub deadband_ratio: f64,
    pub clamp_min: f64,
    pub clamp_max: f64,
}

impl TempoAlignment {
    pub fn from_settings(settings: &SpeechSettings) -> Self {
        Self {
            deadband_sec: settings.deadband_sec,
            deadband_ratio: settings.deadband_ratio,
            clamp_min: settings.tempo_min,
            clamp_max: settings.tempo_max,
        }
    }
}

/// Everything speech synthesis needs for one directory.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SynthesisRequest {
    pub text_dir: PathBuf,
    pub output_dir: PathBuf,
    pub source_language: String,
    pub target_language: String,
    pub tts_language: String,
    pub model_map: BTreeMap<String, String>,
    /// Original audio used to match durations; `None` skips alignment.
    pub reference_audio_dir: Option<PathBuf>,
    pub tempo: TempoAlignment,
}

/// Turns translated text into speech.
pub trait SpeechSynthesizer: Send + Sync {
    fn synthesize(
        &self,
        request: &SynthesisRequest,
        log: &dyn LogSink,
    ) -> CollaboratorResult<Vec<PathBuf>>;
}

/// Writes translated text and generated audio back into a deck.
pub trait DeckReintegrator: Send + Sync {
    fn reintegrate(
        &self,
        deck: &Path,
        text_dir: &Path,
        audio_dir: &Path,
        output: &Path,
        log: &dyn LogSink,
    ) -> CollaboratorResult<PathBuf>;
}
