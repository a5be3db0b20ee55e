//! Newline-delimited JSON messages exchanged with the inference worker.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::backend::{DeviceKind, ModelKind, Precision};
use crate::collaborators::SynthesisRequest;
use crate::transcription::{Segment, TranscribeOptions};
use crate::translation::{DecodingOptions, LanguagePair};

/// One request line.
#[derive(Debug, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum WorkerRequest<'a> {
    Load {
        kind: ModelKind,
        model: &'a str,
        device: DeviceKind,
        compute_type: Precision,
        #[serde(skip_serializing_if = "Option::is_none")]
        languages: Option<&'a LanguagePair>,
    },
    Transcribe {
        audio: &'a Path,
        options: &'a TranscribeOptions,
    },
    Translate {
        text: &'a str,
        options: &'a DecodingOptions,
    },
    ReleaseCache,
    Synthesize {
        request: &'a SynthesisRequest,
    },
    Reintegrate {
        deck: &'a Path,
        text_dir: &'a Path,
        audio_dir: &'a Path,
        output: &'a Path,
    },
    Shutdown,
}

impl WorkerRequest<'_> {
    /// Operation name for log lines.
    pub fn op(&self) -> &'static str {
        match self {
            WorkerRequest::Load { .. } => "load",
            WorkerRequest::Transcribe { .. } => "transcribe",
            WorkerRequest::Translate { .. } => "translate",
            WorkerRequest::ReleaseCache => "release_cache",
            WorkerRequest::Synthesize { .. } => "synthesize",
            WorkerRequest::Reintegrate { .. } => "reintegrate",
            WorkerRequest::Shutdown => "shutdown",
        }
    }
}

/// One response line. Fields not relevant to the request are absent.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WorkerResponse {
    pub ok: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub segments: Vec<Segment>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub files: Vec<PathBuf>,
    #[serde(default)]
    pub output: Option<PathBuf>,
}
