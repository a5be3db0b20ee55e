//! Settings struct with TOML-based sections.
//!
//! Settings are organized into logical sections that map to TOML tables.
//! Each section can be updated independently for atomic section-level updates.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::logging::LogLevel;

/// Root settings structure containing all configuration sections.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Path-related settings.
    #[serde(default)]
    pub paths: PathSettings,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingSettings,

    /// Compute backend and inference worker.
    #[serde(default)]
    pub backend: BackendSettings,

    /// Speech-to-text settings.
    #[serde(default)]
    pub transcription: TranscriptionSettings,

    /// Text translation settings.
    #[serde(default)]
    pub translation: TranslationSettings,

    /// Speech synthesis settings.
    #[serde(default)]
    pub speech: SpeechSettings,

    /// External tool settings.
    #[serde(default)]
    pub tools: ToolSettings,
}

/// Path configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathSettings {
    /// Folder for log files.
    #[serde(default = "default_logs_folder")]
    pub logs_folder: String,

    /// Last selected slide deck.
    #[serde(default)]
    pub last_deck_path: String,
}

fn default_logs_folder() -> String {
    ".logs".to_string()
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            logs_folder: default_logs_folder(),
            last_deck_path: String::new(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Minimum level for the application tracing subscriber.
    #[serde(default)]
    pub level: LogLevel,

    /// Number of recent lines kept for error diagnosis.
    #[serde(default = "default_error_tail")]
    pub error_tail: u32,

    /// Prefix run log lines with a timestamp.
    #[serde(default = "default_true")]
    pub show_timestamps: bool,
}

fn default_error_tail() -> u32 {
    20
}

fn default_true() -> bool {
    true
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            error_tail: default_error_tail(),
            show_timestamps: true,
        }
    }
}

/// Compute backend probing and the inference worker command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendSettings {
    /// Program that hosts the inference runtime.
    #[serde(default = "default_worker_program")]
    pub worker_program: String,

    /// Arguments passed to the worker program.
    #[serde(default = "default_worker_args")]
    pub worker_args: Vec<String>,

    /// Accelerator query tool.
    #[serde(default = "default_nvidia_smi")]
    pub nvidia_smi: String,

    /// Timeout for the accelerator query.
    #[serde(default = "default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,

    /// Extra directories searched for accelerator runtime libraries.
    #[serde(default)]
    pub cuda_library_dirs: Vec<String>,

    /// Never use the accelerator.
    #[serde(default)]
    pub force_cpu: bool,
}

fn default_worker_program() -> String {
    "python3".to_string()
}

fn default_worker_args() -> Vec<String> {
    vec!["-m".to_string(), "openeduvoice_worker".to_string()]
}

fn default_nvidia_smi() -> String {
    "nvidia-smi".to_string()
}

fn default_probe_timeout_ms() -> u64 {
    5_000
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            worker_program: default_worker_program(),
            worker_args: default_worker_args(),
            nvidia_smi: default_nvidia_smi(),
            probe_timeout_ms: default_probe_timeout_ms(),
            cuda_library_dirs: Vec::new(),
            force_cpu: false,
        }
    }
}

/// Speech-to-text settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptionSettings {
    /// Model used when none is requested.
    #[serde(default = "default_speech_model")]
    pub default_model: String,

    /// Model substituted for unstable variants on the accelerator.
    #[serde(default = "default_speech_model")]
    pub stable_model: String,

    /// Variants that are unstable on the accelerator.
    #[serde(default = "default_unsafe_models")]
    pub unsafe_models: Vec<String>,

    /// Spoken language hint.
    #[serde(default = "default_speech_language")]
    pub language: String,

    #[serde(default = "default_speech_beam_size")]
    pub beam_size: u32,

    #[serde(default = "default_best_of")]
    pub best_of: u32,

    /// Sampling temperature ladder.
    #[serde(default = "default_temperatures")]
    pub temperatures: Vec<f64>,

    /// Skip non-speech regions.
    #[serde(default = "default_true")]
    pub vad_filter: bool,

    #[serde(default = "default_true")]
    pub condition_on_previous_text: bool,

    /// Extension of the audio files to transcribe.
    #[serde(default = "default_audio_extension")]
    pub audio_extension: String,
}

fn default_speech_model() -> String {
    "medium".to_string()
}

fn default_unsafe_models() -> Vec<String> {
    vec!["large".to_string(), "large-v2".to_string()]
}

fn default_speech_language() -> String {
    "de".to_string()
}

fn default_speech_beam_size() -> u32 {
    5
}

fn default_best_of() -> u32 {
    5
}

fn default_temperatures() -> Vec<f64> {
    vec![0.0, 0.2, 0.4, 0.6, 0.8]
}

fn default_audio_extension() -> String {
    "wav".to_string()
}

impl Default for TranscriptionSettings {
    fn default() -> Self {
        Self {
            default_model: default_speech_model(),
            stable_model: default_speech_model(),
            unsafe_models: default_unsafe_models(),
            language: default_speech_language(),
            beam_size: default_speech_beam_size(),
            best_of: default_best_of(),
            temperatures: default_temperatures(),
            vad_filter: true,
            condition_on_previous_text: true,
            audio_extension: default_audio_extension(),
        }
    }
}

/// Text translation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationSettings {
    /// Explicit model; empty means pick by accelerator memory.
    #[serde(default)]
    pub model: String,

    #[serde(default = "default_small_model")]
    pub small_model: String,

    #[serde(default = "default_large_model")]
    pub large_model: String,

    /// Accelerator memory required for the large model.
    #[serde(default = "default_large_model_min_gib")]
    pub large_model_min_gib: f64,

    /// Upper bound on chunk length in characters.
    #[serde(default = "default_max_chars")]
    pub max_chars: usize,

    #[serde(default = "default_source_language")]
    pub source_language: String,

    #[serde(default = "default_target_language")]
    pub target_language: String,

    #[serde(default = "default_translation_beam_size")]
    pub beam_size: u32,

    #[serde(default = "default_max_new_tokens")]
    pub max_new_tokens: u32,

    #[serde(default = "default_no_repeat_ngram_size")]
    pub no_repeat_ngram_size: u32,

    #[serde(default = "default_length_penalty")]
    pub length_penalty: f64,

    #[serde(default = "default_repetition_penalty")]
    pub repetition_penalty: f64,

    /// Input truncation in tokens.
    #[serde(default = "default_max_input_tokens")]
    pub max_input_tokens: u32,
}

fn default_small_model() -> String {
    "facebook/nllb-200-distilled-600M".to_string()
}

fn default_large_model() -> String {
    "facebook/nllb-200-3.3B".to_string()
}

fn default_large_model_min_gib() -> f64 {
    16.0
}

fn default_max_chars() -> usize {
    400
}

fn default_source_language() -> String {
    "de".to_string()
}

fn default_target_language() -> String {
    "en".to_string()
}

fn default_translation_beam_size() -> u32 {
    4
}

fn default_max_new_tokens() -> u32 {
    256
}

fn default_no_repeat_ngram_size() -> u32 {
    3
}

fn default_length_penalty() -> f64 {
    1.05
}

fn default_repetition_penalty() -> f64 {
    1.1
}

fn default_max_input_tokens() -> u32 {
    512
}

impl Default for TranslationSettings {
    fn default() -> Self {
        Self {
            model: String::new(),
            small_model: default_small_model(),
            large_model: default_large_model(),
            large_model_min_gib: default_large_model_min_gib(),
            max_chars: default_max_chars(),
            source_language: default_source_language(),
            target_language: default_target_language(),
            beam_size: default_translation_beam_size(),
            max_new_tokens: default_max_new_tokens(),
            no_repeat_ngram_size: default_no_repeat_ngram_size(),
            length_penalty: default_length_penalty(),
            repetition_penalty: default_repetition_penalty(),
            max_input_tokens: default_max_input_tokens(),
        }
    }
}

/// Speech synthesis settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechSettings {
    /// Default synthesis language.
    #[serde(default = "default_tts_language")]
    pub language: String,

    /// Tempo differences below this many seconds are left alone.
    #[serde(default = "default_deadband_sec")]
    pub deadband_sec: f64,

    /// Tempo differences below this ratio are left alone.
    #[serde(default = "default_deadband_ratio")]
    pub deadband_ratio: f64,

    /// Lower bound of the tempo factor.
    #[serde(default = "default_tempo_min")]
    pub tempo_min: f64,

    /// Upper bound of the tempo factor.
    #[serde(default = "default_tempo_max")]
    pub tempo_max: f64,

    /// Synthesis language -> voice model.
    #[serde(default = "default_voice_models")]
    pub models: BTreeMap<String, String>,
}

fn default_tts_language() -> String {
    "English".to_string()
}

fn default_deadband_sec() -> f64 {
    0.25
}

fn default_deadband_ratio() -> f64 {
    0.03
}

fn default_tempo_min() -> f64 {
    0.8
}

fn default_tempo_max() -> f64 {
    1.25
}

fn default_voice_models() -> BTreeMap<String, String> {
    let multilingual = "tts_models/multilingual/multi-dataset/xtts_v2".to_string();
    BTreeMap::from([
        ("English".to_string(), multilingual.clone()),
        ("German".to_string(), multilingual),
    ])
}

impl Default for SpeechSettings {
    fn default() -> Self {
        Self {
            language: default_tts_language(),
            deadband_sec: default_deadband_sec(),
            deadband_ratio: default_deadband_ratio(),
            tempo_min: default_tempo_min(),
            tempo_max: default_tempo_max(),
            models: default_voice_models(),
        }
    }
}

/// External tool settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSettings {
    #[serde(default = "default_ffmpeg")]
    pub ffmpeg: String,

    /// Sample rate of converted WAV files.
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
}

fn default_ffmpeg() -> String {
    "ffmpeg".to_string()
}

fn default_sample_rate() -> u32 {
    16_000
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            ffmpeg: default_ffmpeg(),
            sample_rate: default_sample_rate(),
        }
    }
}

/// Config sections for targeted updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSection {
    Paths,
    Logging,
    Backend,
    Transcription,
    Translation,
    Speech,
    Tools,
}

impl ConfigSection {
    /// Every section in file order.
    pub const ALL: [ConfigSection; 7] = [
        ConfigSection::Paths,
        ConfigSection::Logging,
        ConfigSection::Backend,
        ConfigSection::Transcription,
        ConfigSection::Translation,
        ConfigSection::Speech,
        ConfigSection::Tools,
    ];

    /// Get the TOML table name for this section.
    pub fn table_name(&self) -> &'static str {
        match self {
            ConfigSection::Paths => "paths",
            ConfigSection::Logging => "logging",
            ConfigSection::Backend => "backend",
            ConfigSection::Transcription => "transcription",
            ConfigSection::Translation => "translation",
            ConfigSection::Speech => "speech",
            ConfigSection::Tools => "tools",
        }
    }

    /// Comment written above the section.
    pub fn comment(&self) -> &'static str {
        match self {
            ConfigSection::Paths => "Working directories",
            ConfigSection::Logging => "Logging configuration",
            ConfigSection::Backend => "Compute backend and inference worker",
            ConfigSection::Transcription => "Speech-to-text",
            ConfigSection::Translation => "Text translation",
            ConfigSection::Speech => "Speech synthesis",
            ConfigSection::Tools => "External tools",
        }
    }
}
