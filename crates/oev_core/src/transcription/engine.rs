//! Batch speech-to-text over a directory of audio files.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::backend::{AdaptiveModelLoader, InferenceError, LoadPolicy, ModelInitializer};
use crate::batch::{file_name, list_files_with_extension, output_path_for, FileError};
use crate::config::TranscriptionSettings;
use crate::logging::LogSink;

/// Decoding options passed to the speech model for every file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TranscribeOptions {
    pub language: String,
    pub beam_size: u32,
    pub best_of: u32,
    pub temperatures: Vec<f64>,
    pub vad_filter: bool,
    pub condition_on_previous_text: bool,
}

impl TranscribeOptions {
    pub fn from_settings(settings: &TranscriptionSettings) -> Self {
        Self {
            language: settings.language.clone(),
            beam_size: settings.beam_size,
            best_of: settings.best_of,
            temperatures: settings.temperatures.clone(),
            vad_filter: settings.vad_filter,
            condition_on_previous_text: settings.condition_on_previous_text,
        }
    }
}

impl Default for TranscribeOptions {
    fn default() -> Self {
        Self::from_settings(&TranscriptionSettings::default())
    }
}

/// One recognized span of speech.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Segment {
    #[serde(default)]
    pub text: String,
}

impl Segment {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// A loaded speech-to-text model.
pub trait SpeechModel: Send {
    fn transcribe(
        &mut self,
        audio: &Path,
        options: &TranscribeOptions,
    ) -> Result<Vec<Segment>, InferenceError>;
}

impl<T: SpeechModel + ?Sized> SpeechModel for Box<T> {
    fn transcribe(
        &mut self,
        audio: &Path,
        options: &TranscribeOptions,
    ) -> Result<Vec<Segment>, InferenceError> {
        (**self).transcribe(audio, options)
    }
}

/// Join segment texts with single spaces and trim the result.
pub fn join_segments(segments: &[Segment]) -> String {
    segments
        .iter()
        .map(|s| s.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
        .trim()
        .to_string()
}

/// Loads a speech model on demand and transcribes whole directories.
pub struct TranscriptionEngine<'a, I: ?Sized> {
    loader: &'a AdaptiveModelLoader,
    initializer: &'a I,
    policy: LoadPolicy,
    options: TranscribeOptions,
    extension: String,
}

impl<'a, I> TranscriptionEngine<'a, I>
where
    I: ModelInitializer + ?Sized,
    I::Handle: SpeechModel,
{
    pub fn new(
        loader: &'a AdaptiveModelLoader,
        initializer: &'a I,
        policy: LoadPolicy,
        settings: &TranscriptionSettings,
    ) -> Self {
        Self {
            loader,
            initializer,
            policy,
            options: TranscribeOptions::from_settings(settings),
            extension: settings.audio_extension.clone(),
        }
    }

    /// Transcribe every audio file in `input_dir` into `output_dir`.
    ///
    /// Never fails: a model that cannot be loaded or an unreadable directory
    /// is logged and yields an empty list, and per-file failures are logged
    /// and skipped.
    pub fn transcribe_all(
        &self,
        input_dir: &Path,
        output_dir: &Path,
        model: Option<&str>,
        log: &dyn LogSink,
    ) -> Vec<PathBuf> {
        let audio_files = match list_files_with_extension(input_dir, &self.extension) {
            Ok(files) => files,
            Err(e) => {
                log.error(&format!("Cannot read {}: {}", input_dir.display(), e));
                return Vec::new();
            }
        };
        if audio_files.is_empty() {
            log.info(&format!(
                "No .{} files found in: {}",
                self.extension,
                input_dir.display()
            ));
            return Vec::new();
        }

        if let Err(e) = fs::create_dir_all(output_dir) {
            log.error(&format!("Cannot create {}: {}", output_dir.display(), e));
            return Vec::new();
        }

        let requested = model.or(Some(self.policy.default_model.as_str()));
        let mut loaded = match self
            .loader
            .load(self.initializer, &self.policy, requested, None, log)
        {
            Ok(loaded) => loaded,
            Err(e) => {
                log.error(&format!(
                    "Could not load Whisper model '{}': {}",
                    requested.unwrap_or_default(),
                    e
                ));
                return Vec::new();
            }
        };

        let mut written = Vec::with_capacity(audio_files.len());
        for audio in &audio_files {
            match self.transcribe_one(&mut loaded.handle, audio, output_dir) {
                Ok((path, chars)) => {
                    log.info(&format!(
                        "Transcribed: {} -> {} ({} chars)",
                        file_name(audio),
                        file_name(&path),
                        chars
                    ));
                    written.push(path);
                }
                Err(e) => log.error(&e.to_string()),
            }
        }

        log.info(&format!(
            "{} of {} files transcribed",
            written.len(),
            audio_files.len()
        ));
        written
    }

    fn transcribe_one(
        &self,
        model: &mut I::Handle,
        audio: &Path,
        output_dir: &Path,
    ) -> Result<(PathBuf, usize), FileError> {
        let segments = model
            .transcribe(audio, &self.options)
            .map_err(|e| FileError::new("transcribe", audio, e))?;
        let transcript = join_segments(&segments);

        let out_path = output_path_for(audio, output_dir, "txt");
        fs::write(&out_path, &transcript).map_err(|e| FileError::new("transcribe", audio, e))?;
        Ok((out_path, transcript.chars().count()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{
        AcceleratorInfo, CapabilityProbe, InitFailure, LoadRequest, ProcessEnvironment,
        RuntimeSupport,
    };
    use crate::config::BackendSettings;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tempfile::tempdir;

    struct CpuOnly;

    impl CapabilityProbe for CpuOnly {
        fn probe(&self) -> AcceleratorInfo {
            AcceleratorInfo::none()
        }

        fn runtime_support(&self) -> RuntimeSupport {
            RuntimeSupport::default()
        }
    }

    /// Returns the file stem as two segments; fails on stems containing "bad".
    struct StemModel;

    impl SpeechModel for StemModel {
        fn transcribe(
            &mut self,
            audio: &Path,
            options: &TranscribeOptions,
        ) -> Result<Vec<Segment>, InferenceError> {
            assert_eq!(options.language, "de");
            let stem = audio.file_stem().unwrap().to_string_lossy().into_owned();
            if stem.contains("bad") {
                return Err(InferenceError::new("corrupt header"));
            }
            Ok(vec![Segment::new(format!(" {} ", stem)), Segment::new("ende ")])
        }
    }

    struct StemInitializer {
        loads: AtomicUsize,
        fail: bool,
    }

    impl StemInitializer {
        fn new(fail: bool) -> Self {
            Self {
                loads: AtomicUsize::new(0),
                fail,
            }
        }
    }

    impl ModelInitializer for StemInitializer {
        type Handle = StemModel;

        fn initialize(&self, _request: &LoadRequest<'_>) -> Result<StemModel, InitFailure> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(InitFailure::new("weights missing"))
            } else {
                Ok(StemModel)
            }
        }
    }

    #[derive(Default)]
    struct Lines(Mutex<Vec<String>>);

    impl LogSink for Lines {
        fn log(&self, line: &str) {
            self.0.lock().push(line.to_string());
        }
    }

    fn loader() -> AdaptiveModelLoader {
        AdaptiveModelLoader::new(Arc::new(CpuOnly), Arc::new(ProcessEnvironment::new()))
    }

    fn policy() -> LoadPolicy {
        LoadPolicy::speech(&TranscriptionSettings::default(), &BackendSettings::default())
    }

    #[test]
    fn one_failing_file_of_three() {
        let input = tempdir().unwrap();
        let output = tempdir().unwrap();
        for name in ["a.wav", "b_bad.wav", "c.wav"] {
            fs::write(input.path().join(name), b"RIFF").unwrap();
        }

        let loader = loader();
        let init = StemInitializer::new(false);
        let engine =
            TranscriptionEngine::new(&loader, &init, policy(), &TranscriptionSettings::default());
        let log = Lines::default();

        let written = engine.transcribe_all(input.path(), output.path(), None, &log);

        assert_eq!(written.len(), 2);
        assert_eq!(
            fs::read_to_string(output.path().join("a.txt")).unwrap(),
            "a  ende"
        );
        let lines = log.0.lock();
        let errors: Vec<&String> = lines.iter().filter(|l| l.starts_with("[ERROR]")).collect();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("b_bad.wav"));
        assert!(lines.iter().any(|l| l == "[INFO] 2 of 3 files transcribed"));
    }

    #[test]
    fn no_audio_files_logs_info_and_skips_loading() {
        let input = tempdir().unwrap();
        let output = tempdir().unwrap();
        let loader = loader();
        let init = StemInitializer::new(false);
        let engine =
            TranscriptionEngine::new(&loader, &init, policy(), &TranscriptionSettings::default());
        let log = Lines::default();

        let written = engine.transcribe_all(input.path(), output.path(), None, &log);

        assert!(written.is_empty());
        assert_eq!(init.loads.load(Ordering::SeqCst), 0);
        assert!(log.0.lock()[0].starts_with("[INFO] No .wav files found in:"));
    }

    #[test]
    fn load_failure_returns_empty() {
        let input = tempdir().unwrap();
        let output = tempdir().unwrap();
        fs::write(input.path().join("a.wav"), b"RIFF").unwrap();

        let loader = loader();
        let init = StemInitializer::new(true);
        let engine =
            TranscriptionEngine::new(&loader, &init, policy(), &TranscriptionSettings::default());
        let log = Lines::default();

        let written = engine.transcribe_all(input.path(), output.path(), Some("small"), &log);

        assert!(written.is_empty());
        // int8 then float32 on the CPU
        assert_eq!(init.loads.load(Ordering::SeqCst), 2);
        let lines = log.0.lock();
        assert!(lines
            .last()
            .unwrap()
            .starts_with("[ERROR] Could not load Whisper model 'small'"));
    }

    #[test]
    fn joins_segments_with_single_spaces() {
        let segments = vec![Segment::new(" Hallo"), Segment::new("Welt "), Segment::new("")];
        assert_eq!(join_segments(&segments), "Hallo Welt");
    }
}
