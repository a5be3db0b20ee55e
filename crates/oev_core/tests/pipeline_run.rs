//! End-to-end run of the standard pipeline with in-process collaborators.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;

use oev_core::backend::{
    AcceleratorInfo, AdaptiveModelLoader, CapabilityProbe, DeviceKind, InferenceError,
    InitFailure, LoadRequest, ModelInitializer, ProcessEnvironment, RuntimeSupport,
};
use oev_core::batch::list_files_with_extension;
use oev_core::collaborators::{
    AudioConverter, CollaboratorResult, DeckExtractor, DeckReintegrator, SpeechSynthesizer,
    SynthesisRequest,
};
use oev_core::config::Settings;
use oev_core::logging::{LogConfig, LogSink, RunLogger};
use oev_core::orchestrator::{create_standard_pipeline, Orchestrator, StepServices};
use oev_core::transcription::{Segment, SpeechModel, TranscribeOptions};
use oev_core::translation::{DecodingOptions, TranslationModel};
use oev_core::workspace::{DeckJob, TranslationDirection};

struct HostOnly;

impl CapabilityProbe for HostOnly {
    fn probe(&self) -> AcceleratorInfo {
        AcceleratorInfo::none()
    }

    fn runtime_support(&self) -> RuntimeSupport {
        RuntimeSupport::default()
    }
}

struct FakeDeck;

impl DeckExtractor for FakeDeck {
    fn extract_audio(
        &self,
        _deck: &Path,
        media_dir: &Path,
        _log: &dyn LogSink,
    ) -> CollaboratorResult<Vec<PathBuf>> {
        fs::create_dir_all(media_dir)?;
        ["media1.m4a", "media2.m4a"]
            .iter()
            .map(|name| {
                let path = media_dir.join(name);
                fs::write(&path, b"audio")?;
                Ok(path)
            })
            .collect()
    }

    fn extract_slide_text(
        &self,
        _deck: &Path,
        out_dir: &Path,
        _log: &dyn LogSink,
    ) -> CollaboratorResult<Vec<PathBuf>> {
        fs::create_dir_all(out_dir)?;
        let path = out_dir.join("slide_1.txt");
        fs::write(&path, "Willkommen zur Vorlesung.")?;
        Ok(vec![path])
    }
}

struct FakeConverter;

impl AudioConverter for FakeConverter {
    fn convert_to_wav(
        &self,
        input_dir: &Path,
        output_dir: &Path,
        _log: &dyn LogSink,
    ) -> CollaboratorResult<Vec<PathBuf>> {
        fs::create_dir_all(output_dir)?;
        let mut written = Vec::new();
        for input in list_files_with_extension(input_dir, "m4a")? {
            let output = output_dir.join(input.with_extension("wav").file_name().unwrap());
            fs::write(&output, b"wav")?;
            written.push(output);
        }
        Ok(written)
    }
}

#[derive(Default)]
struct FakeSynthesizer {
    requests: Mutex<Vec<SynthesisRequest>>,
}

impl SpeechSynthesizer for FakeSynthesizer {
    fn synthesize(
        &self,
        request: &SynthesisRequest,
        _log: &dyn LogSink,
    ) -> CollaboratorResult<Vec<PathBuf>> {
        self.requests.lock().push(request.clone());
        fs::create_dir_all(&request.output_dir)?;
        let mut written = Vec::new();
        for text in list_files_with_extension(&request.text_dir, "txt")? {
            let output = request
                .output_dir
                .join(text.with_extension("wav").file_name().unwrap());
            fs::write(&output, b"speech")?;
            written.push(output);
        }
        Ok(written)
    }
}

struct FakeReintegrator;

impl DeckReintegrator for FakeReintegrator {
    fn reintegrate(
        &self,
        _deck: &Path,
        _text_dir: &Path,
        _audio_dir: &Path,
        output: &Path,
        _log: &dyn LogSink,
    ) -> CollaboratorResult<PathBuf> {
        fs::write(output, b"deck")?;
        Ok(output.to_path_buf())
    }
}

struct FixedSpeech;

impl SpeechModel for FixedSpeech {
    fn transcribe(
        &mut self,
        _audio: &Path,
        _options: &TranscribeOptions,
    ) -> Result<Vec<Segment>, InferenceError> {
        Ok(vec![Segment::new("Guten Morgen."), Segment::new("Heute Physik.")])
    }
}

struct SpeechModels;

impl ModelInitializer for SpeechModels {
    type Handle = Box<dyn SpeechModel>;

    fn initialize(&self, request: &LoadRequest<'_>) -> Result<Self::Handle, InitFailure> {
        assert_eq!(request.profile.device, DeviceKind::HostCpu);
        Ok(Box::new(FixedSpeech))
    }
}

struct UpperCase;

impl TranslationModel for UpperCase {
    fn translate_chunk(
        &mut self,
        text: &str,
        _options: &DecodingOptions,
    ) -> Result<String, InferenceError> {
        Ok(text.to_uppercase())
    }
}

struct TranslationModels;

impl ModelInitializer for TranslationModels {
    type Handle = Box<dyn TranslationModel>;

    fn initialize(&self, request: &LoadRequest<'_>) -> Result<Self::Handle, InitFailure> {
        match request.languages {
            Some(_) => Ok(Box::new(UpperCase)),
            None => Err(InitFailure::new("missing languages")),
        }
    }
}

fn services(synthesizer: Arc<FakeSynthesizer>) -> Arc<StepServices> {
    Arc::new(StepServices {
        deck: Arc::new(FakeDeck),
        converter: Arc::new(FakeConverter),
        synthesizer,
        reintegrator: Arc::new(FakeReintegrator),
        loader: AdaptiveModelLoader::new(Arc::new(HostOnly), Arc::new(ProcessEnvironment::new())),
        speech_models: Arc::new(SpeechModels),
        translation_models: Arc::new(TranslationModels),
    })
}

fn collecting_logger(lines: &Arc<Mutex<Vec<String>>>, summary: &Arc<Mutex<Vec<String>>>) -> RunLogger {
    let log_lines = Arc::clone(lines);
    let summary_lines = Arc::clone(summary);
    RunLogger::new(
        "lecture",
        None,
        LogConfig {
            show_timestamps: false,
            ..LogConfig::default()
        },
        Some(Box::new(move |line: &str| log_lines.lock().push(line.to_string()))),
        Some(Box::new(move |line: &str| summary_lines.lock().push(line.to_string()))),
    )
}

#[tokio::test]
async fn full_run_produces_combined_deck() {
    let dir = tempfile::tempdir().unwrap();
    let deck = dir.path().join("lecture.pptx");
    fs::write(&deck, b"pptx").unwrap();

    let synthesizer = Arc::new(FakeSynthesizer::default());
    let pipeline = create_standard_pipeline(services(Arc::clone(&synthesizer)));
    let steps = pipeline.steps();

    let lines = Arc::new(Mutex::new(Vec::new()));
    let summary = Arc::new(Mutex::new(Vec::new()));
    let progress = Arc::new(Mutex::new(Vec::new()));
    let ticks = Arc::clone(&progress);

    let job = DeckJob::new(&deck, TranslationDirection::GermanToEnglish, "English");
    let orchestrator = Orchestrator::new(
        collecting_logger(&lines, &summary),
        Arc::new(Settings::default()),
        Arc::new(job.clone()),
    )
    .with_progress_callback(Box::new(move |_, pct, _| ticks.lock().push(pct)));

    let report = orchestrator.run(&steps, true).await.unwrap();

    assert_eq!(report.completed.len(), 7, "failed: {:?}", report.failed);
    assert!(report.failed.is_empty());

    let workspace = &job.workspace;
    let transcript = fs::read_to_string(workspace.transcripts_dir().join("media1.txt")).unwrap();
    assert_eq!(transcript, "Guten Morgen. Heute Physik.");
    let translated =
        fs::read_to_string(workspace.translated_transcripts_dir().join("media1.txt")).unwrap();
    assert_eq!(translated, "GUTEN MORGEN. HEUTE PHYSIK.");
    assert!(workspace
        .translated_slide_text_dir()
        .join("slide_1.txt")
        .is_file());
    assert!(workspace.combined_output().is_file());
    assert_eq!(
        workspace.combined_output().file_name().unwrap(),
        "lecture_final_combined.pptx"
    );

    let requests = synthesizer.requests.lock();
    assert_eq!(requests[0].reference_audio_dir, Some(workspace.media_dir()));
    assert_eq!(requests[0].tts_language, "English");

    let summary = summary.lock().clone();
    assert!(summary.contains(&format!(
        "Translated 2 transcript files to: {}",
        workspace.translated_transcripts_dir().display()
    )));
    assert!(summary.contains(&format!(
        "Generated 2 TTS audio files to: {}",
        workspace.tts_audio_dir().display()
    )));
    assert!(summary.iter().any(|l| l.starts_with("Combined reintegrated PPTX saved to:")));
    assert_eq!(
        summary.last().map(String::as_str),
        Some("[DONE] All selected steps completed.")
    );

    let progress = progress.lock().clone();
    assert_eq!(progress.first(), Some(&0));
    assert_eq!(progress.last(), Some(&100));
    assert_eq!(progress.iter().filter(|&&p| p == 100).count(), 1);
    assert!(progress.windows(2).all(|w| w[0] <= w[1]));
}

#[tokio::test]
async fn missing_deck_fails_deck_steps_only() {
    let dir = tempfile::tempdir().unwrap();
    let deck = dir.path().join("missing.pptx");

    let pipeline = create_standard_pipeline(services(Arc::new(FakeSynthesizer::default())));
    let steps = pipeline
        .select(&["Extract Slide Text (.txt)", "Translate Slide Text (.txt)"])
        .unwrap();

    let lines = Arc::new(Mutex::new(Vec::new()));
    let summary = Arc::new(Mutex::new(Vec::new()));
    let orchestrator = Orchestrator::new(
        collecting_logger(&lines, &summary),
        Arc::new(Settings::default()),
        Arc::new(DeckJob::new(&deck, TranslationDirection::default(), "English")),
    );

    let report = orchestrator.run(&steps, true).await.unwrap();

    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, "Extract Slide Text (.txt)");
    assert_eq!(report.skipped, vec!["Translate Slide Text (.txt)"]);
    assert!(lines
        .lock()
        .iter()
        .any(|l| l.starts_with("[ERROR] Extract Slide Text (.txt): Required file not found")));
}

#[tokio::test]
async fn tts_without_reference_audio_logs_info() {
    let dir = tempfile::tempdir().unwrap();
    let deck = dir.path().join("talk.pptx");
    fs::write(&deck, b"pptx").unwrap();

    let synthesizer = Arc::new(FakeSynthesizer::default());
    let pipeline = create_standard_pipeline(services(Arc::clone(&synthesizer)));
    let steps = pipeline.select(&["Generate TTS Audio"]).unwrap();

    let lines = Arc::new(Mutex::new(Vec::new()));
    let summary = Arc::new(Mutex::new(Vec::new()));
    let orchestrator = Orchestrator::new(
        collecting_logger(&lines, &summary),
        Arc::new(Settings::default()),
        Arc::new(DeckJob::new(&deck, TranslationDirection::EnglishToGerman, "German")),
    );

    let report = orchestrator.run(&steps, true).await.unwrap();

    assert_eq!(report.completed, vec!["Generate TTS Audio"]);
    assert!(lines.lock().contains(
        &"[INFO] No original audio folder found (media/, converted_wav/, original_audio/, audio/). Tempo alignment will be skipped."
            .to_string()
    ));
    let requests = synthesizer.requests.lock();
    assert_eq!(requests[0].reference_audio_dir, None);
    assert_eq!(requests[0].source_language, "en");
    assert_eq!(requests[0].target_language, "de");
}
