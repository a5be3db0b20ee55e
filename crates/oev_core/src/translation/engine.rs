//! Chunked translation over a loaded model.

use serde::Serialize;
use thiserror::Error;

use super::languages::LanguagePair;
use super::segment::segment;
use crate::backend::{
    AdaptiveModelLoader, InferenceError, InitializationError, LoadPolicy, LoadedModel,
    ModelInitializer,
};
use crate::config::TranslationSettings;
use crate::logging::LogSink;

/// Errors from the translation engine.
#[derive(Error, Debug)]
pub enum TranslationError {
    /// Language pair or model cannot be resolved.
    #[error("Translation configuration error: {0}")]
    Config(String),

    /// The model failed on one chunk; earlier chunks are discarded.
    #[error("Translation failed at chunk {ordinal}: {source}")]
    Chunk {
        ordinal: usize,
        #[source]
        source: InferenceError,
    },

    #[error(transparent)]
    Initialization(#[from] InitializationError),
}

impl TranslationError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}

/// Decoding parameters sent with every chunk.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecodingOptions {
    pub beam_size: u32,
    pub max_new_tokens: u32,
    pub no_repeat_ngram_size: u32,
    pub length_penalty: f64,
    pub repetition_penalty: f64,
    pub max_input_tokens: u32,
}

impl DecodingOptions {
    pub fn from_settings(settings: &TranslationSettings) -> Self {
        Self {
            beam_size: settings.beam_size,
            max_new_tokens: settings.max_new_tokens,
            no_repeat_ngram_size: settings.no_repeat_ngram_size,
            length_penalty: settings.length_penalty,
            repetition_penalty: settings.repetition_penalty,
            max_input_tokens: settings.max_input_tokens,
        }
    }
}

impl Default for DecodingOptions {
    fn default() -> Self {
        Self::from_settings(&TranslationSettings::default())
    }
}

/// A loaded text-to-text model.
pub trait TranslationModel: Send {
    /// Translate one chunk. Calls are independent of each other.
    fn translate_chunk(
        &mut self,
        text: &str,
        options: &DecodingOptions,
    ) -> Result<String, InferenceError>;

    /// Free transient accelerator memory held after a call.
    fn release_cache(&mut self) {}
}

impl<T: TranslationModel + ?Sized> TranslationModel for Box<T> {
    fn translate_chunk(
        &mut self,
        text: &str,
        options: &DecodingOptions,
    ) -> Result<String, InferenceError> {
        (**self).translate_chunk(text, options)
    }

    fn release_cache(&mut self) {
        (**self).release_cache()
    }
}

/// Splits text into sentence-bounded chunks and translates them in order.
pub struct ChunkedTranslator<M> {
    model: M,
    options: DecodingOptions,
}

impl<M: TranslationModel> ChunkedTranslator<M> {
    pub fn new(model: M, options: DecodingOptions) -> Self {
        Self { model, options }
    }

    /// Translate `text`, keeping every chunk within `max_chars` where the
    /// sentences allow it. Chunk outputs are joined with newlines.
    pub fn translate(
        &mut self,
        text: &str,
        max_chars: usize,
        log: &dyn LogSink,
    ) -> Result<String, TranslationError> {
        let chunks = segment(text, max_chars);
        if chunks.is_empty() {
            return Ok(String::new());
        }

        let total = chunks.len();
        let mut outputs = Vec::with_capacity(total);
        for chunk in &chunks {
            log.info(&format!("Translating chunk {}/{}", chunk.ordinal + 1, total));
            let result = self.model.translate_chunk(&chunk.content, &self.options);
            self.model.release_cache();
            let translated = result.map_err(|source| TranslationError::Chunk {
                ordinal: chunk.ordinal,
                source,
            })?;
            outputs.push(translated.trim().to_string());
        }

        Ok(outputs.join("\n"))
    }
}

impl<H: TranslationModel> ChunkedTranslator<H> {
    /// Resolve languages, then load a model through the fallback cascade.
    pub fn load<I>(
        loader: &AdaptiveModelLoader,
        initializer: &I,
        settings: &TranslationSettings,
        policy: &LoadPolicy,
        source: &str,
        target: &str,
        log: &dyn LogSink,
    ) -> Result<(Self, LanguagePair), TranslationError>
    where
        I: ModelInitializer<Handle = H> + ?Sized,
    {
        let languages = LanguagePair::resolve(source, target)?;
        let requested = Some(settings.model.as_str()).filter(|m| !m.trim().is_empty());

        let LoadedModel {
            handle,
            model,
            profile,
        } = loader.load(initializer, policy, requested, Some(&languages), log)?;
        log.info(&format!(
            "NLLB model selected: {} (device={}, {})",
            model, profile.device, languages
        ));

        Ok((
            Self::new(handle, DecodingOptions::from_settings(settings)),
            languages,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::NullSink;
    use parking_lot::Mutex;
    use std::sync::Arc;

    /// Upper-cases input and records calls.
    #[derive(Default)]
    struct EchoModel {
        calls: Arc<Mutex<Vec<String>>>,
        releases: Arc<Mutex<usize>>,
        fail_on: Option<usize>,
    }

    impl TranslationModel for EchoModel {
        fn translate_chunk(
            &mut self,
            text: &str,
            _options: &DecodingOptions,
        ) -> Result<String, InferenceError> {
            let mut calls = self.calls.lock();
            if self.fail_on == Some(calls.len()) {
                return Err(InferenceError::new("out of memory"));
            }
            calls.push(text.to_string());
            Ok(text.to_uppercase())
        }

        fn release_cache(&mut self) {
            *self.releases.lock() += 1;
        }
    }

    #[test]
    fn empty_input_never_calls_model() {
        let model = EchoModel::default();
        let calls = model.calls.clone();
        let mut translator = ChunkedTranslator::new(model, DecodingOptions::default());

        assert_eq!(translator.translate("", 400, &NullSink).unwrap(), "");
        assert_eq!(translator.translate("  \n ", 400, &NullSink).unwrap(), "");
        assert!(calls.lock().is_empty());
    }

    #[test]
    fn chunks_are_translated_in_order_and_joined_by_newline() {
        let sentences: Vec<String> = ('a'..='e')
            .map(|c| {
                let mut s: String = std::iter::repeat(c).take(179).collect();
                s.push('.');
                s
            })
            .collect();
        let text = sentences.join(" ");

        let model = EchoModel::default();
        let calls = model.calls.clone();
        let releases = model.releases.clone();
        let mut translator = ChunkedTranslator::new(model, DecodingOptions::default());

        let output = translator.translate(&text, 400, &NullSink).unwrap();
        let lines: Vec<&str> = output.split('\n').collect();

        assert_eq!(calls.lock().len(), 3);
        assert_eq!(*releases.lock(), 3);
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with('A'));
        assert!(lines[1].starts_with('C'));
        assert!(lines[2].starts_with('E'));
        assert!(calls.lock().iter().all(|c| c.chars().count() <= 400));
    }

    #[test]
    fn failing_chunk_reports_its_ordinal() {
        let model = EchoModel {
            fail_on: Some(1),
            ..EchoModel::default()
        };
        let releases = model.releases.clone();
        let mut translator = ChunkedTranslator::new(model, DecodingOptions::default());

        let err = translator
            .translate("Eins. Zwei. Drei.", 6, &NullSink)
            .unwrap_err();
        assert!(matches!(err, TranslationError::Chunk { ordinal: 1, .. }));
        // Cache is released even after the failing call
        assert_eq!(*releases.lock(), 2);
    }

    #[test]
    fn boxed_models_delegate() {
        let model = EchoModel::default();
        let calls = model.calls.clone();
        let boxed: Box<dyn TranslationModel> = Box::new(model);
        let mut translator = ChunkedTranslator::new(boxed, DecodingOptions::default());

        assert_eq!(translator.translate("Hallo.", 400, &NullSink).unwrap(), "HALLO.");
        assert_eq!(calls.lock().len(), 1);
    }
}
