//! Directory layout for one slide deck.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Which way text is translated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TranslationDirection {
    #[default]
    GermanToEnglish,
    EnglishToGerman,
}

impl TranslationDirection {
    /// `(source, target)` short language codes.
    pub fn languages(&self) -> (&'static str, &'static str) {
        match self {
            TranslationDirection::GermanToEnglish => ("de", "en"),
            TranslationDirection::EnglishToGerman => ("en", "de"),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TranslationDirection::GermanToEnglish => "German to English",
            TranslationDirection::EnglishToGerman => "English to German",
        }
    }
}

impl fmt::Display for TranslationDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for TranslationDirection {
    type Err = String;

    /// Accepts the labels as well as `de-en` / `en-de`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "german to english" | "de-en" | "de->en" => Ok(Self::GermanToEnglish),
            "english to german" | "en-de" | "en->de" => Ok(Self::EnglishToGerman),
            _ => Err(format!("unknown translation direction '{}'", s)),
        }
    }
}

/// Working folders for one deck: `<stem>_transcript/` beside the deck.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeckWorkspace {
    deck: PathBuf,
    base: PathBuf,
}

impl DeckWorkspace {
    pub const MEDIA: &'static str = "media";
    pub const CONVERTED_WAV: &'static str = "converted_wav";
    pub const SLIDE_TEXT: &'static str = "slide_text_txt";
    pub const TRANSCRIPTS: &'static str = "transcripts";
    pub const TRANSLATED_TRANSCRIPTS: &'static str = "translated_text";
    pub const TRANSLATED_SLIDE_TEXT: &'static str = "translated_text_txt";
    pub const TTS_AUDIO: &'static str = "tts_audio";

    /// Folders searched, in order, for original audio to align speech with.
    pub const REFERENCE_AUDIO_CANDIDATES: [&'static str; 4] =
        ["media", "converted_wav", "original_audio", "audio"];

    pub fn for_deck(deck: impl Into<PathBuf>) -> Self {
        let deck = deck.into();
        let base = deck.with_file_name(format!("{}_transcript", deck_stem(&deck)));
        Self { deck, base }
    }

    pub fn deck(&self) -> &Path {
        &self.deck
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    /// `<base>/<name>`.
    pub fn subdir(&self, name: &str) -> PathBuf {
        self.base.join(name)
    }

    pub fn media_dir(&self) -> PathBuf {
        self.subdir(Self::MEDIA)
    }

    pub fn converted_wav_dir(&self) -> PathBuf {
        self.subdir(Self::CONVERTED_WAV)
    }

    pub fn slide_text_dir(&self) -> PathBuf {
        self.subdir(Self::SLIDE_TEXT)
    }

    pub fn transcripts_dir(&self) -> PathBuf {
        self.subdir(Self::TRANSCRIPTS)
    }

    pub fn translated_transcripts_dir(&self) -> PathBuf {
        self.subdir(Self::TRANSLATED_TRANSCRIPTS)
    }

    pub fn translated_slide_text_dir(&self) -> PathBuf {
        self.subdir(Self::TRANSLATED_SLIDE_TEXT)
    }

    pub fn tts_audio_dir(&self) -> PathBuf {
        self.subdir(Self::TTS_AUDIO)
    }

    /// `<stem>_final_combined.pptx` beside the deck.
    pub fn combined_output(&self) -> PathBuf {
        self.deck
            .with_file_name(format!("{}_final_combined.pptx", deck_stem(&self.deck)))
    }

    /// First existing reference audio folder.
    pub fn reference_audio_dir(&self) -> Option<PathBuf> {
        Self::REFERENCE_AUDIO_CANDIDATES
            .iter()
            .map(|name| self.subdir(name))
            .find(|dir| dir.is_dir())
    }
}

fn deck_stem(deck: &Path) -> String {
    deck.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "deck".to_string())
}

/// The deck and choices a run operates on.
#[derive(Debug, Clone)]
pub struct DeckJob {
    pub workspace: DeckWorkspace,
    /// Short or model code of the text being translated.
    pub source_language: String,
    pub target_language: String,
    /// Speech synthesis language (key of the voice model map).
    pub tts_language: String,
}

impl DeckJob {
    pub fn new(
        deck: impl Into<PathBuf>,
        direction: TranslationDirection,
        tts_language: impl Into<String>,
    ) -> Self {
        let (source, target) = direction.languages();
        Self::with_languages(deck, source, target, tts_language)
    }

    pub fn with_languages(
        deck: impl Into<PathBuf>,
        source_language: impl Into<String>,
        target_language: impl Into<String>,
        tts_language: impl Into<String>,
    ) -> Self {
        Self {
            workspace: DeckWorkspace::for_deck(deck),
            source_language: source_language.into(),
            target_language: target_language.into(),
            tts_language: tts_language.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn layout_beside_deck() {
        let ws = DeckWorkspace::for_deck("/decks/Vorlesung 3.pptx");
        assert_eq!(ws.base(), Path::new("/decks/Vorlesung 3_transcript"));
        assert_eq!(
            ws.transcripts_dir(),
            PathBuf::from("/decks/Vorlesung 3_transcript/transcripts")
        );
        assert_eq!(
            ws.combined_output(),
            PathBuf::from("/decks/Vorlesung 3_final_combined.pptx")
        );
    }

    #[test]
    fn direction_languages() {
        assert_eq!(TranslationDirection::GermanToEnglish.languages(), ("de", "en"));
        assert_eq!(TranslationDirection::EnglishToGerman.languages(), ("en", "de"));
        assert_eq!(
            "German to English".parse::<TranslationDirection>().unwrap(),
            TranslationDirection::GermanToEnglish
        );
        assert_eq!(
            "en-de".parse::<TranslationDirection>().unwrap(),
            TranslationDirection::EnglishToGerman
        );
        assert!("fr-de".parse::<TranslationDirection>().is_err());

        let job = DeckJob::new("/d/x.pptx", TranslationDirection::EnglishToGerman, "German");
        assert_eq!(job.source_language, "en");
        assert_eq!(job.target_language, "de");
    }

    #[test]
    fn reference_audio_prefers_earlier_candidates() {
        let dir = tempdir().unwrap();
        let ws = DeckWorkspace::for_deck(dir.path().join("talk.pptx"));
        assert!(ws.reference_audio_dir().is_none());

        fs::create_dir_all(ws.subdir("audio")).unwrap();
        assert_eq!(ws.reference_audio_dir(), Some(ws.subdir("audio")));

        fs::create_dir_all(ws.converted_wav_dir()).unwrap();
        assert_eq!(ws.reference_audio_dir(), Some(ws.converted_wav_dir()));
    }
}
