//! Language code resolution for the translation model.

use std::fmt;

use serde::Serialize;

use super::engine::TranslationError;

/// Short codes accepted on the command line and in config.
const SHORT_CODES: &[(&str, &str)] = &[
    ("de", "deu_Latn"),
    ("en", "eng_Latn"),
    ("fr", "fra_Latn"),
    ("es", "spa_Latn"),
    ("it", "ita_Latn"),
    ("nl", "nld_Latn"),
    ("pl", "pol_Latn"),
    ("pt", "por_Latn"),
];

/// Source and target languages as model codes (`deu_Latn`, `eng_Latn`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LanguagePair {
    pub source: String,
    pub target: String,
}

impl LanguagePair {
    /// Resolve short codes or pass model codes through.
    pub fn resolve(source: &str, target: &str) -> Result<Self, TranslationError> {
        let source = resolve_code(source)?;
        let target = resolve_code(target)?;
        if source == target {
            return Err(TranslationError::config(format!(
                "source and target language are both {}",
                source
            )));
        }
        Ok(Self { source, target })
    }
}

impl fmt::Display for LanguagePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.source, self.target)
    }
}

fn resolve_code(code: &str) -> Result<String, TranslationError> {
    let code = code.trim();
    let lower = code.to_ascii_lowercase();
    if let Some((_, full)) = SHORT_CODES.iter().find(|(short, _)| *short == lower) {
        return Ok((*full).to_string());
    }
    if is_model_code(code) {
        return Ok(code.to_string());
    }
    Err(TranslationError::config(format!(
        "unsupported language '{}'",
        code
    )))
}

/// `xxx_Xxxx`: ISO 639-3 language plus ISO 15924 script.
fn is_model_code(code: &str) -> bool {
    let Some((lang, script)) = code.split_once('_') else {
        return false;
    };
    let mut script_chars = script.chars();
    lang.len() == 3
        && lang.chars().all(|c| c.is_ascii_lowercase())
        && script.len() == 4
        && script_chars.next().is_some_and(|c| c.is_ascii_uppercase())
        && script_chars.all(|c| c.is_ascii_lowercase())
}
