//! Slide deck (`.pptx`) reader.
//!
//! A deck is a ZIP container. Embedded media sits under `ppt/media/` and
//! each slide is `ppt/slides/slide<N>.xml` with DrawingML text runs.

use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use zip::ZipArchive;

use super::{CollaboratorError, CollaboratorResult, DeckExtractor};
use crate::logging::LogSink;

const DRAWING_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";

/// Extensions treated as audio when found in the media folder.
const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "m4a", "wma", "aac", "ogg", "flac"];

/// Deck extractor that reads the container directly.
#[derive(Debug, Default, Clone)]
pub struct PptxDeck;

impl PptxDeck {
    pub fn new() -> Self {
        Self
    }
}

fn open_archive(deck: &Path) -> CollaboratorResult<ZipArchive<File>> {
    if !deck.is_file() {
        return Err(CollaboratorError::NotFound(deck.to_path_buf()));
    }
    Ok(ZipArchive::new(File::open(deck)?)?)
}

fn is_audio_entry(name: &str) -> bool {
    let Some(file) = name.strip_prefix("ppt/media/") else {
        return false;
    };
    if file.is_empty() || file.contains('/') {
        return false;
    }
    Path::new(file)
        .extension()
        .map(|ext| {
            let ext = ext.to_string_lossy().to_ascii_lowercase();
            AUDIO_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

/// Slide number of `ppt/slides/slide<N>.xml`.
fn slide_number(name: &str) -> Option<u32> {
    name.strip_prefix("ppt/slides/slide")?
        .strip_suffix(".xml")?
        .parse()
        .ok()
}

/// Paragraph texts of one slide, one line per non-empty paragraph.
pub(crate) fn slide_text(xml: &str) -> Result<String, roxmltree::Error> {
    let doc = roxmltree::Document::parse(xml)?;
    let paragraphs: Vec<String> = doc
        .descendants()
        .filter(|n| n.has_tag_name((DRAWING_NS, "p")))
        .map(|p| {
            p.descendants()
                .filter(|n| n.has_tag_name((DRAWING_NS, "t")))
                .filter_map(|t| t.text())
                .collect::<String>()
        })
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
        .collect();
    Ok(paragraphs.join("\n"))
}

impl DeckExtractor for PptxDeck {
    fn extract_audio(
        &self,
        deck: &Path,
        media_dir: &Path,
        log: &dyn LogSink,
    ) -> CollaboratorResult<Vec<PathBuf>> {
        let mut archive = open_archive(deck)?;
        fs::create_dir_all(media_dir)?;

        let mut written = Vec::new();
        for index in 0..archive.len() {
            let mut entry = archive.by_index(index)?;
            let name = entry.name().to_string();
            if entry.is_dir() || !is_audio_entry(&name) {
                continue;
            }
            let Some(file_name) = Path::new(&name).file_name() else {
                continue;
            };

            let target = media_dir.join(file_name);
            let mut out = File::create(&target)?;
            io::copy(&mut entry, &mut out)?;
            log.info(&format!("Extracted audio: {}", target.display()));
            written.push(target);
        }

        written.sort();
        Ok(written)
    }

    fn extract_slide_text(
        &self,
        deck: &Path,
        out_dir: &Path,
        log: &dyn LogSink,
    ) -> CollaboratorResult<Vec<PathBuf>> {
        let mut archive = open_archive(deck)?;
        fs::create_dir_all(out_dir)?;

        let mut slides: Vec<(u32, String)> = archive
            .file_names()
            .filter_map(|name| slide_number(name).map(|n| (n, name.to_string())))
            .collect();
        slides.sort();

        let mut written = Vec::with_capacity(slides.len());
        for (number, part) in slides {
            let mut xml = String::new();
            archive.by_name(&part)?.read_to_string(&mut xml)?;
            let text = slide_text(&xml).map_err(|e| CollaboratorError::xml(&part, e))?;

            let target = out_dir.join(format!("slide_{}.txt", number));
            fs::write(&target, text)?;
            written.push(target);
        }

        log.info(&format!("Slide text written for {} slides", written.len()));
        Ok(written)
    }
}
