//! Translate every text file in a directory with one loaded model.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::engine::{ChunkedTranslator, TranslationModel};
use crate::batch::{file_name, list_files_with_extension, output_path_for, FileError};
use crate::logging::LogSink;

/// Translate `*.txt` files from `input_dir` into `output_dir`.
///
/// Files are processed in sorted order. A file that fails is logged and
/// skipped. Returns the paths written.
pub fn translate_files<M: TranslationModel>(
    translator: &mut ChunkedTranslator<M>,
    input_dir: &Path,
    output_dir: &Path,
    max_chars: usize,
    log: &dyn LogSink,
) -> io::Result<Vec<PathBuf>> {
    let inputs = list_files_with_extension(input_dir, "txt")?;
    if inputs.is_empty() {
        log.info(&format!("No .txt files found in: {}", input_dir.display()));
        return Ok(Vec::new());
    }
    fs::create_dir_all(output_dir)?;

    let mut written = Vec::with_capacity(inputs.len());
    for input in &inputs {
        match translate_one(translator, input, output_dir, max_chars, log) {
            Ok(path) => {
                log.info(&format!(
                    "Translated: {} -> {}",
                    file_name(input),
                    file_name(&path)
                ));
                written.push(path);
            }
            Err(e) => log.error(&e.to_string()),
        }
    }

    log.log(&format!(
        "Translated {} of {} files",
        written.len(),
        inputs.len()
    ));
    Ok(written)
}

fn translate_one<M: TranslationModel>(
    translator: &mut ChunkedTranslator<M>,
    input: &Path,
    output_dir: &Path,
    max_chars: usize,
    log: &dyn LogSink,
) -> Result<PathBuf, FileError> {
    let text =
        fs::read_to_string(input).map_err(|e| FileError::new("translate", input, e))?;
    let translated = translator
        .translate(&text, max_chars, log)
        .map_err(|e| FileError::new("translate", input, e))?;

    let out_path = output_path_for(input, output_dir, "txt");
    fs::write(&out_path, translated).map_err(|e| FileError::new("translate", input, e))?;
    Ok(out_path)
}
