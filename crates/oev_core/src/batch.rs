//! Directory batch helpers shared by the transcription and translation
//! engines.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// One file in a batch could not be processed. The batch continues.
#[derive(Error, Debug)]
#[error("Failed to {action} {name}: {reason}")]
pub struct FileError {
    pub action: &'static str,
    pub name: String,
    pub path: PathBuf,
    pub reason: String,
}

impl FileError {
    pub fn new(action: &'static str, path: &Path, reason: impl ToString) -> Self {
        Self {
            action,
            name: file_name(path),
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }
}

/// File name for log lines, falling back to the full path.
pub fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Regular files in `dir` with the given extension (case-insensitive), sorted
/// by path. A missing directory yields an empty list.
pub fn list_files_with_extension(dir: &Path, extension: &str) -> io::Result<Vec<PathBuf>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };

    let wanted = extension.trim_start_matches('.');
    let mut files = Vec::new();
    for entry in entries {
        let path = entry?.path();
        let matches = path
            .extension()
            .map(|ext| ext.to_string_lossy().eq_ignore_ascii_case(wanted))
            .unwrap_or(false);
        if matches && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Output path `<output_dir>/<stem of input>.<extension>`.
pub fn output_path_for(input: &Path, output_dir: &Path, extension: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    output_dir.join(format!("{}.{}", stem, extension))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn lists_sorted_matching_files() {
        let dir = tempdir().unwrap();
        for name in ["b.wav", "a.WAV", "c.mp3", "notes.txt"] {
            fs::write(dir.path().join(name), b"").unwrap();
        }
        fs::create_dir(dir.path().join("d.wav")).unwrap();

        let files = list_files_with_extension(dir.path(), "wav").unwrap();
        let names: Vec<String> = files.iter().map(|p| file_name(p)).collect();
        assert_eq!(names, vec!["a.WAV", "b.wav"]);
    }

    #[test]
    fn sort_is_by_byte_order() {
        let dir = tempdir().unwrap();
        for name in ["a.wav", "B.wav", "a10.wav", "a2.wav"] {
            fs::write(dir.path().join(name), b"").unwrap();
        }

        let files = list_files_with_extension(dir.path(), "wav").unwrap();
        let names: Vec<String> = files.iter().map(|p| file_name(p)).collect();
        assert_eq!(names, vec!["B.wav", "a.wav", "a10.wav", "a2.wav"]);
    }

    #[test]
    fn missing_dir_is_empty() {
        let dir = tempdir().unwrap();
        let files = list_files_with_extension(&dir.path().join("absent"), ".txt").unwrap();
        assert!(files.is_empty());
    }

    #[test]
    fn output_path_uses_stem() {
        let out = output_path_for(Path::new("/in/lecture_01.wav"), Path::new("/out"), "txt");
        assert_eq!(out, PathBuf::from("/out/lecture_01.txt"));
    }

    #[test]
    fn file_error_message() {
        let err = FileError::new("transcribe", Path::new("/in/b.wav"), "decoder crashed");
        assert_eq!(err.to_string(), "Failed to transcribe b.wav: decoder crashed");
    }
}
