//! FFmpeg audio conversion.
//!
//! Converts every audio file in a folder to mono WAV at the configured
//! sample rate, ready for transcription.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use super::{AudioConverter, CollaboratorError, CollaboratorResult};
use crate::batch::{file_name, output_path_for, FileError};
use crate::config::ToolSettings;
use crate::logging::LogSink;
use crate::process::command_exists;

/// Source extensions handed to ffmpeg.
const INPUT_EXTENSIONS: &[&str] = &["mp3", "wav", "m4a", "wma", "aac", "ogg", "flac", "mp4"];

/// Audio converter that shells out to `ffmpeg`.
#[derive(Debug, Clone)]
pub struct FfmpegConverter {
    program: String,
    sample_rate: u32,
}

impl FfmpegConverter {
    pub fn new(program: impl Into<String>, sample_rate: u32) -> Self {
        Self {
            program: program.into(),
            sample_rate,
        }
    }

    pub fn from_settings(settings: &ToolSettings) -> Self {
        Self::new(settings.ffmpeg.clone(), settings.sample_rate)
    }

    fn build_command(&self, input: &Path, output: &Path) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg("-y")
            .arg("-hide_banner")
            .arg("-loglevel")
            .arg("error")
            .arg("-i")
            .arg(input)
            .arg("-vn") // No video
            .arg("-ac")
            .arg("1") // Mono
            .arg("-ar")
            .arg(self.sample_rate.to_string())
            .arg(output);
        cmd.stdin(Stdio::null());
        cmd
    }

    fn convert_one(&self, input: &Path, output_dir: &Path) -> Result<PathBuf, FileError> {
        let output = output_path_for(input, output_dir, "wav");
        let mut cmd = self.build_command(input, &output);

        tracing::debug!("Running FFmpeg: {:?}", cmd);

        let result = cmd
            .output()
            .map_err(|e| FileError::new("convert", input, e))?;
        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            let reason = stderr
                .lines()
                .rev()
                .find(|line| !line.trim().is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| format!("ffmpeg exited with {}", result.status));
            return Err(FileError::new("convert", input, reason));
        }
        Ok(output)
    }
}

fn is_convertible(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .map(|ext| {
                let ext = ext.to_string_lossy().to_ascii_lowercase();
                INPUT_EXTENSIONS.contains(&ext.as_str())
            })
            .unwrap_or(false)
}

/// Keep the first input per file stem; later ones would overwrite its WAV.
fn unique_stems(inputs: Vec<PathBuf>, log: &dyn LogSink) -> Vec<PathBuf> {
    let mut seen = HashSet::new();
    inputs
        .into_iter()
        .filter(|input| {
            let output = output_path_for(input, Path::new(""), "wav");
            if seen.insert(output.clone()) {
                true
            } else {
                log.warn(&format!(
                    "Skipping {}: another file already converts to {}",
                    file_name(input),
                    file_name(&output)
                ));
                false
            }
        })
        .collect()
}

impl AudioConverter for FfmpegConverter {
    fn convert_to_wav(
        &self,
        input_dir: &Path,
        output_dir: &Path,
        log: &dyn LogSink,
    ) -> CollaboratorResult<Vec<PathBuf>> {
        if !input_dir.is_dir() {
            return Err(CollaboratorError::NotFound(input_dir.to_path_buf()));
        }

        let mut inputs: Vec<PathBuf> = fs::read_dir(input_dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| is_convertible(path))
            .collect();
        inputs.sort();
        let inputs = unique_stems(inputs, log);
        if inputs.is_empty() {
            log.info(&format!("No audio files to convert in: {}", input_dir.display()));
            return Ok(Vec::new());
        }

        if !command_exists(&self.program) {
            return Err(CollaboratorError::ToolMissing {
                tool: self.program.clone(),
            });
        }
        fs::create_dir_all(output_dir)?;

        let mut converted = Vec::with_capacity(inputs.len());
        for input in &inputs {
            match self.convert_one(input, output_dir) {
                Ok(path) => {
                    log.info(&format!(
                        "Converted: {} -> {}",
                        file_name(input),
                        file_name(&path)
                    ));
                    converted.push(path);
                }
                Err(e) => log.error(&e.to_string()),
            }
        }
        Ok(converted)
    }
}
