//! OEV Core - Backend logic for OpenEduVoice
//!
//! Turns a slide deck with narrated audio into a translated deck with
//! synthesized speech. Model loading adapts to the host (accelerator memory,
//! runtime libraries, fallback cascade) and every step is isolated so one
//! failure never stops a run. This crate has zero UI dependencies.

pub mod backend;
pub mod batch;
pub mod collaborators;
pub mod config;
pub mod logging;
pub mod orchestrator;
pub mod process;
pub mod transcription;
pub mod translation;
pub mod worker;
pub mod workspace;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_returns_value() {
        assert!(!version().is_empty());
    }
}
