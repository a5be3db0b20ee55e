//! Speech-to-text over directories of audio files.

mod engine;

pub use engine::{join_segments, Segment, SpeechModel, TranscribeOptions, TranscriptionEngine};
