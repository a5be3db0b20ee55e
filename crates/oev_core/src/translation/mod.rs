//! Sentence-bounded chunked translation.
//!
//! Text is split at sentence boundaries, packed greedily into chunks that fit
//! the model's context, translated chunk by chunk and rejoined in order.

mod batch;
mod engine;
mod languages;
mod segment;

pub use batch::translate_files;
pub use engine::{ChunkedTranslator, DecodingOptions, TranslationError, TranslationModel};
pub use languages::LanguagePair;
pub use segment::{pack_chunks, segment, split_sentences, TextChunk};
