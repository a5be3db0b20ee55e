//! Sentence segmentation and greedy chunk packing.

/// A bounded piece of the input, translated on its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextChunk {
    /// Position in the document, contiguous from 0.
    pub ordinal: usize,
    pub content: String,
}

impl TextChunk {
    /// Length in characters.
    pub fn len(&self) -> usize {
        self.content.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

fn is_terminal(c: char) -> bool {
    matches!(c, '.' | '!' | '?')
}

/// Split on runs of whitespace that follow `.`, `!` or `?`.
///
/// The punctuation stays with its sentence; empty pieces are dropped.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let text = text.trim();
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((_, c)) = chars.next() {
        if !is_terminal(c) {
            continue;
        }
        let end = match chars.peek() {
            Some(&(idx, next)) if next.is_whitespace() => idx,
            _ => continue,
        };

        let mut resume = text.len();
        while let Some(&(idx, next)) = chars.peek() {
            if next.is_whitespace() {
                chars.next();
            } else {
                resume = idx;
                break;
            }
        }

        push_sentence(&mut sentences, &text[start..end]);
        start = resume;
    }

    if start < text.len() {
        push_sentence(&mut sentences, &text[start..]);
    }
    sentences
}

fn push_sentence<'a>(sentences: &mut Vec<&'a str>, piece: &'a str) {
    let piece = piece.trim();
    if !piece.is_empty() {
        sentences.push(piece);
    }
}

/// Greedily pack sentences into chunks of at most `max_chars` characters.
///
/// Sentences are joined by one space, which counts toward the limit so a
/// packed chunk never exceeds `max_chars` once joined. A single
/// sentence longer than the limit becomes its own chunk. A limit of 0 is
/// treated as 1.
pub fn pack_chunks(sentences: &[&str], max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for sentence in sentences {
        let len = sentence.chars().count();
        let joined_len = if current.is_empty() {
            len
        } else {
            current_len + 1 + len
        };

        if joined_len <= max_chars {
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(sentence);
            current_len = joined_len;
        } else {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
            }
            current.push_str(sentence);
            current_len = len;
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Segment text into ordered chunks.
pub fn segment(text: &str, max_chars: usize) -> Vec<TextChunk> {
    pack_chunks(&split_sentences(text), max_chars)
        .into_iter()
        .enumerate()
        .map(|(ordinal, content)| TextChunk { ordinal, content })
        .collect()
}
