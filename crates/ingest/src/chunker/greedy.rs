//! Greedy sentence packing.

use super::helpers::{split_sentences, ChunkBuilder};
use super::types::Chunk;

/// Pack the sentences of `text` into chunks of at most `max_chars` characters.
///
/// A chunk is closed when the next sentence plus one separator would exceed
/// `max_chars` and the chunk already holds something. The cap is checked only
/// at that decision, so a single overlong sentence still becomes a chunk of its
/// own. Empty or whitespace-only input yields no chunks.
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    let mut current = ChunkBuilder::default();

    for sentence in split_sentences(text) {
        if current.would_overflow(sentence, max_chars) && !current.is_empty() {
            chunks.push(current.finish(chunks.len()));
        }
        current.push(sentence);
    }

    if !current.is_empty() {
        chunks.push(current.finish(chunks.len()));
    }

    chunks
}

/// Convenience wrapper returning just the chunk strings.
pub fn chunk_texts(text: &str, max_chars: usize) -> Vec<String> {
    chunk_text(text, max_chars)
        .into_iter()
        .map(|c| c.content)
        .collect()
}
