//! Sentence segmentation and chunk assembly.

use unicode_segmentation::UnicodeSegmentation;

use super::types::Chunk;

/// Split `text` into trimmed, non-empty sentences using Unicode sentence
/// boundaries (UAX #29).
pub fn split_sentences(text: &str) -> Vec<&str> {
    text.unicode_sentences()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Character length, which is what the caps are expressed in.
pub(crate) fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Accumulates sentences for the chunk being built.
#[derive(Default)]
pub(crate) struct ChunkBuilder<'a> {
    sentences: Vec<&'a str>,
    /// Running size: every sentence counts its length plus one separator.
    budget_used: usize,
}

impl<'a> ChunkBuilder<'a> {
    pub(crate) fn is_empty(&self) -> bool {
        self.sentences.is_empty()
    }

    /// Whether adding `sentence` would push the chunk over `max_chars`.
    pub(crate) fn would_overflow(&self, sentence: &str, max_chars: usize) -> bool {
        self.budget_used + char_len(sentence) + 1 > max_chars
    }

    pub(crate) fn push(&mut self, sentence: &'a str) {
        self.budget_used += char_len(sentence) + 1;
        self.sentences.push(sentence);
    }

    /// Close the current chunk, leaving the builder empty.
    pub(crate) fn finish(&mut self, index: usize) -> Chunk {
        let sentences = std::mem::take(&mut self.sentences);
        self.budget_used = 0;
        Chunk {
            index,
            sentence_count: sentences.len(),
            content: sentences.join(" "),
        }
    }
}
