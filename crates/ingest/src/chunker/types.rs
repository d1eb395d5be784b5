//! Chunk output type.

/// A run of consecutive sentences.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// 0-based position in the chunk sequence.
    pub index: usize,
    /// Sentences joined with single spaces.
    pub content: String,
    pub sentence_count: usize,
}

impl Chunk {
    /// Length in characters (not bytes).
    pub fn char_len(&self) -> usize {
        self.content.chars().count()
    }
}
