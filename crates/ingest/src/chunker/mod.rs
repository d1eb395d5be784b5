//! Sentence-aligned chunking.
//!
//! Splits arbitrarily long text into windows sized for a length-limited model.
//! Boundaries only ever fall between sentences; a sentence longer than the cap
//! is emitted whole as its own chunk.

mod greedy;
mod helpers;
mod types;

pub use greedy::{chunk_text, chunk_texts};
pub use helpers::split_sentences;
pub use types::Chunk;
