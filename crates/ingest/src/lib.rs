//! Text acquisition for the summarization pipeline: PDF extraction with OCR
//! fallback, sentence chunking and language classification.

pub mod chunker;
pub mod document;
pub mod language;

pub use chunker::{chunk_text, Chunk};
pub use document::{ExtractedDocument, ExtractionError, ExtractionOptions, Extractor};
pub use language::{LanguageClassifier, WhatlangClassifier};
