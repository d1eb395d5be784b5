//! Model-driven stages. Both chunk their input, call the model per chunk and
//! tolerate individual chunk failures.

pub mod outcome;
pub mod summarization;
pub mod translation;

pub use outcome::{ChunkFailure, ChunkOutcome, StageReport};
pub use summarization::{SummarizationStage, SummaryBounds, SummaryOutcome};
pub use translation::{TranslationOutcome, TranslationStage};
