//! The PDF → summary pipeline: translation and summarization stages, model
//! initialisation and the per-request orchestrator.

pub mod models;
pub mod orchestrator;
pub mod stages;

#[cfg(test)]
pub(crate) mod testing;

pub use models::{ModelSet, ModelStatus, Throttled};
pub use orchestrator::{
    ExtractionInfo, Orchestrator, PipelineFailure, PipelineRun, PipelineSettings, PipelineState,
};
pub use stages::{ChunkFailure, ChunkOutcome, StageReport, SummaryOutcome, TranslationOutcome};
