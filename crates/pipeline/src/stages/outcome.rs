//! Per-chunk results collected by the model-driven stages.

use std::future::Future;
use std::time::Duration;

use pdfsum_llm::LlmError;
use serde::Serialize;
use tracing::warn;

/// Why a chunk contributed nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChunkFailure {
    Model { message: String },
    TimedOut { after_ms: u64 },
}

impl std::fmt::Display for ChunkFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChunkFailure::Model { message } => write!(f, "model error: {message}"),
            ChunkFailure::TimedOut { after_ms } => write!(f, "timed out after {after_ms} ms"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ChunkOutcome {
    Succeeded { index: usize, text: String },
    Failed { index: usize, reason: ChunkFailure },
}

impl ChunkOutcome {
    pub fn index(&self) -> usize {
        match self {
            ChunkOutcome::Succeeded { index, .. } | ChunkOutcome::Failed { index, .. } => *index,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ChunkOutcome::Succeeded { .. })
    }
}

/// Outcomes of one stage, in chunk order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StageReport {
    pub outcomes: Vec<ChunkOutcome>,
}

impl StageReport {
    /// Successful outputs joined with single spaces, trimmed.
    pub fn joined(&self) -> String {
        self.outcomes
            .iter()
            .filter_map(|o| match o {
                ChunkOutcome::Succeeded { text, .. } => Some(text.as_str()),
                ChunkOutcome::Failed { .. } => None,
            })
            .collect::<Vec<_>>()
            .join(" ")
            .trim()
            .to_string()
    }

    /// At least one chunk succeeded.
    pub fn is_viable(&self) -> bool {
        self.outcomes.iter().any(ChunkOutcome::is_success)
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }
}

/// Run one model call under `limit`. Errors and timeouts become a failed
/// outcome; neither is propagated.
pub(crate) async fn run_chunk<F>(stage: &'static str, index: usize, limit: Duration, call: F) -> ChunkOutcome
where
    F: Future<Output = Result<String, LlmError>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(Ok(text)) => ChunkOutcome::Succeeded { index, text },
        Ok(Err(e)) => {
            warn!(stage, chunk = index, error = %e, "chunk failed; skipping it");
            ChunkOutcome::Failed {
                index,
                reason: ChunkFailure::Model {
                    message: e.to_string(),
                },
            }
        }
        Err(_) => {
            warn!(stage, chunk = index, timeout_ms = limit.as_millis() as u64, "chunk timed out; skipping it");
            ChunkOutcome::Failed {
                index,
                reason: ChunkFailure::TimedOut {
                    after_ms: limit.as_millis() as u64,
                },
            }
        }
    }
}
