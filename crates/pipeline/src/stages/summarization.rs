//! Chunked summarization with a single unchunked retry.

use std::sync::Arc;
use std::time::Duration;

use pdfsum_ingest::chunk_text;
use pdfsum_llm::Summarizer;
use serde::Serialize;
use tracing::{info, warn};

use super::outcome::{run_chunk, ChunkOutcome, StageReport};

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SummaryOutcome {
    Summary {
        text: String,
        report: StageReport,
        /// Produced by the whole-text retry after every chunk came back empty.
        retried: bool,
    },
    /// Input shorter than the minimum; the model was not called.
    TooShort { len: usize, min: usize },
    Failed { reason: String, report: StageReport },
}

#[derive(Debug, Clone, Copy)]
pub struct SummaryBounds {
    pub min_length: usize,
    pub max_length: usize,
}

pub struct SummarizationStage {
    summarizer: Arc<dyn Summarizer>,
    bounds: SummaryBounds,
    chunk_chars: usize,
    chunk_timeout: Duration,
}

impl SummarizationStage {
    pub fn new(
        summarizer: Arc<dyn Summarizer>,
        bounds: SummaryBounds,
        chunk_chars: usize,
        chunk_timeout: Duration,
    ) -> Self {
        Self {
            summarizer,
            bounds,
            chunk_chars,
            chunk_timeout,
        }
    }

    pub async fn run(&self, text: &str) -> SummaryOutcome {
        let SummaryBounds { min_length, max_length } = self.bounds;
        let trimmed = text.trim();
        let len = trimmed.chars().count();

        if len < min_length {
            info!(len, min = min_length, "input too short to summarize");
            return SummaryOutcome::TooShort { len, min: min_length };
        }

        let chunks = chunk_text(text, self.chunk_chars);
        info!(chunks = chunks.len(), cap = self.chunk_chars, "summarizing");

        let mut report = StageReport::default();
        for chunk in &chunks {
            let outcome = run_chunk(
                "summarization",
                chunk.index,
                self.chunk_timeout,
                self.summarizer.summarize(&chunk.content, min_length, max_length),
            )
            .await;
            report.outcomes.push(outcome);
        }

        let joined = report.joined();
        if !joined.is_empty() {
            if report.failed() > 0 {
                warn!(failed = report.failed(), total = report.outcomes.len(), "summary is missing some chunks");
            }
            return SummaryOutcome::Summary {
                text: joined,
                report,
                retried: false,
            };
        }

        if len >= self.chunk_chars {
            return SummaryOutcome::Failed {
                reason: "no chunk produced a summary".into(),
                report,
            };
        }

        warn!("chunked summarization produced nothing; retrying as a single call");
        let retry = run_chunk(
            "summarization",
            0,
            self.chunk_timeout,
            self.summarizer.summarize(trimmed, min_length, max_length),
        )
        .await;

        match retry {
            ChunkOutcome::Succeeded { ref text, .. } if !text.trim().is_empty() => SummaryOutcome::Summary {
                text: text.trim().to_string(),
                report: StageReport { outcomes: vec![retry.clone()] },
                retried: true,
            },
            _ => SummaryOutcome::Failed {
                reason: "the model produced no summary, even for the whole text in one call".into(),
                report,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{english_text, StubSummarizer};

    const BOUNDS: SummaryBounds = SummaryBounds {
        min_length: 50,
        max_length: 200,
    };

    fn stage(summarizer: Arc<StubSummarizer>) -> SummarizationStage {
        SummarizationStage::new(summarizer, BOUNDS, 3000, Duration::from_secs(5))
    }

    #[tokio::test]
    async fn forty_chars_is_too_short_without_model_call() {
        let summarizer = Arc::new(StubSummarizer::new());
        let text = "a".repeat(40);

        let out = stage(summarizer.clone()).run(&text).await;

        assert!(matches!(out, SummaryOutcome::TooShort { len: 40, min: 50 }));
        assert_eq!(summarizer.calls(), 0);
    }

    #[tokio::test]
    async fn length_check_ignores_surrounding_whitespace() {
        let summarizer = Arc::new(StubSummarizer::new());
        let text = format!("   {}   \n\n", "b".repeat(45));
        let out = stage(summarizer.clone()).run(&text).await;
        assert!(matches!(out, SummaryOutcome::TooShort { len: 45, .. }));
    }

    #[tokio::test]
    async fn five_thousand_chars_summarized_in_two_chunks() {
        let summarizer = Arc::new(StubSummarizer::new());
        let text = english_text(50);

        let out = stage(summarizer.clone()).run(&text).await;

        assert_eq!(summarizer.calls(), 2);
        let inputs = summarizer.inputs();
        assert!(inputs[0].chars().count() <= 3000);
        assert_eq!(format!("{} {}", inputs[0], inputs[1]), text);
        match out {
            SummaryOutcome::Summary { text, retried, .. } => {
                assert_eq!(text, "S1 S2");
                assert!(!retried);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn failed_chunk_is_omitted() {
        let summarizer = Arc::new(StubSummarizer::new().failing_on(1));
        let out = stage(summarizer.clone()).run(&english_text(50)).await;

        match out {
            SummaryOutcome::Summary { text, report, .. } => {
                assert_eq!(text, "S2");
                assert_eq!(report.failed(), 1);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn single_chunk_failure_is_retried_once_unchunked() {
        let summarizer = Arc::new(StubSummarizer::new().failing_on(1));
        let text = english_text(5);

        let out = stage(summarizer.clone()).run(&text).await;

        assert_eq!(summarizer.calls(), 2);
        assert_eq!(summarizer.inputs()[1], text);
        match out {
            SummaryOutcome::Summary { text, retried, .. } => {
                assert_eq!(text, "S2");
                assert!(retried);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn retry_failure_is_total_failure() {
        let summarizer = Arc::new(StubSummarizer::always_failing());
        let out = stage(summarizer.clone()).run(&english_text(5)).await;

        assert_eq!(summarizer.calls(), 2);
        assert!(matches!(out, SummaryOutcome::Failed { .. }));
    }

    #[tokio::test]
    async fn long_input_is_not_retried() {
        let summarizer = Arc::new(StubSummarizer::always_failing());
        let out = stage(summarizer.clone()).run(&english_text(50)).await;

        assert_eq!(summarizer.calls(), 2);
        match out {
            SummaryOutcome::Failed { report, .. } => assert_eq!(report.failed(), 2),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }
}
