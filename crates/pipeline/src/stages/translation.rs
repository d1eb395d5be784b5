//! Chunked translation with per-chunk failure tolerance.

use std::sync::Arc;
use std::time::Duration;

use pdfsum_ingest::chunk_text;
use pdfsum_llm::Translator;
use serde::Serialize;
use tracing::{info, warn};

use super::outcome::{run_chunk, StageReport};

/// Output budget per chunk, relative to the chunk cap.
const OUTPUT_BUDGET_FACTOR: usize = 2;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TranslationOutcome {
    /// Every chunk went through the model; `text` may be empty if all failed.
    Translated { text: String, report: StageReport },
    /// No translator is loaded, so the input is returned unchanged.
    Passthrough { text: String },
}

impl TranslationOutcome {
    pub fn text(&self) -> &str {
        match self {
            TranslationOutcome::Translated { text, .. } | TranslationOutcome::Passthrough { text } => text,
        }
    }

    pub fn report(&self) -> Option<&StageReport> {
        match self {
            TranslationOutcome::Translated { report, .. } => Some(report),
            TranslationOutcome::Passthrough { .. } => None,
        }
    }
}

pub struct TranslationStage {
    translator: Option<Arc<dyn Translator>>,
    chunk_chars: usize,
    chunk_timeout: Duration,
}

impl TranslationStage {
    pub fn new(translator: Option<Arc<dyn Translator>>, chunk_chars: usize, chunk_timeout: Duration) -> Self {
        Self {
            translator,
            chunk_chars,
            chunk_timeout,
        }
    }

    pub async fn run(&self, text: &str) -> TranslationOutcome {
        let Some(translator) = &self.translator else {
            return TranslationOutcome::Passthrough {
                text: text.to_string(),
            };
        };

        let chunks = chunk_text(text, self.chunk_chars);
        info!(chunks = chunks.len(), cap = self.chunk_chars, "translating");

        let max_length = self.chunk_chars * OUTPUT_BUDGET_FACTOR;
        let mut report = StageReport::default();
        for chunk in &chunks {
            let outcome = run_chunk(
                "translation",
                chunk.index,
                self.chunk_timeout,
                translator.translate(&chunk.content, max_length),
            )
            .await;
            report.outcomes.push(outcome);
        }

        if report.failed() > 0 {
            warn!(failed = report.failed(), total = report.outcomes.len(), "some chunks were not translated");
        }

        TranslationOutcome::Translated {
            text: report.joined(),
            report,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::StubTranslator;

    const FRENCH: &str = "Le chat dort. Le chien mange. La maison est grande.";

    #[tokio::test]
    async fn missing_translator_is_passthrough() {
        let stage = TranslationStage::new(None, 1000, Duration::from_secs(5));
        let out = stage.run(FRENCH).await;
        assert!(matches!(out, TranslationOutcome::Passthrough { .. }));
        assert_eq!(out.text(), FRENCH);
        assert!(out.report().is_none());
    }

    #[tokio::test]
    async fn chunks_are_translated_and_joined() {
        let translator = Arc::new(StubTranslator::prefixing("EN:"));
        let stage = TranslationStage::new(Some(translator.clone()), 20, Duration::from_secs(5));

        let out = stage.run(FRENCH).await;

        assert_eq!(translator.calls(), 3);
        assert_eq!(out.text(), "EN:Le chat dort. EN:Le chien mange. EN:La maison est grande.");
        assert_eq!(translator.max_lengths(), vec![40, 40, 40]);
    }

    #[tokio::test]
    async fn failed_chunk_is_omitted() {
        let translator = Arc::new(StubTranslator::prefixing("EN:").failing_on(2));
        let stage = TranslationStage::new(Some(translator.clone()), 20, Duration::from_secs(5));

        let out = stage.run(FRENCH).await;

        assert_eq!(translator.calls(), 3);
        assert_eq!(out.text(), "EN:Le chat dort. EN:La maison est grande.");
        let report = out.report().unwrap();
        assert_eq!(report.failed(), 1);
        assert!(!report.outcomes[1].is_success());
    }

    #[tokio::test(start_paused = true)]
    async fn timed_out_chunk_is_treated_as_failure() {
        let translator = Arc::new(StubTranslator::prefixing("EN:").stalling_on(1));
        let stage = TranslationStage::new(Some(translator.clone()), 20, Duration::from_secs(2));

        let out = stage.run(FRENCH).await;

        assert_eq!(out.text(), "EN:Le chien mange. EN:La maison est grande.");
    }

    #[tokio::test]
    async fn all_chunks_failing_yields_empty_text() {
        let translator = Arc::new(StubTranslator::always_failing());
        let stage = TranslationStage::new(Some(translator), 1000, Duration::from_secs(5));
        let out = stage.run(FRENCH).await;
        assert_eq!(out.text(), "");
        assert!(!out.report().unwrap().is_viable());
    }
}
