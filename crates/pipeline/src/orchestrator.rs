//! Request state machine: extraction → language → translation → summary.
//!
//! ```text
//! Start → Extracted → LanguageKnown → [Translated] → Summarized → Done
//!   └──────────┴────────────┴──────────────┴────────────┴──→ Failed
//! ```
//!
//! A failure keeps the partial [`PipelineRun`] so callers can report how far
//! the request got.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use pdfsum_core::{Config, DocumentCondition, ExtractionMethod, LanguageTag, ModelRole, PipelineError};
use pdfsum_ingest::{ExtractedDocument, ExtractionError, Extractor, LanguageClassifier, WhatlangClassifier};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::models::ModelSet;
use crate::stages::{
    SummarizationStage, SummaryBounds, SummaryOutcome, StageReport, TranslationOutcome, TranslationStage,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    Start,
    Extracted,
    LanguageKnown,
    Translated,
    Summarized,
    Done,
    Failed,
}

/// How the text was obtained, kept for reporting.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionInfo {
    pub method: ExtractionMethod,
    pub page_count: usize,
    pub chars: usize,
    pub decrypted_with_empty_password: bool,
}

impl From<&ExtractedDocument> for ExtractionInfo {
    fn from(doc: &ExtractedDocument) -> Self {
        Self {
            method: doc.method,
            page_count: doc.page_count,
            chars: doc.total_chars(),
            decrypted_with_empty_password: doc.decrypted_with_empty_password,
        }
    }
}

/// Everything known about one request. Complete on success, partial on
/// failure.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineRun {
    pub source: String,
    pub state: PipelineState,
    /// Last state reached before failing.
    pub failed_at: Option<PipelineState>,
    /// Container health as determined by extraction.
    pub condition: Option<DocumentCondition>,
    pub extraction: Option<ExtractionInfo>,
    pub language: Option<LanguageTag>,
    pub translated: bool,
    pub translation: Option<StageReport>,
    pub summarization: Option<StageReport>,
    pub summary: Option<String>,
    /// Degradations that did not stop the request.
    pub notes: Vec<String>,
}

impl PipelineRun {
    fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            state: PipelineState::Start,
            failed_at: None,
            condition: None,
            extraction: None,
            language: None,
            translated: false,
            translation: None,
            summarization: None,
            summary: None,
            notes: Vec::new(),
        }
    }

    fn advance(&mut self, state: PipelineState) {
        self.state = state;
    }

    fn note(&mut self, note: String) {
        warn!(source = %self.source, "{note}");
        self.notes.push(note);
    }

    fn fail(mut self, error: PipelineError) -> PipelineFailure {
        warn!(source = %self.source, state = ?self.state, error = %error, "pipeline failed");
        self.failed_at = Some(self.state);
        self.state = PipelineState::Failed;
        PipelineFailure {
            error,
            run: Box::new(self),
        }
    }
}

/// A failed request with its partial state.
#[derive(Debug, Error)]
#[error("{error}")]
pub struct PipelineFailure {
    pub error: PipelineError,
    pub run: Box<PipelineRun>,
}

/// Tunables for one orchestrator.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    /// ISO 639-3 code the summary is produced in.
    pub target_language: String,
    pub translation_chunk_chars: usize,
    pub summary_chunk_chars: usize,
    pub summary: SummaryBounds,
    pub chunk_timeout: Duration,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            target_language: "eng".into(),
            translation_chunk_chars: 1000,
            summary_chunk_chars: 3000,
            summary: SummaryBounds {
                min_length: 50,
                max_length: 200,
            },
            chunk_timeout: Duration::from_secs(120),
        }
    }
}

impl From<&Config> for PipelineSettings {
    fn from(config: &Config) -> Self {
        Self {
            target_language: config.language.target.clone(),
            translation_chunk_chars: config.chunking.translation_chunk_chars,
            summary_chunk_chars: config.chunking.summary_chunk_chars,
            summary: SummaryBounds {
                min_length: config.summary.min_length,
                max_length: config.summary.max_length,
            },
            chunk_timeout: config.models.chunk_timeout(),
        }
    }
}

/// Sequences the stages for a request. Cheap to share; holds no per-request
/// state.
pub struct Orchestrator {
    extractor: Extractor,
    classifier: Arc<dyn LanguageClassifier>,
    models: ModelSet,
    settings: PipelineSettings,
}

impl Orchestrator {
    pub fn new(
        extractor: Extractor,
        classifier: Arc<dyn LanguageClassifier>,
        models: ModelSet,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            extractor,
            classifier,
            models,
            settings,
        }
    }

    /// Production wiring; `models` come from [`ModelSet::initialize`].
    pub fn from_config(config: &Config, models: ModelSet) -> Self {
        Self::new(
            Extractor::from_config(&config.extraction),
            Arc::new(WhatlangClassifier),
            models,
            PipelineSettings::from(config),
        )
    }

    pub fn models(&self) -> &ModelSet {
        &self.models
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Run extraction only. Extraction is blocking (file IO, subprocesses),
    /// so it runs on the blocking pool.
    pub async fn extract(&self, path: &Path) -> Result<ExtractedDocument, PipelineError> {
        self.extract_blocking(path)
            .await
            .map_err(|e| map_extraction_error(e, &display_name(path)))
    }

    async fn extract_blocking(&self, path: &Path) -> Result<ExtractedDocument, ExtractionError> {
        let extractor = self.extractor.clone();
        let owned: PathBuf = path.to_path_buf();
        tokio::task::spawn_blocking(move || extractor.extract(&owned))
            .await
            .map_err(|e| ExtractionError::Io(std::io::Error::other(e)))?
    }

    /// Summarize the PDF at `path`.
    pub async fn run(&self, path: &Path) -> Result<PipelineRun, PipelineFailure> {
        self.run_as(path, &display_name(path)).await
    }

    /// Summarize the PDF at `path`, reporting it as `source`. Used when the
    /// file on disk is a temporary copy of an upload.
    pub async fn run_as(&self, path: &Path, source: &str) -> Result<PipelineRun, PipelineFailure> {
        let mut run = PipelineRun::new(source);
        info!(source = %source, "processing document");

        let doc = match self.extract_blocking(path).await {
            Ok(doc) => doc,
            Err(e) => {
                run.condition = e.condition();
                return Err(run.fail(map_extraction_error(e, source)));
            }
        };
        run.condition = Some(doc.condition());
        run.extraction = Some(ExtractionInfo::from(&doc));
        if doc.decrypted_with_empty_password {
            run.note("document was encrypted and opened with an empty password".into());
        }

        let text = doc.full_text();
        if text.trim().is_empty() {
            return Err(run.fail(PipelineError::NoExtractableText(source.to_string())));
        }
        info!(source = %source, chars = text.chars().count(), method = ?doc.method, "text extraction complete");

        run.advance(PipelineState::Extracted);
        self.process_text(run, text).await
    }

    /// Summarize already extracted text, starting at `Extracted`.
    pub async fn run_text(&self, source: &str, text: &str) -> Result<PipelineRun, PipelineFailure> {
        let mut run = PipelineRun::new(source);
        if text.trim().is_empty() {
            return Err(run.fail(PipelineError::NoExtractableText(source.to_string())));
        }
        run.advance(PipelineState::Extracted);
        self.process_text(run, text.to_string()).await
    }

    async fn process_text(&self, mut run: PipelineRun, text: String) -> Result<PipelineRun, PipelineFailure> {
        let language = self.classifier.classify(&text);
        info!(source = %run.source, language = %language, "language classified");
        run.language = Some(language.clone());
        run.advance(PipelineState::LanguageKnown);

        let target = self.settings.target_language.as_str();
        let mut text_to_summarize = text;

        if !language.matches(target) {
            match &self.models.translator {
                Some(translator) => {
                    info!(from = %language, to = target, "translating before summarization");
                    let stage = TranslationStage::new(
                        Some(translator.clone()),
                        self.settings.translation_chunk_chars,
                        self.settings.chunk_timeout,
                    );
                    let outcome = stage.run(&text_to_summarize).await;
                    run.translation = outcome.report().cloned();
                    run.advance(PipelineState::Translated);

                    if let TranslationOutcome::Translated { text, .. } = outcome {
                        if text.is_empty() {
                            run.note("translation produced no text; summarizing the original text".into());
                        } else {
                            info!(chars = text.chars().count(), "translation complete");
                            text_to_summarize = text;
                            run.translated = true;
                        }
                    }
                }
                None => run.note(format!(
                    "detected language '{language}' but no translator is available; summarizing untranslated text"
                )),
            }
        }

        let Some(summarizer) = self.models.summarizer.clone() else {
            return Err(run.fail(PipelineError::ModelUnavailable(ModelRole::Summarization)));
        };

        let stage = SummarizationStage::new(
            summarizer,
            self.settings.summary,
            self.settings.summary_chunk_chars,
            self.settings.chunk_timeout,
        );

        match stage.run(&text_to_summarize).await {
            SummaryOutcome::Summary { text, report, retried } => {
                if retried {
                    run.note("chunked summarization failed; summary came from a single whole-text call".into());
                }
                run.summarization = Some(report);
                run.summary = Some(text);
                run.advance(PipelineState::Summarized);
                run.advance(PipelineState::Done);
                info!(source = %run.source, "summary generated");
                Ok(run)
            }
            SummaryOutcome::TooShort { len, min } => {
                Err(run.fail(PipelineError::SummarizationTooShort { len, min }))
            }
            SummaryOutcome::Failed { reason, report } => {
                run.summarization = Some(report);
                Err(run.fail(PipelineError::SummarizationFailed(reason)))
            }
        }
    }
}

fn map_extraction_error(e: ExtractionError, source: &str) -> PipelineError {
    match e {
        ExtractionError::NotFound(p) => PipelineError::NotFound(p.display().to_string()),
        ExtractionError::NotPdf(_) => PipelineError::NotPdf(source.to_string()),
        ExtractionError::Encrypted(_) => PipelineError::Encrypted(source.to_string()),
        ExtractionError::UnsupportedEncryption { scheme, .. } => PipelineError::EncryptionUnsupported {
            name: source.to_string(),
            scheme,
        },
        ExtractionError::Corrupted { reason, .. } => {
            debug!(source, reason = %reason, "corruption detail");
            PipelineError::Corrupted(source.to_string())
        }
        ExtractionError::Io(e) => PipelineError::Io(e),
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
