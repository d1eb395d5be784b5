//! One-time model initialisation and per-model throttling.

use std::sync::Arc;

use async_trait::async_trait;
use pdfsum_core::{Config, ModelRole};
use pdfsum_llm::{create_provider, LlmError, LlmProvider, LlmSummarizer, LlmTranslator, Summarizer, Translator};
use serde::Serialize;
use tokio::sync::Semaphore;
use tracing::{info, warn};

/// Bounds concurrent calls into a model. Requests queue on the semaphore.
pub struct Throttled<T: ?Sized> {
    inner: Arc<T>,
    permits: Arc<Semaphore>,
}

impl<T: ?Sized> Throttled<T> {
    pub fn new(inner: Arc<T>, permits: usize) -> Self {
        Self {
            inner,
            permits: Arc::new(Semaphore::new(permits.max(1))),
        }
    }

    async fn acquire(&self) -> Result<tokio::sync::SemaphorePermit<'_>, LlmError> {
        self.permits
            .acquire()
            .await
            .map_err(|_| LlmError::NotConfigured("model queue closed".into()))
    }
}

#[async_trait]
impl<T: Translator + ?Sized> Translator for Throttled<T> {
    async fn translate(&self, chunk: &str, max_length: usize) -> Result<String, LlmError> {
        let _permit = self.acquire().await?;
        self.inner.translate(chunk, max_length).await
    }
}

#[async_trait]
impl<T: Summarizer + ?Sized> Summarizer for Throttled<T> {
    async fn summarize(&self, chunk: &str, min_length: usize, max_length: usize) -> Result<String, LlmError> {
        let _permit = self.acquire().await?;
        self.inner.summarize(chunk, min_length, max_length).await
    }
}

/// The loaded models, shared read-only by every request. A `None` model
/// failed to load and stays unavailable for the process lifetime.
#[derive(Clone, Default)]
pub struct ModelSet {
    pub translator: Option<Arc<dyn Translator>>,
    pub summarizer: Option<Arc<dyn Summarizer>>,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct ModelStatus {
    pub translation: bool,
    pub summarization: bool,
}

impl ModelSet {
    pub fn new(translator: Option<Arc<dyn Translator>>, summarizer: Option<Arc<dyn Summarizer>>) -> Self {
        Self { translator, summarizer }
    }

    /// Build and check both models from config. Failures are logged once and
    /// leave that model unavailable.
    pub async fn initialize(config: &Config) -> Self {
        let models = &config.models;

        let summarizer = match load_provider(config, ModelRole::Summarization, &models.summary_model).await {
            Some(provider) => Some(Arc::new(LlmSummarizer::new(provider)) as Arc<dyn Summarizer>),
            None => None,
        };

        let translator = if !models.translation_enabled {
            info!("translation disabled by configuration");
            None
        } else {
            match load_provider(config, ModelRole::Translation, &models.translation_model).await {
                Some(provider) => {
                    let target = language_name(&config.language.target);
                    Some(Arc::new(LlmTranslator::new(provider, target)) as Arc<dyn Translator>)
                }
                None => None,
            }
        };

        let set = Self::new(translator, summarizer).throttled(models.concurrency);
        let status = set.status();
        if !status.summarization {
            warn!("summarization model unavailable; every request will fail until it is fixed");
        }
        if !status.translation {
            warn!("translation model unavailable; non-target documents will be summarized untranslated");
        }
        set
    }

    /// Wrap both models so at most `permits` calls run at once per model.
    pub fn throttled(self, permits: usize) -> Self {
        Self {
            translator: self
                .translator
                .map(|t| Arc::new(Throttled::new(t, permits)) as Arc<dyn Translator>),
            summarizer: self
                .summarizer
                .map(|s| Arc::new(Throttled::new(s, permits)) as Arc<dyn Summarizer>),
        }
    }

    pub fn status(&self) -> ModelStatus {
        ModelStatus {
            translation: self.translator.is_some(),
            summarization: self.summarizer.is_some(),
        }
    }
}

async fn load_provider(config: &Config, role: ModelRole, model: &str) -> Option<Arc<dyn LlmProvider>> {
    let provider = match create_provider(&config.models, model) {
        Ok(p) => p,
        Err(e) => {
            warn!(%role, model, error = %e, "failed to create model provider");
            return None;
        }
    };

    info!(%role, model, provider = %config.models.provider, "loading model");
    match provider.check_available().await {
        Ok(()) => {
            info!(%role, model, "model loaded");
            Some(provider)
        }
        Err(e) => {
            warn!(%role, model, error = %e, "model failed to load");
            None
        }
    }
}

/// English name for an ISO 639-3 code, falling back to the code itself.
fn language_name(code: &str) -> String {
    whatlang::Lang::from_code(code)
        .map(|lang| lang.eng_name().to_string())
        .unwrap_or_else(|| code.to_string())
}
