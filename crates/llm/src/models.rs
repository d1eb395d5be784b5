//! Translation and summarization collaborators.
//!
//! The pipeline depends only on [`Translator`] and [`Summarizer`]; the
//! `Llm*` adapters implement them by prompting any [`LlmProvider`].

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::provider::{LlmError, LlmProvider, Message};

/// Translates one chunk of text into the target language.
#[async_trait]
pub trait Translator: Send + Sync {
    /// `max_length` bounds the output, in model tokens.
    async fn translate(&self, chunk: &str, max_length: usize) -> Result<String, LlmError>;
}

/// Summarizes one chunk of text.
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// `min_length`/`max_length` bound the summary, in words.
    async fn summarize(
        &self,
        chunk: &str,
        min_length: usize,
        max_length: usize,
    ) -> Result<String, LlmError>;
}

const TRANSLATION_TEMPERATURE: f32 = 0.0;
const SUMMARY_TEMPERATURE: f32 = 0.2;

/// Rough tokens-per-word ratio used to size the completion budget.
const TOKENS_PER_WORD: usize = 2;

pub struct LlmTranslator {
    provider: Arc<dyn LlmProvider>,
    /// Human-readable target language name, e.g. "English".
    target: String,
}

impl LlmTranslator {
    pub fn new(provider: Arc<dyn LlmProvider>, target: impl Into<String>) -> Self {
        Self {
            provider,
            target: target.into(),
        }
    }

    fn messages(&self, chunk: &str) -> Vec<Message> {
        vec![
            Message::system(format!(
                "You are a translation engine. Translate the user's text into {}. \
                 Reply with the translation only, without notes or quotation marks.",
                self.target
            )),
            Message::user(chunk),
        ]
    }
}

#[async_trait]
impl Translator for LlmTranslator {
    async fn translate(&self, chunk: &str, max_length: usize) -> Result<String, LlmError> {
        debug!(model = self.provider.model(), chars = chunk.len(), "translating chunk");
        let out = self
            .provider
            .complete(self.messages(chunk), TRANSLATION_TEMPERATURE, clamp_tokens(max_length))
            .await?;
        non_empty(out)
    }
}

pub struct LlmSummarizer {
    provider: Arc<dyn LlmProvider>,
}

impl LlmSummarizer {
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self { provider }
    }

    fn messages(chunk: &str, min_length: usize, max_length: usize) -> Vec<Message> {
        vec![
            Message::system(format!(
                "You summarize documents in English. Write a single-paragraph summary of \
                 the user's text between {min_length} and {max_length} words. \
                 Reply with the summary only."
            )),
            Message::user(chunk),
        ]
    }
}

#[async_trait]
impl Summarizer for LlmSummarizer {
    async fn summarize(
        &self,
        chunk: &str,
        min_length: usize,
        max_length: usize,
    ) -> Result<String, LlmError> {
        debug!(model = self.provider.model(), chars = chunk.len(), "summarizing chunk");
        let out = self
            .provider
            .complete(
                Self::messages(chunk, min_length, max_length),
                SUMMARY_TEMPERATURE,
                clamp_tokens(max_length.saturating_mul(TOKENS_PER_WORD)),
            )
            .await?;
        non_empty(out)
    }
}

fn clamp_tokens(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX).max(1)
}

fn non_empty(out: String) -> Result<String, LlmError> {
    let trimmed = out.trim();
    if trimmed.is_empty() {
        Err(LlmError::EmptyResponse)
    } else {
        Ok(trimmed.to_string())
    }
}
