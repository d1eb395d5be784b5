pub mod ollama;
pub mod openai;

use std::sync::Arc;

use pdfsum_core::config::ModelConfig;

use crate::provider::{LlmError, LlmProvider, Message};

/// Create the configured provider for `model`.
pub fn create_provider(config: &ModelConfig, model: &str) -> Result<Arc<dyn LlmProvider>, LlmError> {
    match config.provider.as_str() {
        "openai" => {
            let api_key = config
                .openai_api_key
                .as_ref()
                .ok_or_else(|| LlmError::NotConfigured("OPENAI_API_KEY not set".into()))?;
            Ok(Arc::new(openai::OpenAiProvider::new(
                api_key.clone(),
                model.to_string(),
                config.openai_base_url.clone(),
            )))
        }
        "ollama" => Ok(Arc::new(ollama::OllamaProvider::new(
            config.ollama_url.clone(),
            model.to_string(),
        ))),
        other => Err(LlmError::NotConfigured(format!(
            "unknown LLM provider: '{}'",
            other
        ))),
    }
}

pub(crate) fn api_messages(messages: &[Message]) -> Vec<serde_json::Value> {
    messages
        .iter()
        .map(|m| {
            serde_json::json!({
                "role": m.role.as_str(),
                "content": m.content,
            })
        })
        .collect()
}
