use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

use super::api_messages;
use crate::provider::{LlmError, LlmProvider, Message};

pub struct OllamaProvider {
    client: reqwest::Client,
    url: String,
    model: String,
}

impl OllamaProvider {
    pub fn new(url: String, model: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.trim_end_matches('/').to_string(),
            model,
        }
    }
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    async fn complete(
        &self,
        messages: Vec<Message>,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<String, LlmError> {
        let url = format!("{}/api/chat", self.url);

        let body = json!({
            "model": self.model,
            "messages": api_messages(&messages),
            "stream": false,
            "options": {
                "temperature": temperature,
                "num_predict": max_tokens,
            },
        });

        debug!("Ollama request to {}", url);

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status().as_u16();
        if status != 200 {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::ApiError { status, body });
        }

        let resp: serde_json::Value = response.json().await?;
        let content = resp["message"]["content"]
            .as_str()
            .ok_or_else(|| LlmError::ParseError("missing message.content".into()))?
            .to_string();

        Ok(content)
    }

    /// Lists local models and checks ours is pulled.
    async fn check_available(&self) -> Result<(), LlmError> {
        let url = format!("{}/api/tags", self.url);
        let response = self.client.get(&url).send().await?;

        let status = response.status().as_u16();
        if status != 200 {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::ApiError { status, body });
        }

        let resp: serde_json::Value = response.json().await?;
        let models = resp["models"]
            .as_array()
            .ok_or_else(|| LlmError::ParseError("missing models".into()))?;

        // Ollama reports "llama3.2:latest" for a model pulled as "llama3.2".
        let pulled = models.iter().filter_map(|m| m["name"].as_str()).any(|name| {
            name == self.model || name.strip_suffix(":latest") == Some(self.model.as_str())
        });

        if pulled {
            Ok(())
        } else {
            Err(LlmError::NotConfigured(format!(
                "model '{}' is not pulled in Ollama",
                self.model
            )))
        }
    }

    fn model(&self) -> &str {
        &self.model
    }
}
