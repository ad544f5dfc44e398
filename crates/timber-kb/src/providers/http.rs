//! OpenAI-compatible HTTP provider for embeddings and completions.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use super::{CompletionProvider, EmbeddingProvider};
use crate::types::QaPair;

pub struct HttpProvider {
    client: Client,
    api_key: String,
    base_url: String,
    completion_model: String,
    embedding_model: String,
}

impl HttpProvider {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        completion_model: impl Into<String>,
        embedding_model: impl Into<String>,
    ) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(std::time::Duration::from_secs(15))
            .timeout(std::time::Duration::from_secs(120))
            .build()?;

        let base_url = base_url.into().trim_end_matches('/').to_string();
        tracing::info!(base_url = %base_url, "creating HTTP provider");

        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url,
            completion_model: completion_model.into(),
            embedding_model: embedding_model.into(),
        })
    }

    async fn post_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        body: serde_json::Value,
    ) -> Result<T> {
        let endpoint = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .post(&endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    anyhow!("request to {} timed out", endpoint)
                } else if e.is_connect() {
                    anyhow!("failed to connect to {}: {}", endpoint, e)
                } else {
                    anyhow!("request to {} failed: {}", endpoint, e)
                }
            })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| anyhow!("failed to read response body from {}: {}", endpoint, e))?;
        if !status.is_success() {
            let preview: String = text.chars().take(300).collect();
            return Err(anyhow!("API error from {} ({}): {}", endpoint, status, preview));
        }

        serde_json::from_str(&text).map_err(|e| {
            let preview: String = text.chars().take(300).collect();
            anyhow!(
                "failed to parse JSON from {} (HTTP {}): {}. Body: {}",
                endpoint,
                status,
                e,
                preview
            )
        })
    }
}

#[async_trait]
impl EmbeddingProvider for HttpProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let body = json!({
            "model": self.embedding_model,
            "input": text,
        });
        let response: EmbeddingsResponse = self.post_json("/v1/embeddings", body).await?;
        let row = response
            .data
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("embedding API returned no vectors"))?;
        if row.embedding.is_empty() {
            return Err(anyhow!("embedding API returned an empty vector"));
        }
        Ok(row.embedding)
    }
}

#[async_trait]
impl CompletionProvider for HttpProvider {
    async fn complete(&self, prompt: &str, history: &[QaPair]) -> Result<String> {
        let mut messages = Vec::with_capacity(history.len() * 2 + 1);
        for pair in history {
            messages.push(json!({ "role": "user", "content": pair.question }));
            messages.push(json!({ "role": "assistant", "content": pair.answer }));
        }
        messages.push(json!({ "role": "user", "content": prompt }));

        let body = json!({
            "model": self.completion_model,
            "messages": messages,
            "temperature": 0.2,
        });
        let response: ChatResponse = self.post_json("/v1/chat/completions", body).await?;
        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("completion API returned no choices"))?;
        Ok(choice.message.content)
    }
}

#[derive(Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingRow>,
}

#[derive(Deserialize)]
struct EmbeddingRow {
    embedding: Vec<f32>,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: String,
}
