//! HTTP client for an Ollama-compatible model server
//!
//! One client serves both embeddings (`/api/embeddings`) and chat
//! (`/api/chat`). Transient failures are retried with exponential backoff;
//! exhausted retries surface as the unavailable-service errors so callers
//! can distinguish "model down" from "bad request".

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::LlmConfig;
use crate::error::{Error, Result};

use super::embedding::EmbeddingProvider;
use super::llm::{ChatMessage, LlmProvider};

/// Client for an Ollama-compatible API
pub struct OllamaClient {
    client: reqwest::Client,
    base_url: String,
    embed_model: String,
    generate_model: String,
    temperature: f32,
    max_retries: u32,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    embedding: Vec<f32>,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: String,
}

impl OllamaClient {
    pub fn new(config: &LlmConfig, embed_model: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_default();
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            embed_model: embed_model.to_string(),
            generate_model: config.generate_model.clone(),
            temperature: config.temperature,
            max_retries: config.max_retries,
        }
    }

    /// Probe the server. Used at startup to warn early, never to gate requests.
    pub async fn health_check(&self) -> bool {
        let url = format!("{}/api/tags", self.base_url);
        match self.client.get(&url).send().await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }

    /// POST a JSON body, retrying transient failures with exponential backoff.
    async fn post_with_retry(&self, url: &str, body: &serde_json::Value) -> Result<reqwest::Response> {
        let mut attempt = 0;
        loop {
            match self.client.post(url).json(body).send().await {
                Ok(response) if response.status().is_success() => return Ok(response),
                Ok(response) => {
                    let status = response.status();
                    // Client errors won't improve on retry.
                    if status.is_client_error() || attempt >= self.max_retries {
                        let detail = response.text().await.unwrap_or_default();
                        return Err(Error::internal(format!("{url} returned {status}: {detail}")));
                    }
                    warn!(%url, %status, attempt, "model server returned error, retrying");
                }
                Err(e) => {
                    if attempt >= self.max_retries {
                        return Err(Error::Http(e));
                    }
                    warn!(%url, error = %e, attempt, "request failed, retrying");
                }
            }
            attempt += 1;
            tokio::time::sleep(Duration::from_millis(250 * 2u64.pow(attempt))).await;
        }
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let url = format!("{}/api/embeddings", self.base_url);
        let body = json!({
            "model": self.embed_model,
            "prompt": text,
        });
        let response = self
            .post_with_retry(&url, &body)
            .await
            .map_err(|e| Error::EmbeddingUnavailable(e.to_string()))?;
        let parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| Error::EmbeddingUnavailable(format!("invalid response: {e}")))?;
        debug!(model = %self.embed_model, dims = parsed.embedding.len(), "embedded text");
        Ok(parsed.embedding)
    }
}

#[async_trait]
impl LlmProvider for OllamaClient {
    async fn chat(&self, messages: &[ChatMessage]) -> Result<String> {
        let url = format!("{}/api/chat", self.base_url);
        let body = json!({
            "model": self.generate_model,
            "messages": messages,
            "stream": false,
            "options": { "temperature": self.temperature },
        });
        let response = self
            .post_with_retry(&url, &body)
            .await
            .map_err(|e| Error::InferenceUnavailable(e.to_string()))?;
        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| Error::InferenceUnavailable(format!("invalid response: {e}")))?;
        Ok(parsed.message.content)
    }
}
