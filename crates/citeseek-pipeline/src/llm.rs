//! Backend seam for the external embedding and chat-completion services.
//!
//! The pipeline treats both as opaque request/response contracts; credentials
//! arrive per request and are never read from process environment here.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::instrument;

use citeseek_common::{PipelineError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: String, // "system" | "user" | "assistant"
    pub content: String,
}

impl Message {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self { role: role.into(), content: content.into() }
    }
}

#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// Chat completion over an ordered message sequence.
    async fn complete(&self, messages: Vec<Message>) -> Result<String>;

    /// Embed a batch of texts; returns one vector per input, input order.
    async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>>;
}

// ── OpenAI-style HTTP backend ────────────────────────────────────────────────

pub struct OpenAiBackend {
    base_url: String,
    model: String,
    embedding_model: String,
    api_key: String,
    client: reqwest::Client,
}

impl OpenAiBackend {
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        embedding_model: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PipelineError::UpstreamUnavailable(e.to_string()))?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            embedding_model: embedding_model.into(),
            api_key: api_key.into(),
            client,
        })
    }
}

async fn check_response_status(
    resp: reqwest::Response,
    on_error: impl FnOnce(String) -> PipelineError,
) -> Result<serde_json::Value> {
    let status = resp.status().as_u16();
    // Read text first: error bodies are not always JSON, and a parse failure
    // must not change which error variant the caller's mapping produces.
    let text = resp.text().await?;
    if status >= 400 {
        return Err(on_error(format!("[{status}]: {}", api_error_message(&text))));
    }
    Ok(serde_json::from_str(&text)?)
}

/// Extracts a human-readable message from an API error body, JSON or not.
fn api_error_message(body: &str) -> String {
    if let Ok(json) = serde_json::from_str::<serde_json::Value>(body) {
        if let Some(msg) = json["error"]["message"].as_str().or_else(|| json["message"].as_str()) {
            return msg.to_string();
        }
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        "unknown API error".to_string()
    } else {
        trimmed.to_string()
    }
}

#[async_trait]
impl LlmBackend for OpenAiBackend {
    #[instrument(skip(self, messages), fields(n = messages.len()))]
    async fn complete(&self, messages: Vec<Message>) -> Result<String> {
        let url = format!("{}/v1/chat/completions", self.base_url);
        let body = serde_json::json!({
            "model": &self.model,
            "messages": messages,
            "temperature": 0.1,
        });
        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| PipelineError::GenerationFailure(e.to_string()))?;
        let json =
            check_response_status(resp, |m| {
                PipelineError::GenerationFailure(format!("chat completion {m}"))
            })
            .await?;

        json["choices"][0]["message"]["content"]
            .as_str()
            .map(String::from)
            .ok_or_else(|| {
                PipelineError::MalformedResponse("completion lacks choices[0].message.content".into())
            })
    }

    #[instrument(skip(self, texts), fields(n = texts.len()))]
    async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }
        let url = format!("{}/v1/embeddings", self.base_url);
        let body = serde_json::json!({
            "model": &self.embedding_model,
            "input": texts,
        });
        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;
        let json = check_response_status(resp, |m| {
            PipelineError::UpstreamUnavailable(format!("embedding service {m}"))
        })
        .await?;

        let data = json["data"].as_array().ok_or_else(|| {
            PipelineError::MalformedResponse("embedding response lacks data array".into())
        })?;
        let mut out = Vec::with_capacity(data.len());
        for item in data {
            let vec: Vec<f32> = serde_json::from_value(item["embedding"].clone())?;
            out.push(vec);
        }
        Ok(out)
    }
}
