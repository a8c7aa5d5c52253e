//! LLM client: multi-turn chat against an Ollama-compatible server.
//!
//! `POST {base}/api/chat` with `stream: false`; the system prompt is
//! prepended as the first message on every call and is never stored in
//! conversation memory.

use crate::config::CoreConfig;
use crate::error::{UpstreamError, UpstreamResult};
use crate::message::ChatMessage;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;

const LLM_TIMEOUT: Duration = Duration::from_secs(60);

/// Backend for history-aware text generation. The orchestrator treats
/// an `Err` or an empty completion identically (fallback reply).
#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// Generate a completion for the ordered history, with
    /// `system_prompt` prepended as the system message.
    async fn chat(&self, system_prompt: &str, messages: &[ChatMessage]) -> UpstreamResult<String>;
}

#[derive(Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct OllamaChatResponse {
    #[serde(default)]
    message: Option<OllamaMessage>,
}

#[derive(Deserialize)]
struct OllamaMessage {
    #[serde(default)]
    content: String,
}

/// Ollama chat client with model and sampling options from config.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    base_url: String,
    model: String,
    temperature: f64,
    max_tokens: u32,
    num_ctx: u32,
    client: reqwest::Client,
}

impl OllamaClient {
    pub fn new(cfg: &CoreConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(LLM_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            base_url: cfg.llm_base_url.clone(),
            model: cfg.llm_model.clone(),
            temperature: cfg.llm_temperature,
            max_tokens: cfg.llm_max_tokens,
            num_ctx: cfg.llm_num_ctx,
            client,
        }
    }
}

#[async_trait]
impl LlmBackend for OllamaClient {
    async fn chat(&self, system_prompt: &str, messages: &[ChatMessage]) -> UpstreamResult<String> {
        let mut wire: Vec<WireMessage<'_>> = Vec::with_capacity(messages.len() + 1);
        wire.push(WireMessage {
            role: "system",
            content: system_prompt,
        });
        for m in messages {
            wire.push(WireMessage {
                role: m.role.as_str(),
                content: &m.content,
            });
        }

        let body = json!({
            "model": self.model,
            "stream": false,
            "options": {
                "temperature": self.temperature,
                "num_predict": self.max_tokens,
                "num_ctx": self.num_ctx,
            },
            "messages": wire,
        });
        let url = format!("{}/api/chat", self.base_url.trim_end_matches('/'));

        let resp = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await?
            .error_for_status()
            .map_err(|e| UpstreamError::Llm(e.to_string()))?;

        let parsed: OllamaChatResponse = resp
            .json()
            .await
            .map_err(|e| UpstreamError::Payload(format!("LLM response: {e}")))?;
        let reply = parsed
            .message
            .map(|m| m.content.trim().to_string())
            .unwrap_or_default();
        tracing::debug!(target: "chara::llm", model = %self.model, chars = reply.len(), "completion received");
        Ok(reply)
    }
}
