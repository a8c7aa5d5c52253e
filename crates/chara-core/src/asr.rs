//! Speech-to-text client: uploads recorded audio and returns a
//! best-effort transcript.
//!
//! The ASR server takes a multipart upload on `POST {base}/asr` and
//! answers `{ "text": ..., "lang": ..., "segments": [...] }`. Only
//! `text` is consumed here; the rest is kept for logging and the
//! occasional curl session.

use crate::error::{UpstreamError, UpstreamResult};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

const ASR_TIMEOUT: Duration = Duration::from_secs(30);

/// Transcription result as returned by the ASR server.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AsrResult {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub lang: Option<String>,
    #[serde(default)]
    pub segments: Vec<AsrSegment>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AsrSegment {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

/// Backend for turning raw audio bytes into text. The HTTP impl talks
/// to the ASR server; tests inject a mock.
#[async_trait]
pub trait AsrBackend: Send + Sync {
    /// Transcribe one uploaded clip. Servers may 400 on a missing
    /// filename, so implementations must always send one.
    async fn transcribe(&self, audio: Vec<u8>, filename: &str) -> UpstreamResult<AsrResult>;
}

/// reqwest-based ASR client with a bounded request timeout.
#[derive(Debug, Clone)]
pub struct HttpAsrClient {
    base_url: String,
    client: reqwest::Client,
}

impl HttpAsrClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(ASR_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            base_url: base_url.into(),
            client,
        }
    }
}

#[async_trait]
impl AsrBackend for HttpAsrClient {
    async fn transcribe(&self, audio: Vec<u8>, filename: &str) -> UpstreamResult<AsrResult> {
        let filename = if filename.is_empty() {
            "audio.wav"
        } else {
            filename
        };
        let part = reqwest::multipart::Part::bytes(audio).file_name(filename.to_string());
        let form = reqwest::multipart::Form::new().part("file", part);
        let url = format!("{}/asr", self.base_url.trim_end_matches('/'));

        let resp = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await?
            .error_for_status()
            .map_err(|e| UpstreamError::Asr(e.to_string()))?;

        let result: AsrResult = resp
            .json()
            .await
            .map_err(|e| UpstreamError::Payload(format!("ASR response: {e}")))?;
        tracing::debug!(
            target: "chara::asr",
            chars = result.text.len(),
            lang = result.lang.as_deref().unwrap_or("?"),
            "transcript received"
        );
        Ok(result)
    }
}
