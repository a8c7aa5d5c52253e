//! TTS client: asks the speech server for a playable audio URL.
//!
//! `POST {base}/tts_url` with `{text, voice, rate, volume}`; the reply
//! carries `url`, which may be relative to the TTS server itself and
//! is resolved here so the frontend gets an absolute address.

use crate::error::{UpstreamError, UpstreamResult};
use async_trait::async_trait;
use serde_json::json;
use std::time::Duration;

const TTS_TIMEOUT: Duration = Duration::from_secs(15);

/// Backend for speech-synthesis URL resolution. `Ok(None)` is the
/// tolerated "no audio" outcome (missing `url` field); callers also
/// map `Err` to no audio.
#[async_trait]
pub trait TtsBackend: Send + Sync {
    async fn synthesize(
        &self,
        text: &str,
        voice: &str,
        rate: &str,
        volume: &str,
    ) -> UpstreamResult<Option<String>>;
}

/// reqwest-based TTS client.
#[derive(Debug, Clone)]
pub struct HttpTtsClient {
    base_url: String,
    client: reqwest::Client,
}

impl HttpTtsClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(TTS_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            base_url: base_url.into(),
            client,
        }
    }

    /// Absolute URLs pass through; anything else is joined onto the
    /// TTS base address.
    fn resolve_url(&self, url: &str) -> String {
        if url.starts_with("http://") || url.starts_with("https://") {
            return url.to_string();
        }
        let base = self.base_url.trim_end_matches('/');
        if url.starts_with('/') {
            format!("{base}{url}")
        } else {
            format!("{base}/{url}")
        }
    }
}

#[async_trait]
impl TtsBackend for HttpTtsClient {
    async fn synthesize(
        &self,
        text: &str,
        voice: &str,
        rate: &str,
        volume: &str,
    ) -> UpstreamResult<Option<String>> {
        let body = json!({
            "text": text,
            "voice": voice,
            "rate": rate,
            "volume": volume,
        });
        let url = format!("{}/tts_url", self.base_url.trim_end_matches('/'));

        let resp = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await?
            .error_for_status()
            .map_err(|e| UpstreamError::Tts(e.to_string()))?;

        let parsed: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| UpstreamError::Payload(format!("TTS response: {e}")))?;
        let audio = parsed
            .get("url")
            .and_then(|v| v.as_str())
            .map(|u| self.resolve_url(u));
        tracing::debug!(target: "chara::tts", voice, found = audio.is_some(), "tts url resolved");
        Ok(audio)
    }
}
