//! Error types for upstream service calls.
//!
//! Upstream errors are tolerated by design: the orchestrator maps every
//! variant to a fallback value (placeholder text, fallback reply, or a
//! null audio URL) instead of failing the chat turn. The enum exists so
//! that call sites log *what* went wrong before degrading.

use thiserror::Error;

/// Result type alias for upstream (ASR/LLM/TTS) calls.
pub type UpstreamResult<T> = Result<T, UpstreamError>;

/// Failure modes of the external collaborators (ASR/LLM/TTS services
/// and the static persona catalog).
#[derive(Error, Debug)]
pub enum UpstreamError {
    #[error("ASR request failed: {0}")]
    Asr(String),

    #[error("LLM request failed: {0}")]
    Llm(String),

    #[error("TTS request failed: {0}")]
    Tts(String),

    #[error("Persona catalog error: {0}")]
    Catalog(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unusable upstream payload: {0}")]
    Payload(String),
}
