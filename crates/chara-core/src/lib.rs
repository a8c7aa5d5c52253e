//! # Chara Core - Character Voice-Chat Orchestration
//!
//! Core of the character chat gateway: resolve a character's persona,
//! keep a bounded per-character conversation history, generate a reply
//! with an Ollama-compatible LLM, strip the reply of Markdown for
//! speech, and fetch a playable audio URL from the TTS server.
//!
//! ```text
//! request ──► persona ──► (ASR?) ──► memory ──► LLM ──► memory
//!                                                 │
//!                        response ◄── TTS ◄── sanitizer
//! ```
//!
//! The three upstream services (ASR, LLM, TTS) are opaque HTTP
//! collaborators behind the [`AsrBackend`], [`LlmBackend`] and
//! [`TtsBackend`] traits. Every upstream failure degrades to a
//! fallback value; only a malformed request can fail a chat turn.

pub mod asr;
pub mod config;
pub mod error;
pub mod llm;
pub mod memory;
pub mod message;
pub mod orchestrator;
pub mod persona;
pub mod sanitize;
pub mod tts;

pub use asr::{AsrBackend, AsrResult, HttpAsrClient};
pub use config::CoreConfig;
pub use error::{UpstreamError, UpstreamResult};
pub use llm::{LlmBackend, OllamaClient};
pub use memory::{ChatMemory, MAX_TURNS};
pub use message::{ChatMessage, Role};
pub use orchestrator::{
    AudioInput, ChatPipeline, ChatTurnRequest, ChatTurnResponse, FALLBACK_REPLY,
    FALLBACK_USER_TEXT,
};
pub use persona::{PersonaCatalog, PersonaRecord, ResolvedPersona, SkillFlags, VoiceParams};
pub use sanitize::markdown_to_plain;
pub use tts::{HttpTtsClient, TtsBackend};
