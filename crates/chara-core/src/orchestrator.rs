//! The chat pipeline: one request/response cycle per character turn.
//!
//! Sequencing per turn: resolve persona, pick the user text (raw text
//! first, then ASR, then a placeholder), append the user turn, call
//! the LLM with the post-append history, append the assistant turn,
//! sanitize for speech, and fetch a TTS URL.
//!
//! Degradation contract: a failing or empty ASR transcript, LLM
//! completion, or TTS lookup never fails the turn. ASR falls back to
//! the placeholder text, the LLM to a fixed apology, TTS to a null
//! audio URL. Only a malformed request can produce an error, and that
//! is the gateway's concern.

use crate::asr::AsrBackend;
use crate::llm::LlmBackend;
use crate::memory::ChatMemory;
use crate::message::ChatMessage;
use crate::persona::PersonaCatalog;
use crate::sanitize::markdown_to_plain;
use crate::tts::TtsBackend;
use serde::Serialize;
use std::sync::Arc;

/// Stored as the user turn when neither text nor a usable transcript
/// is available.
pub const FALLBACK_USER_TEXT: &str = "(no recognizable input)";
/// Reply used when the LLM fails or returns an empty completion.
pub const FALLBACK_REPLY: &str = "I didn't quite catch that. Could you say it again?";

/// Uploaded audio clip: raw bytes plus the client-supplied filename.
#[derive(Debug, Clone)]
pub struct AudioInput {
    pub bytes: Vec<u8>,
    pub filename: String,
}

/// One inbound chat turn. Either `text` or `audio` is expected to be
/// meaningful; overrides adjust TTS parameters for this call only.
#[derive(Debug, Clone, Default)]
pub struct ChatTurnRequest {
    pub character_id: i64,
    pub text: Option<String>,
    pub audio: Option<AudioInput>,
    pub voice_override: Option<String>,
    pub rate_override: Option<String>,
    pub volume_override: Option<String>,
}

/// Composed result of one chat turn. `reply_text` keeps its Markdown
/// for frontend rendering; the TTS copy was sanitized before synthesis.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatTurnResponse {
    pub character_id: i64,
    pub user_text: String,
    pub reply_text: String,
    pub audio_url: Option<String>,
    pub asr_used: bool,
    pub voice: String,
    pub rate: String,
    pub volume: String,
}

/// Composes persona resolution, conversation memory, and the three
/// upstream clients into the chat use case.
pub struct ChatPipeline {
    catalog: Arc<PersonaCatalog>,
    memory: Arc<ChatMemory>,
    asr: Arc<dyn AsrBackend>,
    llm: Arc<dyn LlmBackend>,
    tts: Arc<dyn TtsBackend>,
}

impl ChatPipeline {
    pub fn new(
        catalog: Arc<PersonaCatalog>,
        memory: Arc<ChatMemory>,
        asr: Arc<dyn AsrBackend>,
        llm: Arc<dyn LlmBackend>,
        tts: Arc<dyn TtsBackend>,
    ) -> Self {
        Self {
            catalog,
            memory,
            asr,
            llm,
            tts,
        }
    }

    pub fn catalog(&self) -> &PersonaCatalog {
        &self.catalog
    }

    /// Runs one full chat turn. Infallible by contract; every upstream
    /// failure degrades to a fallback value.
    pub async fn chat(&self, request: ChatTurnRequest) -> ChatTurnResponse {
        let character_id = request.character_id;

        // Persona and effective voice parameters for this call.
        let persona = self.catalog.resolve(character_id);
        let system_prompt = persona.effective_system_prompt();
        let params = persona.voice_params().apply_overrides(
            request.voice_override.as_deref(),
            request.rate_override.as_deref(),
            request.volume_override.as_deref(),
        );

        // User text: raw text wins, then the transcript, then the placeholder.
        let audio = request.audio.filter(|a| !a.bytes.is_empty());
        let asr_used = audio.is_some();
        let mut user_text = request
            .text
            .as_deref()
            .map(str::trim)
            .unwrap_or_default()
            .to_string();
        if user_text.is_empty() {
            if let Some(clip) = audio {
                match self.asr.transcribe(clip.bytes, &clip.filename).await {
                    Ok(result) => user_text = result.text.trim().to_string(),
                    Err(e) => {
                        tracing::warn!(target: "chara::pipeline", character_id, error = %e, "ASR failed, continuing without transcript");
                    }
                }
            }
        }
        if user_text.is_empty() {
            user_text = FALLBACK_USER_TEXT.to_string();
        }

        // Record the user turn, then generate over the post-append
        // history so the new turn is part of the context.
        self.memory
            .append(character_id, ChatMessage::user(user_text.clone()));
        let history = self.memory.history(character_id);

        let reply_text = match self.llm.chat(&system_prompt, &history).await {
            Ok(reply) if !reply.trim().is_empty() => reply,
            Ok(_) => {
                tracing::warn!(target: "chara::pipeline", character_id, "LLM returned an empty completion");
                FALLBACK_REPLY.to_string()
            }
            Err(e) => {
                tracing::warn!(target: "chara::pipeline", character_id, error = %e, "LLM failed, using fallback reply");
                FALLBACK_REPLY.to_string()
            }
        };
        self.memory
            .append(character_id, ChatMessage::assistant(reply_text.clone()));

        // Speech: sanitize the Markdown away, then best-effort TTS.
        let speech_text = markdown_to_plain(&reply_text);
        let audio_url = match self
            .tts
            .synthesize(&speech_text, &params.voice, &params.rate, &params.volume)
            .await
        {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!(target: "chara::pipeline", character_id, error = %e, "TTS failed, returning reply without audio");
                None
            }
        };

        ChatTurnResponse {
            character_id,
            user_text,
            reply_text,
            audio_url,
            asr_used,
            voice: params.voice,
            rate: params.rate,
            volume: params.volume,
        }
    }

    /// Clears the character's history. Always succeeds.
    pub fn clear_history(&self, character_id: i64) {
        self.memory.clear(character_id);
        tracing::info!(target: "chara::pipeline", character_id, "history cleared");
    }
}
