//! End-to-end pipeline tests with mock ASR/LLM/TTS backends.

use async_trait::async_trait;
use chara_core::{
    AsrBackend, AsrResult, ChatMemory, ChatPipeline, ChatTurnRequest, LlmBackend, PersonaCatalog,
    TtsBackend, UpstreamError, UpstreamResult, AudioInput, ChatMessage, FALLBACK_REPLY,
    FALLBACK_USER_TEXT,
};
use std::sync::Arc;

struct MockAsr {
    transcript: Option<String>,
}

#[async_trait]
impl AsrBackend for MockAsr {
    async fn transcribe(&self, _audio: Vec<u8>, _filename: &str) -> UpstreamResult<AsrResult> {
        match &self.transcript {
            Some(t) => Ok(AsrResult {
                text: t.clone(),
                ..Default::default()
            }),
            None => Err(UpstreamError::Asr("connection refused".into())),
        }
    }
}

struct MockLlm {
    reply: Option<String>,
}

#[async_trait]
impl LlmBackend for MockLlm {
    async fn chat(
        &self,
        _system_prompt: &str,
        _messages: &[ChatMessage],
    ) -> UpstreamResult<String> {
        match &self.reply {
            Some(r) => Ok(r.clone()),
            None => Err(UpstreamError::Llm("model not loaded".into())),
        }
    }
}

struct MockTts {
    url: Option<String>,
    fail: bool,
}

#[async_trait]
impl TtsBackend for MockTts {
    async fn synthesize(
        &self,
        _text: &str,
        _voice: &str,
        _rate: &str,
        _volume: &str,
    ) -> UpstreamResult<Option<String>> {
        if self.fail {
            return Err(UpstreamError::Tts("timeout".into()));
        }
        Ok(self.url.clone())
    }
}

fn pipeline(asr: MockAsr, llm: MockLlm, tts: MockTts) -> ChatPipeline {
    let catalog = PersonaCatalog::from_json(
        r#"[{"id": 1, "name": "Sage", "systemPrompt": "You are the Sage.",
             "voice": "en-GB-RyanNeural", "rate": "-5%", "volume": "+10%"}]"#,
    )
    .unwrap();
    ChatPipeline::new(
        Arc::new(catalog),
        Arc::new(ChatMemory::new()),
        Arc::new(asr),
        Arc::new(llm),
        Arc::new(tts),
    )
}

fn text_request(id: i64, text: &str) -> ChatTurnRequest {
    ChatTurnRequest {
        character_id: id,
        text: Some(text.to_string()),
        ..Default::default()
    }
}

// Scenario A: text for an unknown character, LLM down.
#[tokio::test]
async fn unknown_character_with_failing_llm_degrades_to_fallback_reply() {
    let p = pipeline(
        MockAsr { transcript: None },
        MockLlm { reply: None },
        MockTts {
            url: None,
            fail: true,
        },
    );
    let resp = p.chat(text_request(999, "hello")).await;
    assert!(!resp.asr_used);
    assert_eq!(resp.user_text, "hello");
    assert_eq!(resp.voice, chara_core::persona::DEFAULT_VOICE);
    assert_eq!(resp.reply_text, FALLBACK_REPLY);
    assert_eq!(resp.audio_url, None);
}

// Scenario B: audio only, empty transcript.
#[tokio::test]
async fn empty_transcript_falls_back_to_placeholder_user_text() {
    let p = pipeline(
        MockAsr {
            transcript: Some("   ".to_string()),
        },
        MockLlm {
            reply: Some("Sure.".to_string()),
        },
        MockTts {
            url: None,
            fail: false,
        },
    );
    let resp = p
        .chat(ChatTurnRequest {
            character_id: 1,
            audio: Some(AudioInput {
                bytes: vec![1, 2, 3],
                filename: "clip.wav".into(),
            }),
            ..Default::default()
        })
        .await;
    assert!(resp.asr_used);
    assert_eq!(resp.user_text, FALLBACK_USER_TEXT);
    assert_eq!(resp.reply_text, "Sure.");
}

// Scenario C is covered by HttpTtsClient::resolve_url unit tests; here:
// a mock TTS URL flows through untouched.
#[tokio::test]
async fn tts_url_is_returned_with_the_reply() {
    let p = pipeline(
        MockAsr { transcript: None },
        MockLlm {
            reply: Some("**Hello** there".to_string()),
        },
        MockTts {
            url: Some("http://127.0.0.1:5002/audio/1.mp3".to_string()),
            fail: false,
        },
    );
    let resp = p.chat(text_request(1, "hi")).await;
    assert_eq!(
        resp.audio_url.as_deref(),
        Some("http://127.0.0.1:5002/audio/1.mp3")
    );
    // Markdown stays in the reply shown to the user.
    assert_eq!(resp.reply_text, "**Hello** there");
    assert_eq!(resp.voice, "en-GB-RyanNeural");
}

#[tokio::test]
async fn asr_failure_is_swallowed() {
    let p = pipeline(
        MockAsr { transcript: None },
        MockLlm {
            reply: Some("ok".to_string()),
        },
        MockTts {
            url: None,
            fail: false,
        },
    );
    let resp = p
        .chat(ChatTurnRequest {
            character_id: 1,
            audio: Some(AudioInput {
                bytes: vec![9],
                filename: "a.wav".into(),
            }),
            ..Default::default()
        })
        .await;
    assert!(resp.asr_used);
    assert_eq!(resp.user_text, FALLBACK_USER_TEXT);
    assert_eq!(resp.reply_text, "ok");
}

#[tokio::test]
async fn empty_audio_does_not_count_as_asr() {
    let p = pipeline(
        MockAsr {
            transcript: Some("ignored".to_string()),
        },
        MockLlm {
            reply: Some("ok".to_string()),
        },
        MockTts {
            url: None,
            fail: false,
        },
    );
    let resp = p
        .chat(ChatTurnRequest {
            character_id: 1,
            audio: Some(AudioInput {
                bytes: Vec::new(),
                filename: "empty.wav".into(),
            }),
            ..Default::default()
        })
        .await;
    assert!(!resp.asr_used);
    assert_eq!(resp.user_text, FALLBACK_USER_TEXT);
}

#[tokio::test]
async fn raw_text_wins_over_audio_for_user_text() {
    let p = pipeline(
        MockAsr {
            transcript: Some("from audio".to_string()),
        },
        MockLlm {
            reply: Some("ok".to_string()),
        },
        MockTts {
            url: None,
            fail: false,
        },
    );
    let resp = p
        .chat(ChatTurnRequest {
            character_id: 1,
            text: Some("  typed  ".to_string()),
            audio: Some(AudioInput {
                bytes: vec![1],
                filename: "a.wav".into(),
            }),
            ..Default::default()
        })
        .await;
    assert_eq!(resp.user_text, "typed");
    assert!(resp.asr_used);
}

#[tokio::test]
async fn both_turns_land_in_memory_in_order() {
    let memory = Arc::new(ChatMemory::new());
    let p = ChatPipeline::new(
        Arc::new(PersonaCatalog::from_records(Vec::new())),
        Arc::clone(&memory),
        Arc::new(MockAsr { transcript: None }),
        Arc::new(MockLlm {
            reply: Some("reply one".to_string()),
        }),
        Arc::new(MockTts {
            url: None,
            fail: false,
        }),
    );
    p.chat(text_request(4, "question one")).await;
    let history = memory.history(4);
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].content, "question one");
    assert_eq!(history[1].content, "reply one");
}

#[tokio::test]
async fn voice_overrides_apply_per_call() {
    let p = pipeline(
        MockAsr { transcript: None },
        MockLlm {
            reply: Some("ok".to_string()),
        },
        MockTts {
            url: None,
            fail: false,
        },
    );
    let resp = p
        .chat(ChatTurnRequest {
            character_id: 1,
            text: Some("hi".to_string()),
            voice_override: Some("en-US-AnaNeural".to_string()),
            rate_override: Some("  ".to_string()),
            ..Default::default()
        })
        .await;
    assert_eq!(resp.voice, "en-US-AnaNeural");
    assert_eq!(resp.rate, "-5%"); // blank override ignored

    // Next call without overrides sees the persona defaults again.
    let resp = p.chat(text_request(1, "hi again")).await;
    assert_eq!(resp.voice, "en-GB-RyanNeural");
}

#[tokio::test]
async fn clear_history_empties_the_character() {
    let memory = Arc::new(ChatMemory::new());
    let p = ChatPipeline::new(
        Arc::new(PersonaCatalog::from_records(Vec::new())),
        Arc::clone(&memory),
        Arc::new(MockAsr { transcript: None }),
        Arc::new(MockLlm {
            reply: Some("ok".to_string()),
        }),
        Arc::new(MockTts {
            url: None,
            fail: false,
        }),
    );
    p.chat(text_request(8, "hi")).await;
    assert_eq!(memory.len(8), 2);
    p.clear_history(8);
    assert!(memory.history(8).is_empty());
}

// Concurrent same-character turns race, but no turn is lost and the
// bound holds.
#[tokio::test]
async fn concurrent_turns_keep_memory_consistent() {
    let memory = Arc::new(ChatMemory::new());
    let p = Arc::new(ChatPipeline::new(
        Arc::new(PersonaCatalog::from_records(Vec::new())),
        Arc::clone(&memory),
        Arc::new(MockAsr { transcript: None }),
        Arc::new(MockLlm {
            reply: Some("ok".to_string()),
        }),
        Arc::new(MockTts {
            url: None,
            fail: false,
        }),
    ));
    let mut handles = Vec::new();
    for i in 0..8 {
        let p = Arc::clone(&p);
        handles.push(tokio::spawn(async move {
            p.chat(ChatTurnRequest {
                character_id: 5,
                text: Some(format!("msg {i}")),
                ..Default::default()
            })
            .await;
        }));
    }
    for h in handles {
        h.await.unwrap();
    }
    // 8 turns * 2 messages, under the 21-message cap: all present.
    assert_eq!(memory.len(5), 16);
}
