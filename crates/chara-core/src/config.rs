//! Core configuration loaded from environment (`.env` via the gateway).
//!
//! | Env | Default | Description |
//! |-----|---------|-------------|
//! | CHARA_ASR_BASE_URL | http://127.0.0.1:9000 | ASR service base URL |
//! | CHARA_LLM_BASE_URL | http://127.0.0.1:11434 | Ollama-compatible LLM base URL |
//! | CHARA_LLM_MODEL | llama3.1:8b | Chat model name |
//! | CHARA_LLM_TEMPERATURE | 0.6 | Sampling temperature |
//! | CHARA_LLM_MAX_TOKENS | 512 | Completion token cap (num_predict) |
//! | CHARA_LLM_NUM_CTX | 8192 | Context window hint |
//! | CHARA_TTS_BASE_URL | http://127.0.0.1:5002 | TTS service base URL |
//! | CHARA_ROLES_PATH | roles.json | Persona catalog file |
//! | CHARA_BIND_ADDR | 0.0.0.0:8080 | Gateway listen address |

/// Runtime configuration for the core and gateway. `from_env` never
/// fails: missing or unparsable values fall back to defaults.
#[derive(Debug, Clone)]
pub struct CoreConfig {
    pub asr_base_url: String,
    pub llm_base_url: String,
    pub llm_model: String,
    pub llm_temperature: f64,
    pub llm_max_tokens: u32,
    pub llm_num_ctx: u32,
    pub tts_base_url: String,
    pub roles_path: String,
    pub bind_addr: String,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            asr_base_url: "http://127.0.0.1:9000".to_string(),
            llm_base_url: "http://127.0.0.1:11434".to_string(),
            llm_model: "llama3.1:8b".to_string(),
            llm_temperature: 0.6,
            llm_max_tokens: 512,
            llm_num_ctx: 8192,
            tts_base_url: "http://127.0.0.1:5002".to_string(),
            roles_path: "roles.json".to_string(),
            bind_addr: "0.0.0.0:8080".to_string(),
        }
    }
}

impl CoreConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            asr_base_url: env_or("CHARA_ASR_BASE_URL", defaults.asr_base_url),
            llm_base_url: env_or("CHARA_LLM_BASE_URL", defaults.llm_base_url),
            llm_model: env_or("CHARA_LLM_MODEL", defaults.llm_model),
            llm_temperature: env_parsed("CHARA_LLM_TEMPERATURE", defaults.llm_temperature),
            llm_max_tokens: env_parsed("CHARA_LLM_MAX_TOKENS", defaults.llm_max_tokens),
            llm_num_ctx: env_parsed("CHARA_LLM_NUM_CTX", defaults.llm_num_ctx),
            tts_base_url: env_or("CHARA_TTS_BASE_URL", defaults.tts_base_url),
            roles_path: env_or("CHARA_ROLES_PATH", defaults.roles_path),
            bind_addr: env_or("CHARA_BIND_ADDR", defaults.bind_addr),
        }
    }
}

fn env_or(key: &str, default: String) -> String {
    match std::env::var(key) {
        Ok(v) if !v.trim().is_empty() => v.trim().to_string(),
        _ => default,
    }
}

fn env_parsed<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}
