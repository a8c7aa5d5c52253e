//! Chara Gateway: HTTP surface of the character voice-chat orchestrator.
//!
//! Loads `.env`, reads `CHARA_*` configuration, loads the persona
//! catalog, wires the real ASR/LLM/TTS clients into the pipeline and
//! serves the API. The catalog file is required; everything else has
//! defaults for a local stack (Ollama + local ASR/TTS servers).

use chara_core::{
    ChatMemory, ChatPipeline, CoreConfig, HttpAsrClient, HttpTtsClient, OllamaClient,
    PersonaCatalog,
};
use chara_gateway::routes;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("[chara-gateway] .env not loaded: {e} (using system environment)");
    }

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = CoreConfig::from_env();
    let catalog = match PersonaCatalog::load(&config.roles_path) {
        Ok(c) => c,
        Err(e) => {
            tracing::error!(target: "chara::gateway", path = %config.roles_path, error = %e, "persona catalog load failed");
            std::process::exit(1);
        }
    };

    let pipeline = ChatPipeline::new(
        Arc::new(catalog),
        Arc::new(ChatMemory::new()),
        Arc::new(HttpAsrClient::new(config.asr_base_url.clone())),
        Arc::new(OllamaClient::new(&config)),
        Arc::new(HttpTtsClient::new(config.tts_base_url.clone())),
    );

    tracing::info!(
        target: "chara::gateway",
        asr = %config.asr_base_url,
        llm = %config.llm_base_url,
        model = %config.llm_model,
        tts = %config.tts_base_url,
        "upstream services configured"
    );

    let app = routes::app_router(routes::AppState::new(pipeline));

    let listener = match tokio::net::TcpListener::bind(&config.bind_addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!(target: "chara::gateway", addr = %config.bind_addr, error = %e, "bind failed");
            std::process::exit(1);
        }
    };
    tracing::info!(target: "chara::gateway", addr = %config.bind_addr, "gateway listening");

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!(target: "chara::gateway", error = %e, "server exited");
        std::process::exit(1);
    }
}
