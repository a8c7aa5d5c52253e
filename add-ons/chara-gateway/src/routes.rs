//! Route handlers for the chara gateway.
//!
//! # Routes
//!
//! - `POST   /api/character/:id/chat`         — one chat turn (multipart: `user_audio`, `text`, `ttsVoice`, `ttsRate`, `ttsVolume`)
//! - `DELETE /api/character/:id/chat/history` — drop the character's conversation memory
//! - `GET    /api/role`                       — full persona catalog
//! - `GET    /api/role/:id`                   — one persona record
//! - `GET    /health`                         — liveness probe
//!
//! Upstream ASR/LLM/TTS failures never surface here; the pipeline
//! degrades them internally. The only 4xx on the chat route is a
//! malformed or non-multipart request body.

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
    Json, Router,
};
use chara_core::{AudioInput, ChatPipeline, ChatTurnRequest};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Shared state: the one pipeline instance behind every route.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<ChatPipeline>,
}

impl AppState {
    pub fn new(pipeline: ChatPipeline) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
        }
    }
}

pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/api/character/:id/chat", post(chat))
        .route("/api/character/:id/chat/history", delete(clear_history))
        .route("/api/role", get(list_roles))
        .route("/api/role/:id", get(get_role))
        .route("/health", get(health))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "chara-gateway",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// POST /api/character/:id/chat — run one chat turn.
async fn chat(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    mut multipart: Multipart,
) -> Result<Json<chara_core::ChatTurnResponse>, (StatusCode, Json<Value>)> {
    let mut request = ChatTurnRequest {
        character_id: id,
        ..Default::default()
    };

    while let Some(field) = multipart.next_field().await.map_err(bad_request)? {
        match field.name().unwrap_or_default() {
            "user_audio" => {
                let filename = field
                    .file_name()
                    .filter(|f| !f.is_empty())
                    .unwrap_or("audio.wav")
                    .to_string();
                let bytes = field.bytes().await.map_err(bad_request)?;
                request.audio = Some(AudioInput {
                    bytes: bytes.to_vec(),
                    filename,
                });
            }
            "text" => request.text = Some(field.text().await.map_err(bad_request)?),
            "ttsVoice" => request.voice_override = Some(field.text().await.map_err(bad_request)?),
            "ttsRate" => request.rate_override = Some(field.text().await.map_err(bad_request)?),
            "ttsVolume" => {
                request.volume_override = Some(field.text().await.map_err(bad_request)?)
            }
            other => {
                tracing::debug!(target: "chara::gateway", field = other, "ignoring unknown form field");
            }
        }
    }

    Ok(Json(state.pipeline.chat(request).await))
}

/// DELETE /api/character/:id/chat/history
async fn clear_history(State(state): State<AppState>, Path(id): Path<i64>) -> impl IntoResponse {
    state.pipeline.clear_history(id);
    Json(json!({ "cleared": true, "characterId": id }))
}

/// GET /api/role — the whole catalog, as loaded at startup.
async fn list_roles(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.pipeline.catalog().all().to_vec())
}

/// GET /api/role/:id
async fn get_role(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<chara_core::PersonaRecord>, (StatusCode, Json<Value>)> {
    state
        .pipeline
        .catalog()
        .find(id)
        .cloned()
        .map(Json)
        .ok_or_else(|| {
            (
                StatusCode::NOT_FOUND,
                Json(json!({ "error": format!("no role with id {id}") })),
            )
        })
}

fn bad_request(e: axum::extract::multipart::MultipartError) -> (StatusCode, Json<Value>) {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "error": format!("malformed request body: {e}") })),
    )
}
