//! Chat routes: grounded chat, standalone emotion analysis, history reset.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};

use super::ApiError;
use crate::state::AppState;
use mindful_protocol::EmotionAssessment;
use mindful_runtime::{ChatRequest, ChatResponsePayload, DEFAULT_SESSION_ID};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/chat", post(chat))
        .route("/analyze-emotion", post(analyze_emotion))
        .route("/clear-history", post(clear_history))
}

#[derive(Debug, Deserialize)]
struct MessageBody {
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct ClearHistoryBody {
    #[serde(default)]
    session_id: Option<String>,
}

/// POST /api/chat
async fn chat(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponsePayload>, ApiError> {
    Ok(Json(state.orchestrator.handle(&req).await?))
}

/// POST /api/analyze-emotion
async fn analyze_emotion(
    State(state): State<Arc<AppState>>,
    Json(body): Json<MessageBody>,
) -> Result<Json<EmotionAssessment>, ApiError> {
    Ok(Json(state.orchestrator.analyze_emotion(&body.message).await?))
}

/// POST /api/clear-history. Succeeds whether or not the session existed.
async fn clear_history(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ClearHistoryBody>,
) -> Json<Value> {
    let session_id = body
        .session_id
        .as_deref()
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_SESSION_ID);

    let message = if state.orchestrator.clear_history(session_id) {
        "Chat history cleared"
    } else {
        "No history found for this session"
    };
    Json(json!({ "status": "success", "message": message }))
}
