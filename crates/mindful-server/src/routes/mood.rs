//! Mood questionnaire routes.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use super::ApiError;
use crate::state::AppState;
use mindful_runtime::mood::DEFAULT_NUM_QUESTIONS;
use mindful_runtime::{ConversationReply, MoodAnalysis, MoodQuestionnaire, StarterOutcome};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/generate_mood_questions", get(generate_mood_questions))
        .route("/submit_mood_responses", post(submit_mood_responses))
        .route("/start_conversation", post(start_conversation))
}

#[derive(Debug, Deserialize)]
struct QuestionsQuery {
    num_questions: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct ResponsesBody {
    #[serde(default)]
    responses: Value,
}

#[derive(Debug, Deserialize)]
struct StarterBody {
    #[serde(default)]
    mood_analysis: Value,
    #[serde(default)]
    user_message: String,
}

/// GET /api/generate_mood_questions?num_questions=N
async fn generate_mood_questions(
    State(state): State<Arc<AppState>>,
    Query(query): Query<QuestionsQuery>,
) -> Result<Json<MoodQuestionnaire>, ApiError> {
    let n = query.num_questions.unwrap_or(DEFAULT_NUM_QUESTIONS);
    Ok(Json(state.mood.generate_questionnaire(n).await?))
}

/// POST /api/submit_mood_responses
async fn submit_mood_responses(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ResponsesBody>,
) -> Result<Json<MoodAnalysis>, ApiError> {
    Ok(Json(state.mood.analyze_responses(&body.responses).await?))
}

/// POST /api/start_conversation
async fn start_conversation(
    State(state): State<Arc<AppState>>,
    Json(body): Json<StarterBody>,
) -> Result<Json<ConversationReply>, ApiError> {
    match state
        .mood
        .start_conversation(&body.mood_analysis, &body.user_message)
        .await?
    {
        StarterOutcome::Reply(reply) => Ok(Json(reply)),
        StarterOutcome::NoJson => {
            warn!("Conversation starter reply had no JSON");
            Err(ApiError::internal("Failed to generate valid response"))
        }
        StarterOutcome::InvalidJson(reason) => {
            warn!("Conversation starter JSON invalid: {}", reason);
            Err(ApiError::internal("Failed to parse response JSON"))
        }
    }
}
