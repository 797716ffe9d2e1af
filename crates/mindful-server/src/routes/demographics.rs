//! User profile routes.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Map, Value};
use tracing::info;

use super::ApiError;
use crate::state::AppState;
use mindful_core::Error;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/update-demographics", post(update_demographics))
        .route("/get-demographics/{user_id}", get(get_demographics))
}

fn user_id_of(body: &Map<String, Value>) -> Option<String> {
    match body.get("user_id")? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// POST /api/update-demographics. Merges the body's fields into the profile.
async fn update_demographics(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Map<String, Value>>,
) -> Result<Json<Value>, ApiError> {
    let user_id = user_id_of(&body).ok_or_else(|| ApiError::bad_request("No user_id provided"))?;

    let outcome = state.store.upsert_profile(&user_id, &body)?;
    info!("Demographics for {}: {:?}", user_id, outcome);

    Ok(Json(if outcome.changed() {
        json!({ "status": "success", "message": "User demographics updated" })
    } else {
        json!({ "status": "unchanged", "message": "No changes made to user demographics" })
    }))
}

/// GET /api/get-demographics/{user_id}
async fn get_demographics(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let profile = state
        .store
        .get_profile(&user_id)?
        .ok_or_else(|| Error::NotFound("User not found".into()))?;
    Ok(Json(profile.to_document()))
}
