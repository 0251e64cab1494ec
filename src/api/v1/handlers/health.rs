/*
 * Responsibility
 * - GET /healthz (疎通用, pipeline を通さない)
 * - policy store が load 済みかどうかも返す
 */
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde_json::json;

use crate::state::AppState;

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let rules = state.policies.snapshot().map(|s| s.len()).unwrap_or(0);
    (
        StatusCode::OK,
        Json(json!({
            "status": "ok",
            "policies_loaded": state.policies.is_loaded(),
            "rules": rules,
        })),
    )
}
