//! Panic button route.

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};

use vigia_common::error::AppError;
use vigia_fanout::escalation::EscalationService;

use crate::middleware::auth::AuthUser;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/panic", post(trigger_panic))
}

/// POST /api/panic — Escalate a panic for the authenticated user.
///
/// `message` is null when the user's community has no panic contacts
/// configured (silent no-op).
async fn trigger_panic(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<serde_json::Value>, AppError> {
    let message = EscalationService::panic(&state.pool, &state.push, auth.user_id).await?;
    Ok(Json(serde_json::json!({ "message": message })))
}
