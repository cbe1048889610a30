//! Notification routes: creation + fan-out, inbox listing, mark-read.

use axum::extract::{Path, State};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use uuid::Uuid;

use vigia_common::error::AppError;
use vigia_fanout::inbox::{DeliveryRecordWriter, InboxEntry};
use vigia_fanout::notification::{
    CreateNotificationParams, CreatedNotification, NotificationService,
};

use crate::middleware::auth::AuthUser;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/notifications", post(create_notification))
        .route("/api/notifications", get(list_inbox))
        .route(
            "/api/notifications/recipients/{id}/read",
            patch(mark_read),
        )
}

/// POST /api/notifications — Create a notification and fan it out.
async fn create_notification(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(params): Json<CreateNotificationParams>,
) -> Result<Json<CreatedNotification>, AppError> {
    let created =
        NotificationService::create(&state.pool, &state.push, auth.user_id, &params).await?;
    Ok(Json(created))
}

/// GET /api/notifications — List the authenticated recipient's inbox.
async fn list_inbox(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<InboxEntry>>, AppError> {
    let entries = DeliveryRecordWriter::list_for_recipient(&state.pool, auth.user_id).await?;
    Ok(Json(entries))
}

/// PATCH /api/notifications/recipients/:id/read — Mark an inbox row read.
async fn mark_read(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    DeliveryRecordWriter::mark_read(&state.pool, id, auth.user_id).await?;
    Ok(Json(serde_json::json!({"read": true})))
}
