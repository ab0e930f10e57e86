//! Notification alert endpoints: the admin queue of failed result deliveries.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::db;
use crate::models::NotificationAlert;

/// `GET /api/alerts/notifications`
pub async fn notifications(
    State(ctx): State<ApiContext>,
) -> Result<Json<Vec<NotificationAlert>>, ApiError> {
    let conn = ctx.core.open_db()?;
    Ok(Json(db::list_unresolved_notification_alerts(&conn)?))
}

/// `POST /api/alerts/notifications/:id/resolve`
pub async fn resolve(
    State(ctx): State<ApiContext>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let conn = ctx.core.open_db()?;
    db::resolve_notification_alert(&conn, &id)?;
    tracing::info!(alert_id = %id, "Notification alert resolved");
    Ok(StatusCode::NO_CONTENT)
}
