//! Duty lookup endpoint.

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::Json;
use chrono::NaiveDate;
use serde::Deserialize;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::db::SqliteSchedule;
use crate::duty::{find_on_duty, DutyMatch};

#[derive(Deserialize)]
pub struct DutyQuery {
    pub date: NaiveDate,
    pub time: String,
}

/// `GET /api/duty?date=2025-06-07&time=11:10 AM`: 404 when nobody covers the slot.
pub async fn on_duty(
    State(ctx): State<ApiContext>,
    query: Result<Query<DutyQuery>, QueryRejection>,
) -> Result<Json<DutyMatch>, ApiError> {
    let Query(query) = query?;
    let conn = ctx.core.open_db()?;

    find_on_duty(&SqliteSchedule::new(&conn), query.date, &query.time)?
        .map(Json)
        .ok_or_else(|| {
            ApiError::NotFound(format!(
                "No technician on duty for {} at {}",
                query.date, query.time
            ))
        })
}
