//! Technician roster and schedule override endpoints.

use axum::extract::rejection::JsonRejection;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::db;
use crate::models::enums::TimeSlot;
use crate::models::{ScheduleOverride, Technician, WeeklyShift};

#[derive(Deserialize)]
pub struct ShiftEntry {
    pub weekday: Weekday,
    pub slot: TimeSlot,
}

#[derive(Deserialize)]
pub struct NewTechnician {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub shifts: Vec<ShiftEntry>,
}

#[derive(Serialize)]
pub struct TechnicianResponse {
    pub technician: Technician,
    pub shifts: Vec<WeeklyShift>,
}

/// `POST /api/technicians`: technician plus weekly shifts, written together.
pub async fn create(
    State(ctx): State<ApiContext>,
    payload: Result<Json<NewTechnician>, JsonRejection>,
) -> Result<(StatusCode, Json<TechnicianResponse>), ApiError> {
    let Json(new) = payload?;
    if new.name.trim().is_empty() {
        return Err(ApiError::BadRequest("Technician name is required".into()));
    }

    let technician = Technician {
        id: Uuid::new_v4(),
        name: new.name.trim().to_string(),
        email: new.email,
        active: true,
    };
    let shifts: Vec<WeeklyShift> = new
        .shifts
        .iter()
        .map(|s| WeeklyShift {
            id: Uuid::new_v4(),
            technician_id: technician.id,
            weekday: s.weekday,
            slot: s.slot,
            active: true,
        })
        .collect();

    let conn = ctx.core.open_db()?;
    let tx = conn.unchecked_transaction()?;
    db::insert_technician(&tx, &technician)?;
    for shift in &shifts {
        db::insert_weekly_shift(&tx, shift)?;
    }
    tx.commit()?;

    tracing::info!(technician_id = %technician.id, shifts = shifts.len(), "Technician added");
    Ok((StatusCode::CREATED, Json(TechnicianResponse { technician, shifts })))
}

/// `GET /api/technicians/:id`: technician with their weekly shifts.
pub async fn detail(
    State(ctx): State<ApiContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<TechnicianResponse>, ApiError> {
    let conn = ctx.core.open_db()?;
    let technician = db::get_technician(&conn, &id)?
        .ok_or_else(|| ApiError::NotFound(format!("Technician not found: {id}")))?;
    let shifts = db::get_weekly_shifts(&conn, &id)?;
    Ok(Json(TechnicianResponse { technician, shifts }))
}

#[derive(Deserialize)]
pub struct OverrideQuery {
    pub date: NaiveDate,
}

/// `GET /api/schedule-overrides?date=`
pub async fn list_overrides(
    State(ctx): State<ApiContext>,
    query: Result<Query<OverrideQuery>, QueryRejection>,
) -> Result<Json<Vec<ScheduleOverride>>, ApiError> {
    let Query(q) = query?;
    let conn = ctx.core.open_db()?;
    Ok(Json(db::get_schedule_overrides(&conn, q.date)?))
}

#[derive(Deserialize)]
pub struct NewOverride {
    pub date: NaiveDate,
    pub slot: TimeSlot,
    pub technician_id: Uuid,
    #[serde(default)]
    pub note: Option<String>,
}

/// `POST /api/schedule-overrides`: one-off coverage for a single date and slot.
pub async fn create_override(
    State(ctx): State<ApiContext>,
    payload: Result<Json<NewOverride>, JsonRejection>,
) -> Result<(StatusCode, Json<ScheduleOverride>), ApiError> {
    let Json(new) = payload?;
    let conn = ctx.core.open_db()?;
    if db::get_technician(&conn, &new.technician_id)?.is_none() {
        return Err(ApiError::NotFound(format!(
            "Technician not found: {}",
            new.technician_id
        )));
    }

    let entry = ScheduleOverride {
        id: Uuid::new_v4(),
        date: new.date,
        slot: new.slot,
        technician_id: new.technician_id,
        note: new.note,
        created_at: db::now(),
    };
    db::insert_schedule_override(&conn, &entry)?;

    tracing::info!(
        date = %entry.date,
        slot = entry.slot.as_str(),
        technician_id = %entry.technician_id,
        "Schedule override recorded"
    );
    Ok((StatusCode::CREATED, Json(entry)))
}
