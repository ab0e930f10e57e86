//! Client and medication endpoints.
//!
//! - `POST /api/clients`: register a client, optionally with a referral contact
//! - `POST /api/clients/:id/medications`: add a medication
//! - `GET /api/clients/:id/medications`: list medications

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::db;
use crate::models::enums::MedicationStatus;
use crate::models::{Client, Medication, ReferralContact};
use crate::screening::normalize_codes;

#[derive(Deserialize)]
pub struct NewClient {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub referral: Option<ReferralContact>,
}

pub async fn create(
    State(ctx): State<ApiContext>,
    payload: Result<Json<NewClient>, JsonRejection>,
) -> Result<(StatusCode, Json<Client>), ApiError> {
    let Json(new) = payload?;
    let name = new.name.trim();
    if name.is_empty() {
        return Err(ApiError::BadRequest("Client name is required".into()));
    }

    let client = Client {
        id: Uuid::new_v4(),
        name: name.to_string(),
        email: new.email.map(|e| e.trim().to_string()).filter(|e| !e.is_empty()),
        referral: new.referral,
    };
    let conn = ctx.core.open_db()?;
    db::insert_client(&conn, &client)?;

    tracing::info!(client_id = %client.id, "Client registered");
    Ok((StatusCode::CREATED, Json(client)))
}

#[derive(Deserialize)]
pub struct NewMedication {
    pub name: String,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub status: Option<MedicationStatus>,
    #[serde(default)]
    pub detected_as: Vec<String>,
    #[serde(default)]
    pub require_confirmation: bool,
}

pub async fn add_medication(
    State(ctx): State<ApiContext>,
    Path(client_id): Path<Uuid>,
    payload: Result<Json<NewMedication>, JsonRejection>,
) -> Result<(StatusCode, Json<Medication>), ApiError> {
    let Json(new) = payload?;
    if new.name.trim().is_empty() {
        return Err(ApiError::BadRequest("Medication name is required".into()));
    }
    if new.end_date.is_some_and(|end| end < new.start_date) {
        return Err(ApiError::BadRequest("end_date is before start_date".into()));
    }

    let conn = ctx.core.open_db()?;
    require_client(&conn, &client_id)?;

    let med = Medication {
        id: Uuid::new_v4(),
        client_id,
        name: new.name.trim().to_string(),
        start_date: new.start_date,
        end_date: new.end_date,
        status: new.status.unwrap_or(MedicationStatus::Active),
        detected_as: normalize_codes(&new.detected_as).into_iter().collect(),
        require_confirmation: new.require_confirmation,
    };
    db::insert_medication(&conn, &med)?;
    Ok((StatusCode::CREATED, Json(med)))
}

pub async fn medications(
    State(ctx): State<ApiContext>,
    Path(client_id): Path<Uuid>,
) -> Result<Json<Vec<Medication>>, ApiError> {
    let conn = ctx.core.open_db()?;
    require_client(&conn, &client_id)?;
    Ok(Json(db::get_client_medications(&conn, &client_id)?))
}

fn require_client(conn: &rusqlite::Connection, id: &Uuid) -> Result<Client, ApiError> {
    db::get_client(conn, id)?.ok_or_else(|| ApiError::NotFound(format!("Client not found: {id}")))
}
