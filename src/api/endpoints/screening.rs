//! Pure screening endpoints: classify a screen, resolve lab verdicts.
//!
//! Nothing is persisted here; the drug-test endpoints drive the stored workflow.

use std::collections::BTreeMap;

use axum::extract::rejection::JsonRejection;
use axum::Json;
use serde::Deserialize;

use crate::api::error::ApiError;
use crate::screening::{
    classify, normalize_code, resolve_confirmation, ClassificationOutcome, LabVerdict, Resolution,
    ScreeningInput,
};

/// `POST /api/screening/classify`
pub async fn classify_screen(
    payload: Result<Json<ScreeningInput>, JsonRejection>,
) -> Result<Json<ClassificationOutcome>, ApiError> {
    let Json(input) = payload?;
    Ok(Json(classify(&input)))
}

#[derive(Deserialize)]
pub struct ResolveRequest {
    pub outcome: ClassificationOutcome,
    #[serde(default)]
    pub verdicts: Vec<LabVerdict>,
}

/// `POST /api/screening/resolve`
pub async fn resolve(
    payload: Result<Json<ResolveRequest>, JsonRejection>,
) -> Result<Json<Resolution>, ApiError> {
    let Json(req) = payload?;
    let verdicts: BTreeMap<_, _> = req
        .verdicts
        .iter()
        .map(|v| (normalize_code(&v.substance), v.verdict))
        .collect();
    Ok(Json(resolve_confirmation(&req.outcome, &verdicts)))
}
