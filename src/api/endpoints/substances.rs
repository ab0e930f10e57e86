//! Substance catalog endpoint.

use axum::extract::rejection::QueryRejection;
use axum::extract::Query;
use axum::Json;
use serde::Deserialize;

use crate::api::error::ApiError;
use crate::models::enums::TestType;
use crate::screening::{self, Substance};

#[derive(Deserialize)]
pub struct SubstanceQuery {
    pub panel: Option<TestType>,
}

/// `GET /api/substances?panel=`: the whole catalog, or one panel.
pub async fn list(
    query: Result<Query<SubstanceQuery>, QueryRejection>,
) -> Result<Json<Vec<Substance>>, ApiError> {
    let Query(query) = query?;
    let substances = match query.panel {
        Some(panel) => screening::panel_substances(panel).into_iter().cloned().collect(),
        None => screening::all_substances().to_vec(),
    };
    Ok(Json(substances))
}
