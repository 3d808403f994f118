use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use domain::patients::{self, NewPatient, PatientRepository};
use serde::Deserialize;

use crate::{auth::CurrentUser, error::reject, AppState};

#[derive(Debug, Deserialize)]
pub struct ListPatientsQuery {
    pub limit: Option<usize>,
}

// Create patient
pub async fn create_patient(
    CurrentUser(identity): CurrentUser,
    State(state): State<AppState>,
    Json(input): Json<NewPatient>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let patient = patients::register(state.services.patients.as_ref(), &identity, input)
        .await
        .map_err(reject)?;

    Ok((StatusCode::CREATED, Json(patient)))
}

// List patients, newest first
pub async fn list_patients(
    CurrentUser(identity): CurrentUser,
    State(state): State<AppState>,
    Query(query): Query<ListPatientsQuery>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let patients = state
        .services
        .patients
        .list(&identity, query.limit)
        .await
        .map_err(reject)?;

    Ok(Json(patients))
}

// Get patient
pub async fn get_patient(
    CurrentUser(identity): CurrentUser,
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let patient = patients::find(state.services.patients.as_ref(), &identity, &id)
        .await
        .map_err(reject)?;

    Ok(Json(patient))
}
