use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use domain::analyses::SubmitAnalysisInput;

use crate::{auth::CurrentUser, error::reject, AppState};

// Run the upload, analyze and persist workflow
pub async fn submit_analysis(
    CurrentUser(identity): CurrentUser,
    State(state): State<AppState>,
    Json(input): Json<SubmitAnalysisInput>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let submission = input.into_submission().map_err(reject)?;

    let outcome = state
        .services
        .submit(&identity, submission)
        .await
        .map_err(reject)?;

    Ok((StatusCode::CREATED, Json(outcome)))
}

// Analysis detail with its patient
pub async fn get_analysis(
    CurrentUser(identity): CurrentUser,
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let view = state
        .services
        .analysis_view(&identity, &id)
        .await
        .map_err(reject)?;

    Ok(Json(view))
}

// Analysis history of a patient
pub async fn list_patient_analyses(
    CurrentUser(identity): CurrentUser,
    Path(patient_id): Path<String>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let history = state
        .services
        .patient_history(&identity, &patient_id)
        .await
        .map_err(reject)?;

    Ok(Json(history))
}

// Download the PDF report
pub async fn download_report(
    CurrentUser(identity): CurrentUser,
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let pdf = state
        .services
        .report_pdf(&identity, &id)
        .await
        .map_err(reject)?;

    let headers = [
        (header::CONTENT_TYPE, "application/pdf".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"analysis_{}.pdf\"", id),
        ),
    ];

    Ok((headers, pdf))
}
