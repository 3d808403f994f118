//! Clinic HTTP API

/// Patient and analysis handlers
pub mod routes;

/// Caller identity extractor
pub mod auth;

/// Domain error to HTTP rejection mapping
pub mod error;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use domain::Services;

/// Lambda's synchronous payload limit; two base64 photos must fit in it.
pub const MAX_BODY_BYTES: usize = 6 * 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub services: Services,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/patients",
            post(routes::patients::create_patient).get(routes::patients::list_patients),
        )
        .route("/patients/:id", get(routes::patients::get_patient))
        .route(
            "/patients/:id/analyses",
            get(routes::analyses::list_patient_analyses),
        )
        .route("/analyses", post(routes::analyses::submit_analysis))
        .route("/analyses/:id", get(routes::analyses::get_analysis))
        .route("/analyses/:id/report", get(routes::analyses::download_report))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
}
