use axum::http::StatusCode;
use domain::Error;

/// Maps a domain error onto the status and message the client shows.
pub fn reject(err: Error) -> (StatusCode, String) {
    let status = match &err {
        Error::NotFound { .. } => StatusCode::NOT_FOUND,
        Error::Validation { .. } => StatusCode::BAD_REQUEST,
        Error::Dependency { .. } => StatusCode::BAD_GATEWAY,
        Error::Integrity { .. } => StatusCode::UNPROCESSABLE_ENTITY,
    };

    match &err {
        Error::Dependency { service, message } => {
            tracing::error!("{} failed: {}", service, message);
        }
        Error::Integrity { message } => tracing::error!("{}", message),
        _ => {}
    }

    (status, err.to_string())
}
