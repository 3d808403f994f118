use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
};
use domain::Identity;

/// Set by the API Gateway authorizer from the token's subject.
pub const USER_ID_HEADER: &str = "x-user-id";

/// The authenticated caller, resolved once per request.
pub struct CurrentUser(pub Identity);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for CurrentUser {
    type Rejection = (StatusCode, String);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|user_id| !user_id.is_empty())
            .map(|user_id| CurrentUser(Identity::new(user_id)))
            .ok_or((StatusCode::UNAUTHORIZED, "Not authenticated".to_string()))
    }
}
