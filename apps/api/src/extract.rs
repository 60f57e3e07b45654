//! Request extractors.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::error::ApiError;

/// The authenticated user's id, taken from the `x-user-id` header.
///
/// Authentication itself happens upstream (an API gateway validates
/// the session and stamps the header); a request arriving without the
/// header is rejected with 401 here.
#[derive(Debug, Clone)]
pub struct UserId(pub String);

impl<S> FromRequestParts<S> for UserId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get("x-user-id")
            .and_then(|value| value.to_str().ok())
            .filter(|value| !value.is_empty())
            .map(|value| UserId(value.to_string()))
            .ok_or(ApiError::Unauthorized)
    }
}
