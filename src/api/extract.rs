use axum::{
    extract::{FromRequestParts, Path},
    http::request::Parts,
};

use super::ApiError;

/// `{id}` path segment parsed as an `i32`. A malformed segment is rejected
/// with the JSON error envelope rather than axum's plain-text body.
#[derive(Debug, Clone, Copy)]
pub struct IdPath(pub i32);

impl<S> FromRequestParts<S> for IdPath
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Path::<i32>::from_request_parts(parts, state)
            .await
            .map(|Path(id)| Self(id))
            .map_err(|rejection| ApiError::validation(rejection.body_text()))
    }
}
