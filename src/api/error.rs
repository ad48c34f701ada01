use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::fmt;

use super::ApiResponse;
use crate::auth::AuthError;

#[derive(Debug)]
pub enum ApiError {
    NotFound(String),

    ValidationError(String),

    Conflict(String),

    InternalError(String),

    /// Missing, malformed or expired credential.
    Unauthorized(String),

    /// Authenticated but not allowed.
    Forbidden(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            ApiError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            ApiError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            ApiError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal error occurred".to_string(),
                )
            }
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone()),
        };

        let mut response = (status, Json(ApiResponse::<()>::error(error_message))).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response.headers_mut().insert(
                axum::http::header::WWW_AUTHENTICATE,
                axum::http::HeaderValue::from_static("Bearer"),
            );
        }
        response
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::InternalError(format!("{err:#}"))
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredential | AuthError::ExpiredCredential => {
                ApiError::Unauthorized(err.to_string())
            }
            AuthError::Unauthorized => ApiError::Forbidden(err.to_string()),
            AuthError::NotFound(msg) => ApiError::NotFound(msg),
            AuthError::Conflict(msg) => ApiError::Conflict(msg),
            AuthError::Validation(msg) => ApiError::ValidationError(msg),
            AuthError::Internal(msg) => ApiError::InternalError(msg),
        }
    }
}

impl ApiError {
    pub fn validation(msg: impl Into<String>) -> Self {
        ApiError::ValidationError(msg.into())
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        ApiError::Unauthorized(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: AuthError) -> StatusCode {
        ApiError::from(err).into_response().status()
    }

    #[test]
    fn test_auth_error_status_mapping() {
        assert_eq!(status_of(AuthError::InvalidCredential), StatusCode::UNAUTHORIZED);
        assert_eq!(status_of(AuthError::ExpiredCredential), StatusCode::UNAUTHORIZED);
        assert_eq!(status_of(AuthError::Unauthorized), StatusCode::FORBIDDEN);
        assert_eq!(status_of(AuthError::not_found("Blog")), StatusCode::NOT_FOUND);
        assert_eq!(status_of(AuthError::conflict("taken")), StatusCode::CONFLICT);
        assert_eq!(status_of(AuthError::validation("bad")), StatusCode::BAD_REQUEST);
        assert_eq!(
            status_of(AuthError::Internal("db exploded".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_expired_message_is_distinct() {
        let ApiError::Unauthorized(msg) = ApiError::from(AuthError::ExpiredCredential) else {
            panic!("expected Unauthorized");
        };
        assert_eq!(msg, "Token has expired");
    }

    #[test]
    fn test_unauthorized_sets_www_authenticate() {
        let response = ApiError::unauthorized("Not authenticated").into_response();
        assert_eq!(
            response.headers().get(axum::http::header::WWW_AUTHENTICATE).unwrap(),
            "Bearer"
        );
    }
}
