use axum::{
    Form, Json,
    extract::{Request, State},
    http::{HeaderMap, header::AUTHORIZATION},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState, TokenRequest, TokenResponse};
use crate::auth::{AuthError, Role};

// ============================================================================
// Middleware
// ============================================================================

/// Resolves `Authorization: Bearer <token>` to a user and stores the
/// [`Principal`](crate::auth::Principal) in request extensions.
pub async fn require_user(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    authenticate(&state, &headers, Role::User, request, next).await
}

/// Same as [`require_user`], for the admin family.
pub async fn require_admin(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    authenticate(&state, &headers, Role::Admin, request, next).await
}

async fn authenticate(
    state: &AppState,
    headers: &HeaderMap,
    role: Role,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(token) = extract_bearer(headers) else {
        metrics::counter!("auth_failures_total", "reason" => "missing").increment(1);
        return Err(ApiError::unauthorized("Not authenticated"));
    };

    let principal = match state.resolver().resolve_current(&token, Some(role)).await {
        Ok(principal) => principal,
        Err(err) => {
            let reason = match &err {
                AuthError::ExpiredCredential => "expired",
                AuthError::InvalidCredential => "invalid",
                AuthError::Unauthorized => "forbidden",
                AuthError::NotFound(_) => "stale",
                _ => "error",
            };
            tracing::warn!(reason, required = role.label(), "Bearer token rejected");
            metrics::counter!("auth_failures_total", "reason" => reason).increment(1);
            return Err(err.into());
        }
    };

    tracing::Span::current().record(
        "user_id",
        tracing::field::display(format!("{}:{}", role.label(), principal.id)),
    );
    request.extensions_mut().insert(principal);

    Ok(next.run(request).await)
}

fn extract_bearer(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;

    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }

    let token = token.trim();
    (!token.is_empty()).then(|| token.to_string())
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/1/token
pub async fn user_token(
    State(state): State<Arc<AppState>>,
    Form(form): Form<TokenRequest>,
) -> Result<Json<ApiResponse<TokenResponse>>, ApiError> {
    issue_for_login(&state, Role::User, form).await
}

/// POST /api/1/admins/token
pub async fn admin_token(
    State(state): State<Arc<AppState>>,
    Form(form): Form<TokenRequest>,
) -> Result<Json<ApiResponse<TokenResponse>>, ApiError> {
    issue_for_login(&state, Role::Admin, form).await
}

async fn issue_for_login(
    state: &AppState,
    role: Role,
    form: TokenRequest,
) -> Result<Json<ApiResponse<TokenResponse>>, ApiError> {
    if form.username.trim().is_empty() {
        return Err(ApiError::validation("Username is required"));
    }
    if form.password.is_empty() {
        return Err(ApiError::validation("Password is required"));
    }

    let principal = state
        .accounts()
        .authenticate(role, &form.username, &form.password)
        .await?;

    let token = state.tokens().issue_token_for(&principal)?;

    tracing::info!(role = role.label(), id = principal.id, "Token issued");
    Ok(Json(ApiResponse::success(TokenResponse::bearer(token))))
}
