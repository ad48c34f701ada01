use axum::{Extension, Json, extract::State, http::StatusCode};
use std::sync::Arc;

use super::extract::IdPath;
use super::{
    AccountDto, ApiError, ApiResponse, AppState, ChangePasswordRequest, MessageResponse,
    RegisterRequest, TokenResponse, UpdateAccountRequest,
};
use crate::auth::{Principal, Role};
use crate::services::validation::validate_id;
use crate::services::{AccountUpdate, NewAccount};

/// POST /api/1/users
/// Registers a user and returns a token for them.
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<TokenResponse>>), ApiError> {
    let principal = state
        .accounts()
        .register(
            Role::User,
            NewAccount {
                email: payload.email,
                username: payload.username,
                password: payload.password,
            },
        )
        .await?;

    let token = state.tokens().issue_token_for(&principal)?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(TokenResponse::bearer(token))),
    ))
}

/// GET /api/1/users/me
pub async fn get_me(Extension(me): Extension<Principal>) -> Json<ApiResponse<AccountDto>> {
    Json(ApiResponse::success(AccountDto::from(me)))
}

/// PUT /api/1/users/me
pub async fn update_me(
    State(state): State<Arc<AppState>>,
    Extension(me): Extension<Principal>,
    Json(payload): Json<UpdateAccountRequest>,
) -> Result<Json<ApiResponse<AccountDto>>, ApiError> {
    let updated = state
        .accounts()
        .update(Role::User, me.id, to_update(payload))
        .await?;
    Ok(Json(ApiResponse::success(updated.into())))
}

/// PUT /api/1/users/me/password
pub async fn change_my_password(
    State(state): State<Arc<AppState>>,
    Extension(me): Extension<Principal>,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state
        .accounts()
        .change_password(
            Role::User,
            me.id,
            &payload.current_password,
            &payload.new_password,
        )
        .await?;

    Ok(Json(ApiResponse::success(MessageResponse::new(
        "Password changed successfully",
    ))))
}

/// DELETE /api/1/users/me
pub async fn delete_me(
    State(state): State<Arc<AppState>>,
    Extension(me): Extension<Principal>,
) -> Result<StatusCode, ApiError> {
    state.accounts().delete(Role::User, me.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Admin-only user management
// ============================================================================

/// GET /api/1/admins/users
pub async fn list_users(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<AccountDto>>>, ApiError> {
    let users = state.accounts().list(Role::User).await?;
    Ok(Json(ApiResponse::success(
        users.into_iter().map(AccountDto::from).collect(),
    )))
}

/// GET /api/1/users/{id}
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    IdPath(id): IdPath,
) -> Result<Json<ApiResponse<AccountDto>>, ApiError> {
    let id = validate_id(id, "user")?;
    let user = state.accounts().get(Role::User, id).await?;
    Ok(Json(ApiResponse::success(user.into())))
}

/// PUT /api/1/users/{id}
pub async fn update_user(
    State(state): State<Arc<AppState>>,
    IdPath(id): IdPath,
    Json(payload): Json<UpdateAccountRequest>,
) -> Result<Json<ApiResponse<AccountDto>>, ApiError> {
    let id = validate_id(id, "user")?;
    let updated = state
        .accounts()
        .update(Role::User, id, to_update(payload))
        .await?;
    Ok(Json(ApiResponse::success(updated.into())))
}

/// DELETE /api/1/users/{id}
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    Extension(admin): Extension<Principal>,
    IdPath(id): IdPath,
) -> Result<StatusCode, ApiError> {
    let id = validate_id(id, "user")?;
    state.accounts().delete(Role::User, id).await?;
    tracing::info!(admin_id = admin.id, user_id = id, "User deleted by admin");
    Ok(StatusCode::NO_CONTENT)
}

pub(super) fn to_update(payload: UpdateAccountRequest) -> AccountUpdate {
    AccountUpdate {
        email: payload.email,
        username: payload.username,
    }
}
