use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
};
use std::sync::Arc;

use super::users::to_update;
use super::{
    AccountDto, ApiError, ApiResponse, AppState, ChangePasswordRequest, MessageResponse,
    RegisterRequest, UpdateAccountRequest,
};
use crate::auth::{Principal, Role};
use crate::services::NewAccount;

/// POST /api/1/admins
/// Only an existing admin can create another one.
pub async fn create_admin(
    State(state): State<Arc<AppState>>,
    Extension(creator): Extension<Principal>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<AccountDto>>), ApiError> {
    let admin = state
        .accounts()
        .register(
            Role::Admin,
            NewAccount {
                email: payload.email,
                username: payload.username,
                password: payload.password,
            },
        )
        .await?;

    tracing::info!(creator_id = creator.id, admin_id = admin.id, "Admin created");
    Ok((StatusCode::CREATED, Json(ApiResponse::success(admin.into()))))
}

/// GET /api/1/admins
pub async fn list_admins(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<AccountDto>>>, ApiError> {
    let admins = state.accounts().list(Role::Admin).await?;
    Ok(Json(ApiResponse::success(
        admins.into_iter().map(AccountDto::from).collect(),
    )))
}

/// GET /api/1/admins/me
pub async fn get_me(Extension(me): Extension<Principal>) -> Json<ApiResponse<AccountDto>> {
    Json(ApiResponse::success(AccountDto::from(me)))
}

/// PUT /api/1/admins/me
pub async fn update_me(
    State(state): State<Arc<AppState>>,
    Extension(me): Extension<Principal>,
    Json(payload): Json<UpdateAccountRequest>,
) -> Result<Json<ApiResponse<AccountDto>>, ApiError> {
    let updated = state
        .accounts()
        .update(Role::Admin, me.id, to_update(payload))
        .await?;
    Ok(Json(ApiResponse::success(updated.into())))
}

/// PUT /api/1/admins/me/password
pub async fn change_my_password(
    State(state): State<Arc<AppState>>,
    Extension(me): Extension<Principal>,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state
        .accounts()
        .change_password(
            Role::Admin,
            me.id,
            &payload.current_password,
            &payload.new_password,
        )
        .await?;

    Ok(Json(ApiResponse::success(MessageResponse::new(
        "Password changed successfully",
    ))))
}

/// DELETE /api/1/admins/me
pub async fn delete_me(
    State(state): State<Arc<AppState>>,
    Extension(me): Extension<Principal>,
) -> Result<StatusCode, ApiError> {
    state.accounts().delete(Role::Admin, me.id).await?;
    Ok(StatusCode::NO_CONTENT)
}
