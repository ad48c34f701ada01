use axum::{Extension, Json, extract::State, http::StatusCode};
use std::sync::Arc;

use super::extract::IdPath;
use super::{ApiError, ApiResponse, AppState, BlogDto, BlogRequest, MessageResponse};
use crate::auth::Principal;
use crate::services::BlogInput;

fn to_input(payload: BlogRequest) -> BlogInput {
    BlogInput {
        title: payload.title,
        content: payload.content,
    }
}

/// POST /api/1/blogs
pub async fn create_blog(
    State(state): State<Arc<AppState>>,
    Extension(me): Extension<Principal>,
    Json(payload): Json<BlogRequest>,
) -> Result<(StatusCode, Json<ApiResponse<BlogDto>>), ApiError> {
    let blog = state.blogs().create(&me, to_input(payload)).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(blog.into()))))
}

/// GET /api/1/blogs
/// Only the caller's own posts.
pub async fn list_blogs(
    State(state): State<Arc<AppState>>,
    Extension(me): Extension<Principal>,
) -> Result<Json<ApiResponse<Vec<BlogDto>>>, ApiError> {
    let blogs = state.blogs().list_for_owner(&me).await?;
    Ok(Json(ApiResponse::success(
        blogs.into_iter().map(BlogDto::from).collect(),
    )))
}

/// GET /api/1/blogs/{id}
pub async fn get_blog(
    State(state): State<Arc<AppState>>,
    Extension(me): Extension<Principal>,
    IdPath(id): IdPath,
) -> Result<Json<ApiResponse<BlogDto>>, ApiError> {
    let blog = state.blogs().get(&me, id).await?;
    Ok(Json(ApiResponse::success(blog.into())))
}

/// PUT /api/1/blogs/{id}
pub async fn update_blog(
    State(state): State<Arc<AppState>>,
    Extension(me): Extension<Principal>,
    IdPath(id): IdPath,
    Json(payload): Json<BlogRequest>,
) -> Result<Json<ApiResponse<BlogDto>>, ApiError> {
    let blog = state.blogs().update(&me, id, to_input(payload)).await?;
    Ok(Json(ApiResponse::success(blog.into())))
}

/// DELETE /api/1/blogs/{id}
pub async fn delete_blog(
    State(state): State<Arc<AppState>>,
    Extension(me): Extension<Principal>,
    IdPath(id): IdPath,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state.blogs().delete(&me, id).await?;
    Ok(Json(ApiResponse::success(MessageResponse::new(format!(
        "Blog {id} deleted"
    )))))
}
