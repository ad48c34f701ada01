use serde::{Deserialize, Serialize};

use crate::auth::{Principal, Role};
use crate::db::Blog;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: &'static str,
}

impl TokenResponse {
    #[must_use]
    pub const fn bearer(access_token: String) -> Self {
        Self {
            access_token,
            token_type: "bearer",
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AccountDto {
    pub id: i32,
    pub email: String,
    pub username: String,
    pub role: Role,
    pub date_created: String,
}

impl From<Principal> for AccountDto {
    fn from(principal: Principal) -> Self {
        Self {
            id: principal.id,
            email: principal.email,
            username: principal.username,
            role: principal.role,
            date_created: principal.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BlogDto {
    pub id: i32,
    pub title: String,
    pub content: String,
    pub owner_id: i32,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Blog> for BlogDto {
    fn from(blog: Blog) -> Self {
        Self {
            id: blog.id,
            title: blog.title,
            content: blog.content,
            owner_id: blog.owner_id,
            created_at: blog.created_at,
            updated_at: blog.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub username: String,
    pub password: String,
}

/// OAuth2 password-grant shaped form; `username` carries the email.
#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateAccountRequest {
    pub email: Option<String>,
    pub username: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Deserialize)]
pub struct BlogRequest {
    pub title: String,
    pub content: String,
}
