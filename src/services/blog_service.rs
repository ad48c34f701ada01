//! Domain service for blog posts.
//!
//! Every read or write of a single post checks existence first, then
//! ownership.

use crate::auth::{AuthError, Principal};
use crate::db::Blog;

#[derive(Debug, Clone)]
pub struct BlogInput {
    pub title: String,
    pub content: String,
}

#[async_trait::async_trait]
pub trait BlogService: Send + Sync {
    async fn create(&self, owner: &Principal, input: BlogInput) -> Result<Blog, AuthError>;

    async fn list_for_owner(&self, owner: &Principal) -> Result<Vec<Blog>, AuthError>;

    /// # Errors
    ///
    /// [`AuthError::NotFound`] if the post does not exist (for any caller),
    /// [`AuthError::Unauthorized`] if it belongs to someone else.
    async fn get(&self, principal: &Principal, id: i32) -> Result<Blog, AuthError>;

    async fn update(
        &self,
        principal: &Principal,
        id: i32,
        input: BlogInput,
    ) -> Result<Blog, AuthError>;

    async fn delete(&self, principal: &Principal, id: i32) -> Result<(), AuthError>;
}
