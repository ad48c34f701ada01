//! `SeaORM` implementation of the `BlogService` trait.

use async_trait::async_trait;
use tracing::info;

use crate::auth::{AuthError, Principal, Role, authorize_resource, require_role};
use crate::db::{Blog, Store};
use crate::services::blog_service::{BlogInput, BlogService};
use crate::services::validation::{validate_blog_content, validate_blog_title, validate_id};

const RESOURCE: &str = "Blog";

pub struct SeaOrmBlogService {
    store: Store,
}

impl SeaOrmBlogService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    async fn load_owned(&self, principal: &Principal, id: i32) -> Result<Blog, AuthError> {
        let id = validate_id(id, "blog")?;
        let blog = self.store.get_blog(id).await?;
        authorize_resource(principal, blog, RESOURCE)
    }
}

#[async_trait]
impl BlogService for SeaOrmBlogService {
    async fn create(&self, owner: &Principal, input: BlogInput) -> Result<Blog, AuthError> {
        require_role(owner, Role::User)?;
        let title = validate_blog_title(&input.title)?;
        validate_blog_content(&input.content)?;

        let blog = self
            .store
            .create_blog(owner.id, &title, &input.content)
            .await?;

        info!(blog_id = blog.id, owner_id = owner.id, "Blog created");
        Ok(blog)
    }

    async fn list_for_owner(&self, owner: &Principal) -> Result<Vec<Blog>, AuthError> {
        require_role(owner, Role::User)?;
        Ok(self.store.list_blogs_for_owner(owner.id).await?)
    }

    async fn get(&self, principal: &Principal, id: i32) -> Result<Blog, AuthError> {
        self.load_owned(principal, id).await
    }

    async fn update(
        &self,
        principal: &Principal,
        id: i32,
        input: BlogInput,
    ) -> Result<Blog, AuthError> {
        let blog = self.load_owned(principal, id).await?;

        let title = validate_blog_title(&input.title)?;
        validate_blog_content(&input.content)?;

        self.store
            .update_blog(blog.id, &title, &input.content)
            .await?
            .ok_or_else(|| AuthError::not_found(RESOURCE))
    }

    async fn delete(&self, principal: &Principal, id: i32) -> Result<(), AuthError> {
        let blog = self.load_owned(principal, id).await?;

        if !self.store.delete_blog(blog.id).await? {
            return Err(AuthError::not_found(RESOURCE));
        }

        info!(blog_id = blog.id, owner_id = blog.owner_id, "Blog deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{NewPrincipal, PrincipalStore};

    async fn setup() -> (SeaOrmBlogService, Principal, Principal) {
        let store = Store::new("sqlite::memory:").await.unwrap();
        let mut users = Vec::new();
        for name in ["alice", "bob"] {
            users.push(
                store
                    .insert_principal(
                        Role::User,
                        NewPrincipal {
                            email: format!("{name}@x.com"),
                            username: name.to_string(),
                            password_hash: "hash".to_string(),
                        },
                    )
                    .await
                    .unwrap(),
            );
        }
        let bob = users.pop().unwrap();
        let alice = users.pop().unwrap();
        (SeaOrmBlogService::new(store), alice, bob)
    }

    fn input(title: &str) -> BlogInput {
        BlogInput {
            title: title.to_string(),
            content: "Body text".to_string(),
        }
    }

    #[tokio::test]
    async fn test_owner_crud() {
        let (svc, alice, _) = setup().await;

        let blog = svc.create(&alice, input("First")).await.unwrap();
        assert_eq!(blog.owner_id, alice.id);

        assert_eq!(svc.get(&alice, blog.id).await.unwrap(), blog);
        assert_eq!(svc.list_for_owner(&alice).await.unwrap().len(), 1);

        let updated = svc.update(&alice, blog.id, input("Second")).await.unwrap();
        assert_eq!(updated.title, "Second");
        assert_eq!(updated.owner_id, alice.id);

        svc.delete(&alice, blog.id).await.unwrap();
        assert!(svc.list_for_owner(&alice).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_other_user_is_unauthorized() {
        let (svc, alice, bob) = setup().await;
        let blog = svc.create(&alice, input("Mine")).await.unwrap();

        assert!(matches!(svc.get(&bob, blog.id).await, Err(AuthError::Unauthorized)));
        assert!(matches!(
            svc.update(&bob, blog.id, input("Hijack")).await,
            Err(AuthError::Unauthorized)
        ));
        assert!(matches!(svc.delete(&bob, blog.id).await, Err(AuthError::Unauthorized)));

        assert!(svc.list_for_owner(&bob).await.unwrap().is_empty());
        assert_eq!(svc.get(&alice, blog.id).await.unwrap().title, "Mine");
    }

    #[tokio::test]
    async fn test_missing_blog_is_not_found_for_everyone() {
        let (svc, alice, bob) = setup().await;
        for who in [&alice, &bob] {
            assert!(matches!(
                svc.get(who, 404).await,
                Err(AuthError::NotFound(msg)) if msg == "Blog not found"
            ));
            assert!(matches!(
                svc.delete(who, 404).await,
                Err(AuthError::NotFound(_))
            ));
        }
    }

    #[tokio::test]
    async fn test_invalid_input() {
        let (svc, alice, _) = setup().await;
        assert!(matches!(
            svc.create(&alice, input("  ")).await,
            Err(AuthError::Validation(_))
        ));
        assert!(matches!(svc.get(&alice, 0).await, Err(AuthError::Validation(_))));
    }
}
