use anyhow::Result;
use async_trait::async_trait;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::auth::{NewPrincipal, Principal, PrincipalStore, Role};

pub mod migrator;
pub mod repositories;

pub use repositories::blog::Blog;

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        let path_str = db_url.trim_start_matches("sqlite:");
        if !path_str.starts_with(":memory:") {
            let path_str = path_str.split('?').next().unwrap_or(path_str);
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    fn admin_repo(&self) -> repositories::admin::AdminRepository {
        repositories::admin::AdminRepository::new(self.conn.clone())
    }

    fn blog_repo(&self) -> repositories::blog::BlogRepository {
        repositories::blog::BlogRepository::new(self.conn.clone())
    }

    pub async fn list_principals(&self, role: Role) -> Result<Vec<Principal>> {
        match role {
            Role::User => self.user_repo().list().await,
            Role::Admin => self.admin_repo().list().await,
        }
    }

    pub async fn update_principal(
        &self,
        role: Role,
        id: i32,
        email: Option<String>,
        username: Option<String>,
    ) -> Result<Option<Principal>> {
        match role {
            Role::User => self.user_repo().update_profile(id, email, username).await,
            Role::Admin => self.admin_repo().update_profile(id, email, username).await,
        }
    }

    pub async fn update_password_hash(
        &self,
        role: Role,
        id: i32,
        password_hash: String,
    ) -> Result<bool> {
        match role {
            Role::User => self.user_repo().update_password(id, password_hash).await,
            Role::Admin => self.admin_repo().update_password(id, password_hash).await,
        }
    }

    pub async fn get_blog(&self, id: i32) -> Result<Option<Blog>> {
        self.blog_repo().get(id).await
    }

    pub async fn list_blogs_for_owner(&self, owner_id: i32) -> Result<Vec<Blog>> {
        self.blog_repo().list_for_owner(owner_id).await
    }

    pub async fn create_blog(&self, owner_id: i32, title: &str, content: &str) -> Result<Blog> {
        self.blog_repo().create(owner_id, title, content).await
    }

    pub async fn update_blog(&self, id: i32, title: &str, content: &str) -> Result<Option<Blog>> {
        self.blog_repo().update(id, title, content).await
    }

    pub async fn delete_blog(&self, id: i32) -> Result<bool> {
        self.blog_repo().delete(id).await
    }
}

#[async_trait]
impl PrincipalStore for Store {
    async fn find_principal_by_id(&self, role: Role, id: i32) -> Result<Option<Principal>> {
        match role {
            Role::User => self.user_repo().get_by_id(id).await,
            Role::Admin => self.admin_repo().get_by_id(id).await,
        }
    }

    async fn find_principal_by_email(&self, role: Role, email: &str) -> Result<Option<Principal>> {
        match role {
            Role::User => self.user_repo().get_by_email(email).await,
            Role::Admin => self.admin_repo().get_by_email(email).await,
        }
    }

    async fn find_principal_by_username(
        &self,
        role: Role,
        username: &str,
    ) -> Result<Option<Principal>> {
        match role {
            Role::User => self.user_repo().get_by_username(username).await,
            Role::Admin => self.admin_repo().get_by_username(username).await,
        }
    }

    async fn find_credentials_by_email(
        &self,
        role: Role,
        email: &str,
    ) -> Result<Option<(Principal, String)>> {
        match role {
            Role::User => self.user_repo().get_credentials_by_email(email).await,
            Role::Admin => self.admin_repo().get_credentials_by_email(email).await,
        }
    }

    async fn insert_principal(&self, role: Role, record: NewPrincipal) -> Result<Principal> {
        match role {
            Role::User => self.user_repo().create(record).await,
            Role::Admin => self.admin_repo().create(record).await,
        }
    }

    async fn delete_principal(&self, role: Role, id: i32) -> Result<bool> {
        match role {
            Role::User => self.user_repo().delete(id).await,
            Role::Admin => self.admin_repo().delete(id).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AuthError, EMAIL_TAKEN, USERNAME_TAKEN};

    async fn store() -> Store {
        Store::new("sqlite::memory:").await.unwrap()
    }

    fn record(email: &str, username: &str) -> NewPrincipal {
        NewPrincipal {
            email: email.to_string(),
            username: username.to_string(),
            password_hash: "hash".to_string(),
        }
    }

    #[tokio::test]
    async fn test_user_and_admin_families_are_separate() {
        let store = store().await;

        let user = store
            .insert_principal(Role::User, record("same@x.com", "same"))
            .await
            .unwrap();
        let admin = store
            .insert_principal(Role::Admin, record("same@x.com", "same"))
            .await
            .unwrap();

        assert_eq!(user.role, Role::User);
        assert_eq!(admin.role, Role::Admin);

        let found = store
            .find_principal_by_id(Role::Admin, admin.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found, admin);

        let (principal, hash) = store
            .find_credentials_by_email(Role::User, "same@x.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(principal, user);
        assert_eq!(hash, "hash");
    }

    #[tokio::test]
    async fn test_unique_email_is_enforced_by_storage() {
        let store = store().await;
        store
            .insert_principal(Role::User, record("a@x.com", "a"))
            .await
            .unwrap();

        let dup_email = store
            .insert_principal(Role::User, record("a@x.com", "b"))
            .await
            .unwrap_err();
        assert!(matches!(
            AuthError::from(dup_email),
            AuthError::Conflict(msg) if msg == EMAIL_TAKEN
        ));

        store
            .insert_principal(Role::Admin, record("root@x.com", "root"))
            .await
            .unwrap();
        let dup_name = store
            .insert_principal(Role::Admin, record("other@x.com", "root"))
            .await
            .unwrap_err();
        assert!(matches!(
            AuthError::from(dup_name),
            AuthError::Conflict(msg) if msg == USERNAME_TAKEN
        ));
    }

    #[tokio::test]
    async fn test_unique_username_is_enforced_on_update() {
        let store = store().await;
        store
            .insert_principal(Role::User, record("a@x.com", "alice"))
            .await
            .unwrap();
        let bob = store
            .insert_principal(Role::User, record("b@x.com", "bob"))
            .await
            .unwrap();

        let err = store
            .update_principal(Role::User, bob.id, None, Some("alice".to_string()))
            .await
            .unwrap_err();
        assert!(matches!(
            AuthError::from(err),
            AuthError::Conflict(msg) if msg == USERNAME_TAKEN
        ));
    }

    #[tokio::test]
    async fn test_delete_user_removes_blogs() {
        let store = store().await;
        let owner = store
            .insert_principal(Role::User, record("a@x.com", "a"))
            .await
            .unwrap();
        let other = store
            .insert_principal(Role::User, record("b@x.com", "b"))
            .await
            .unwrap();

        let blog = store.create_blog(owner.id, "Title", "Body").await.unwrap();
        let kept = store.create_blog(other.id, "Other", "Body").await.unwrap();

        assert!(store.delete_principal(Role::User, owner.id).await.unwrap());
        assert!(store.get_blog(blog.id).await.unwrap().is_none());
        assert!(store.get_blog(kept.id).await.unwrap().is_some());
        assert!(!store.delete_principal(Role::User, owner.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_update_blog_keeps_owner() {
        let store = store().await;
        let owner = store
            .insert_principal(Role::User, record("a@x.com", "a"))
            .await
            .unwrap();
        let blog = store.create_blog(owner.id, "Title", "Body").await.unwrap();

        let updated = store
            .update_blog(blog.id, "New", "Text")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.owner_id, owner.id);
        assert_eq!(updated.title, "New");
        assert_eq!(updated.created_at, blog.created_at);

        assert!(store.update_blog(999, "x", "y").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_ping() {
        assert!(store().await.ping().await.is_ok());
    }
}
