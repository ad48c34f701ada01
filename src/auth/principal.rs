use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Which principal family an actor belongs to.
///
/// Users and admins live in separate tables, so ids are only unique within a
/// role.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    #[must_use]
    pub const fn is_admin(self) -> bool {
        matches!(self, Self::Admin)
    }

    #[must_use]
    pub const fn from_admin_flag(is_admin: bool) -> Self {
        if is_admin { Self::Admin } else { Self::User }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::User => "User",
            Self::Admin => "Admin",
        }
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.label())
    }
}

/// An authenticated actor. Never carries the password hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub id: i32,
    pub email: String,
    pub username: String,
    pub role: Role,
    pub created_at: String,
}

/// Fields needed to persist a new principal. `id` and `created_at` are
/// assigned by the store.
#[derive(Debug, Clone)]
pub struct NewPrincipal {
    pub email: String,
    pub username: String,
    pub password_hash: String,
}

/// Persistence the credential core depends on.
#[async_trait]
pub trait PrincipalStore: Send + Sync {
    async fn find_principal_by_id(&self, role: Role, id: i32) -> anyhow::Result<Option<Principal>>;

    async fn find_principal_by_email(
        &self,
        role: Role,
        email: &str,
    ) -> anyhow::Result<Option<Principal>>;

    async fn find_principal_by_username(
        &self,
        role: Role,
        username: &str,
    ) -> anyhow::Result<Option<Principal>>;

    /// Principal plus stored password hash, for login.
    async fn find_credentials_by_email(
        &self,
        role: Role,
        email: &str,
    ) -> anyhow::Result<Option<(Principal, String)>>;

    async fn insert_principal(&self, role: Role, record: NewPrincipal)
    -> anyhow::Result<Principal>;

    /// Returns `false` when nothing was deleted.
    async fn delete_principal(&self, role: Role, id: i32) -> anyhow::Result<bool>;
}
