//! Domain service for user and admin accounts.
//!
//! Both principal families share one contract; every operation is scoped by
//! [`Role`].

use crate::auth::{AuthError, Principal, Role};

/// Registration input. Validated by the service, not the caller.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub email: String,
    pub username: String,
    pub password: String,
}

/// Partial profile update; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct AccountUpdate {
    pub email: Option<String>,
    pub username: Option<String>,
}

#[async_trait::async_trait]
pub trait AccountService: Send + Sync {
    /// Creates an account after validation and uniqueness checks.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Conflict`] when the email or username is taken,
    /// [`AuthError::Validation`] for malformed input.
    async fn register(&self, role: Role, account: NewAccount) -> Result<Principal, AuthError>;

    /// Checks an email/password pair.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredential`] for an unknown email and for a
    /// wrong password alike.
    async fn authenticate(
        &self,
        role: Role,
        email: &str,
        password: &str,
    ) -> Result<Principal, AuthError>;

    async fn get(&self, role: Role, id: i32) -> Result<Principal, AuthError>;

    async fn list(&self, role: Role) -> Result<Vec<Principal>, AuthError>;

    async fn update(
        &self,
        role: Role,
        id: i32,
        update: AccountUpdate,
    ) -> Result<Principal, AuthError>;

    /// # Errors
    ///
    /// Returns [`AuthError::Validation`] if the current password is wrong or
    /// the new one is invalid.
    async fn change_password(
        &self,
        role: Role,
        id: i32,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError>;

    /// Deleting a user also deletes their blogs.
    async fn delete(&self, role: Role, id: i32) -> Result<(), AuthError>;
}
