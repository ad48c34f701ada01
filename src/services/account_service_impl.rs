//! `SeaORM` implementation of the `AccountService` trait.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::task;
use tracing::{info, warn};

use crate::auth::{
    AuthError, EMAIL_TAKEN, NewPrincipal, PasswordHasher, Principal, PrincipalStore, Role,
    USERNAME_TAKEN,
};
use crate::db::Store;
use crate::services::account_service::{AccountService, AccountUpdate, NewAccount};
use crate::services::validation::{validate_email, validate_password, validate_username};

pub struct SeaOrmAccountService {
    store: Store,
    hasher: Arc<PasswordHasher>,
}

impl SeaOrmAccountService {
    #[must_use]
    pub const fn new(store: Store, hasher: Arc<PasswordHasher>) -> Self {
        Self { store, hasher }
    }

    async fn hash(&self, password: &str) -> Result<String, AuthError> {
        let hasher = self.hasher.clone();
        let password = password.to_string();
        task::spawn_blocking(move || hasher.hash(&password)).await?
    }

    async fn verify(&self, password: &str, hash: String) -> Result<bool, AuthError> {
        let hasher = self.hasher.clone();
        let password = password.to_string();
        Ok(task::spawn_blocking(move || hasher.verify(&password, &hash)).await?)
    }

    /// Same hashing cost as a wrong password, so an unknown email is not
    /// distinguishable by response time.
    async fn reject_unknown(&self, password: &str) -> Result<(), AuthError> {
        let hasher = self.hasher.clone();
        let password = password.to_string();
        task::spawn_blocking(move || hasher.verify_decoy(&password)).await?;
        Ok(())
    }

    /// `Conflict` when `email` belongs to a principal other than `except`.
    async fn ensure_email_free(
        &self,
        role: Role,
        email: &str,
        except: Option<i32>,
    ) -> Result<(), AuthError> {
        match self.store.find_principal_by_email(role, email).await? {
            Some(existing) if Some(existing.id) != except => {
                info!(role = role.label(), "Rejected duplicate email");
                Err(AuthError::conflict(EMAIL_TAKEN))
            }
            _ => Ok(()),
        }
    }

    async fn ensure_username_free(
        &self,
        role: Role,
        username: &str,
        except: Option<i32>,
    ) -> Result<(), AuthError> {
        match self.store.find_principal_by_username(role, username).await? {
            Some(existing) if Some(existing.id) != except => {
                info!(role = role.label(), "Rejected duplicate username");
                Err(AuthError::conflict(USERNAME_TAKEN))
            }
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl AccountService for SeaOrmAccountService {
    async fn register(&self, role: Role, account: NewAccount) -> Result<Principal, AuthError> {
        let email = validate_email(&account.email)?;
        let username = validate_username(&account.username)?;
        validate_password(&account.password)?;

        self.ensure_email_free(role, &email, None).await?;
        self.ensure_username_free(role, &username, None).await?;

        let password_hash = self.hash(&account.password).await?;

        let principal = self
            .store
            .insert_principal(
                role,
                NewPrincipal {
                    email,
                    username,
                    password_hash,
                },
            )
            .await?;

        info!(role = role.label(), id = principal.id, "Account registered");
        Ok(principal)
    }

    async fn authenticate(
        &self,
        role: Role,
        email: &str,
        password: &str,
    ) -> Result<Principal, AuthError> {
        let email = email.trim();

        let Some((principal, hash)) = self.store.find_credentials_by_email(role, email).await?
        else {
            self.reject_unknown(password).await?;
            warn!(role = role.label(), "Login failed: unknown email");
            metrics::counter!("auth_failures_total", "reason" => "login").increment(1);
            return Err(AuthError::InvalidCredential);
        };

        if !self.verify(password, hash).await? {
            warn!(role = role.label(), id = principal.id, "Login failed: wrong password");
            metrics::counter!("auth_failures_total", "reason" => "login").increment(1);
            return Err(AuthError::InvalidCredential);
        }

        Ok(principal)
    }

    async fn get(&self, role: Role, id: i32) -> Result<Principal, AuthError> {
        self.store
            .find_principal_by_id(role, id)
            .await?
            .ok_or_else(|| AuthError::not_found(role.label()))
    }

    async fn list(&self, role: Role) -> Result<Vec<Principal>, AuthError> {
        Ok(self.store.list_principals(role).await?)
    }

    async fn update(
        &self,
        role: Role,
        id: i32,
        update: AccountUpdate,
    ) -> Result<Principal, AuthError> {
        let email = update.email.as_deref().map(validate_email).transpose()?;
        let username = update.username.as_deref().map(validate_username).transpose()?;

        // Existence first so a missing account is never reported as a conflict.
        self.get(role, id).await?;

        if let Some(email) = &email {
            self.ensure_email_free(role, email, Some(id)).await?;
        }
        if let Some(username) = &username {
            self.ensure_username_free(role, username, Some(id)).await?;
        }

        self.store
            .update_principal(role, id, email, username)
            .await?
            .ok_or_else(|| AuthError::not_found(role.label()))
    }

    async fn change_password(
        &self,
        role: Role,
        id: i32,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        validate_password(new_password)?;

        if current_password == new_password {
            return Err(AuthError::validation(
                "New password must be different from current password",
            ));
        }

        let principal = self.get(role, id).await?;
        let (_, hash) = self
            .store
            .find_credentials_by_email(role, &principal.email)
            .await?
            .ok_or_else(|| AuthError::not_found(role.label()))?;

        if !self.verify(current_password, hash).await? {
            warn!(role = role.label(), id, "Password change rejected");
            return Err(AuthError::validation("Current password is incorrect"));
        }

        let new_hash = self.hash(new_password).await?;
        if !self.store.update_password_hash(role, id, new_hash).await? {
            return Err(AuthError::not_found(role.label()));
        }

        info!(role = role.label(), id, "Password changed");
        Ok(())
    }

    async fn delete(&self, role: Role, id: i32) -> Result<(), AuthError> {
        if !self.store.delete_principal(role, id).await? {
            return Err(AuthError::not_found(role.label()));
        }

        info!(role = role.label(), id, "Account deleted");
        Ok(())
    }
}
