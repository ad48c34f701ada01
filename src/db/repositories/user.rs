use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};

use super::account_write_error;
use crate::auth::{NewPrincipal, Principal, Role};
use crate::entities::{blogs, prelude::*, users};

impl From<users::Model> for Principal {
    fn from(model: users::Model) -> Self {
        Self {
            id: model.id,
            email: model.email,
            username: model.username,
            role: Role::User,
            created_at: model.created_at,
        }
    }
}

pub struct UserRepository {
    conn: DatabaseConnection,
}

impl UserRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get_by_id(&self, id: i32) -> Result<Option<Principal>> {
        let user = Users::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query user by ID")?;

        Ok(user.map(Principal::from))
    }

    pub async fn get_by_email(&self, email: &str) -> Result<Option<Principal>> {
        Ok(self.find_by_email(email).await?.map(Principal::from))
    }

    pub async fn get_by_username(&self, username: &str) -> Result<Option<Principal>> {
        let user = Users::find()
            .filter(users::Column::Username.eq(username))
            .one(&self.conn)
            .await
            .context("Failed to query user by username")?;

        Ok(user.map(Principal::from))
    }

    /// User plus password hash, for login.
    pub async fn get_credentials_by_email(&self, email: &str) -> Result<Option<(Principal, String)>> {
        Ok(self.find_by_email(email).await?.map(|u| {
            let password_hash = u.password_hash.clone();
            (Principal::from(u), password_hash)
        }))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<users::Model>> {
        Users::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.conn)
            .await
            .context("Failed to query user by email")
    }

    pub async fn list(&self) -> Result<Vec<Principal>> {
        let rows = Users::find()
            .order_by_asc(users::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list users")?;

        Ok(rows.into_iter().map(Principal::from).collect())
    }

    pub async fn create(&self, record: NewPrincipal) -> Result<Principal> {
        let active = users::ActiveModel {
            email: Set(record.email),
            username: Set(record.username),
            password_hash: Set(record.password_hash),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        };

        let model = active
            .insert(&self.conn)
            .await
            .map_err(account_write_error("Failed to insert user"))?;

        Ok(Principal::from(model))
    }

    /// Returns `None` when the user does not exist.
    pub async fn update_profile(
        &self,
        id: i32,
        email: Option<String>,
        username: Option<String>,
    ) -> Result<Option<Principal>> {
        let Some(user) = Users::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query user for update")?
        else {
            return Ok(None);
        };

        let mut active: users::ActiveModel = user.into();
        if let Some(email) = email {
            active.email = Set(email);
        }
        if let Some(username) = username {
            active.username = Set(username);
        }

        let model = active
            .update(&self.conn)
            .await
            .map_err(account_write_error("Failed to update user"))?;

        Ok(Some(Principal::from(model)))
    }

    pub async fn update_password(&self, id: i32, password_hash: String) -> Result<bool> {
        let Some(user) = Users::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query user for password update")?
        else {
            return Ok(false);
        };

        let mut active: users::ActiveModel = user.into();
        active.password_hash = Set(password_hash);
        active
            .update(&self.conn)
            .await
            .context("Failed to update user password")?;

        Ok(true)
    }

    /// Deletes the user and every blog they own in one transaction.
    pub async fn delete(&self, id: i32) -> Result<bool> {
        let txn = self.conn.begin().await?;

        Blogs::delete_many()
            .filter(blogs::Column::OwnerId.eq(id))
            .exec(&txn)
            .await
            .context("Failed to delete user's blogs")?;

        let result = Users::delete_by_id(id)
            .exec(&txn)
            .await
            .context("Failed to delete user")?;

        txn.commit().await?;

        Ok(result.rows_affected > 0)
    }
}
