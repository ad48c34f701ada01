use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};

use super::account_write_error;
use crate::auth::{NewPrincipal, Principal, Role};
use crate::entities::{admins, prelude::*};

impl From<admins::Model> for Principal {
    fn from(model: admins::Model) -> Self {
        Self {
            id: model.id,
            email: model.email,
            username: model.username,
            role: Role::Admin,
            created_at: model.created_at,
        }
    }
}

pub struct AdminRepository {
    conn: DatabaseConnection,
}

impl AdminRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get_by_id(&self, id: i32) -> Result<Option<Principal>> {
        let admin = Admins::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query admin by ID")?;

        Ok(admin.map(Principal::from))
    }

    pub async fn get_by_email(&self, email: &str) -> Result<Option<Principal>> {
        Ok(self.find_by_email(email).await?.map(Principal::from))
    }

    pub async fn get_by_username(&self, username: &str) -> Result<Option<Principal>> {
        let admin = Admins::find()
            .filter(admins::Column::Username.eq(username))
            .one(&self.conn)
            .await
            .context("Failed to query admin by username")?;

        Ok(admin.map(Principal::from))
    }

    pub async fn get_credentials_by_email(&self, email: &str) -> Result<Option<(Principal, String)>> {
        Ok(self.find_by_email(email).await?.map(|a| {
            let password_hash = a.password_hash.clone();
            (Principal::from(a), password_hash)
        }))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<admins::Model>> {
        Admins::find()
            .filter(admins::Column::Email.eq(email))
            .one(&self.conn)
            .await
            .context("Failed to query admin by email")
    }

    pub async fn list(&self) -> Result<Vec<Principal>> {
        let rows = Admins::find()
            .order_by_asc(admins::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list admins")?;

        Ok(rows.into_iter().map(Principal::from).collect())
    }

    pub async fn create(&self, record: NewPrincipal) -> Result<Principal> {
        let active = admins::ActiveModel {
            email: Set(record.email),
            username: Set(record.username),
            password_hash: Set(record.password_hash),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        };

        let model = active
            .insert(&self.conn)
            .await
            .map_err(account_write_error("Failed to insert admin"))?;

        Ok(Principal::from(model))
    }

    pub async fn update_profile(
        &self,
        id: i32,
        email: Option<String>,
        username: Option<String>,
    ) -> Result<Option<Principal>> {
        let Some(admin) = Admins::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query admin for update")?
        else {
            return Ok(None);
        };

        let mut active: admins::ActiveModel = admin.into();
        if let Some(email) = email {
            active.email = Set(email);
        }
        if let Some(username) = username {
            active.username = Set(username);
        }

        let model = active
            .update(&self.conn)
            .await
            .map_err(account_write_error("Failed to update admin"))?;

        Ok(Some(Principal::from(model)))
    }

    pub async fn update_password(&self, id: i32, password_hash: String) -> Result<bool> {
        let Some(admin) = Admins::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query admin for password update")?
        else {
            return Ok(false);
        };

        let mut active: admins::ActiveModel = admin.into();
        active.password_hash = Set(password_hash);
        active
            .update(&self.conn)
            .await
            .context("Failed to update admin password")?;

        Ok(true)
    }

    pub async fn delete(&self, id: i32) -> Result<bool> {
        let result = Admins::delete_by_id(id)
            .exec(&self.conn)
            .await
            .context("Failed to delete admin")?;

        Ok(result.rows_affected > 0)
    }
}
