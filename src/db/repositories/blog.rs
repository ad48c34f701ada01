use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};

use crate::auth::Owned;
use crate::entities::{blogs, prelude::*};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blog {
    pub id: i32,
    pub title: String,
    pub content: String,
    pub owner_id: i32,
    pub created_at: String,
    pub updated_at: String,
}

impl From<blogs::Model> for Blog {
    fn from(model: blogs::Model) -> Self {
        Self {
            id: model.id,
            title: model.title,
            content: model.content,
            owner_id: model.owner_id,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

impl Owned for Blog {
    fn owner_id(&self) -> i32 {
        self.owner_id
    }
}

pub struct BlogRepository {
    conn: DatabaseConnection,
}

impl BlogRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get(&self, id: i32) -> Result<Option<Blog>> {
        let blog = Blogs::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query blog by ID")?;

        Ok(blog.map(Blog::from))
    }

    pub async fn list_for_owner(&self, owner_id: i32) -> Result<Vec<Blog>> {
        let rows = Blogs::find()
            .filter(blogs::Column::OwnerId.eq(owner_id))
            .order_by_asc(blogs::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list blogs for owner")?;

        Ok(rows.into_iter().map(Blog::from).collect())
    }

    pub async fn create(&self, owner_id: i32, title: &str, content: &str) -> Result<Blog> {
        let now = chrono::Utc::now().to_rfc3339();

        let active = blogs::ActiveModel {
            title: Set(title.to_string()),
            content: Set(content.to_string()),
            owner_id: Set(owner_id),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        let model = active
            .insert(&self.conn)
            .await
            .context("Failed to insert blog")?;

        Ok(Blog::from(model))
    }

    /// `owner_id` is never touched.
    pub async fn update(&self, id: i32, title: &str, content: &str) -> Result<Option<Blog>> {
        let Some(blog) = Blogs::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query blog for update")?
        else {
            return Ok(None);
        };

        let mut active: blogs::ActiveModel = blog.into();
        active.title = Set(title.to_string());
        active.content = Set(content.to_string());
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());

        let model = active
            .update(&self.conn)
            .await
            .context("Failed to update blog")?;

        Ok(Some(Blog::from(model)))
    }

    pub async fn delete(&self, id: i32) -> Result<bool> {
        let result = Blogs::delete_by_id(id)
            .exec(&self.conn)
            .await
            .context("Failed to delete blog")?;

        Ok(result.rows_affected > 0)
    }
}
