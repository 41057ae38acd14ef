use crate::model::repo::ResourceTyped;
use crate::model::{DatabaseError, ModelManager, error::DatabaseResult, repo::CrudRepository};
use crate::web::{AuthenticatedUser, UserRole};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct Category {
    id: Uuid,
    name: String,
}

#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct CategoryCreate {
    pub name: String,
}

impl ResourceTyped for Category {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::Category
    }
}

impl Category {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

fn require_admin(actor: &AuthenticatedUser) -> DatabaseResult<()> {
    if actor.user_role() == UserRole::Admin {
        Ok(())
    } else {
        Err(DatabaseError::Forbidden)
    }
}

#[async_trait::async_trait]
impl CrudRepository<Category, CategoryCreate, CategoryCreate, Uuid> for Category {
    async fn create(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        data: CategoryCreate,
    ) -> DatabaseResult<Self> {
        require_admin(actor)?;

        let result = sqlx::query_as("INSERT INTO categories (id, name) VALUES ($1,$2) RETURNING *")
            .bind(Uuid::new_v4())
            .bind(data.name.trim())
            .fetch_one(mm.executor())
            .await
            .map_err(DatabaseError::from_write)?;

        Ok(result)
    }

    async fn update(
        mut self,
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        data: CategoryCreate,
    ) -> DatabaseResult<Self> {
        require_admin(actor)?;

        let name = data.name.trim().to_string();
        sqlx::query("UPDATE categories SET name = $1 WHERE id = $2")
            .bind(&name)
            .bind(self.id)
            .execute(mm.executor())
            .await
            .map_err(DatabaseError::from_write)?;

        self.name = name;
        Ok(self)
    }

    async fn delete(self, mm: &ModelManager, actor: &AuthenticatedUser) -> DatabaseResult<()> {
        require_admin(actor)?;

        sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(self.id)
            .execute(mm.executor())
            .await?;
        Ok(())
    }

    async fn find_by_id(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        id: Uuid,
    ) -> DatabaseResult<Option<Self>> {
        let result = sqlx::query_as("SELECT * FROM categories WHERE id = $1")
            .bind(id)
            .fetch_optional(mm.executor())
            .await?;

        Ok(result)
    }

    async fn list(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        limit: i64,
        offset: i64,
    ) -> DatabaseResult<Vec<Self>> {
        let result = sqlx::query_as("SELECT * FROM categories ORDER BY name LIMIT $1 OFFSET $2")
            .bind(limit)
            .bind(offset)
            .fetch_all(mm.executor())
            .await?;
        Ok(result)
    }

    async fn count(mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<i64> {
        let result: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM categories")
            .fetch_one(mm.executor())
            .await?;

        Ok(result)
    }
}

impl Category {
    pub async fn all(mm: &ModelManager) -> DatabaseResult<Vec<Self>> {
        let result = sqlx::query_as("SELECT * FROM categories ORDER BY name")
            .fetch_all(mm.executor())
            .await?;
        Ok(result)
    }
}
