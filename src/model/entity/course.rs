use crate::impl_paginatable_for;
use crate::model::access::HasOwner;
use crate::model::repo::ResourceTyped;
use crate::model::{
    DatabaseError, ModelManager, check_access, error::DatabaseResult, repo::CrudRepository,
};
use crate::web::{AuthenticatedUser, UserRole};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct Course {
    id: Uuid,
    teacher_id: Uuid,
    title: String,
    description: String,
    image_url: Option<String>,
    /// Price in minor currency units (cents)
    price: i64,
    is_published: bool,
    category_id: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct CourseCreate {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub image_url: Option<String>,
    #[serde(default)]
    pub price: i64,
    pub category_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct CourseUpdate {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub image_url: Option<String>,
    pub price: i64,
    pub category_id: Option<Uuid>,
    #[serde(default)]
    pub is_published: bool,
}

impl ResourceTyped for Course {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::Course
    }
}

impl Course {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn teacher_id(&self) -> Uuid {
        self.teacher_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn image_url(&self) -> Option<&str> {
        self.image_url.as_deref()
    }

    pub fn price(&self) -> i64 {
        self.price
    }

    pub fn is_published(&self) -> bool {
        self.is_published
    }

    pub fn category_id(&self) -> Option<Uuid> {
        self.category_id
    }

    pub fn is_free(&self) -> bool {
        self.price == 0
    }

    /// Unpublished courses are only visible to their teacher.
    pub fn is_visible_to(&self, actor: Option<&AuthenticatedUser>) -> bool {
        if self.is_published {
            return true;
        }
        match actor {
            Some(user) => {
                user.user_role() == UserRole::Admin || user.user_id() == self.teacher_id
            }
            None => false,
        }
    }
}

fn validate(title: &str, price: i64) -> DatabaseResult<()> {
    if title.trim().is_empty() {
        return Err(DatabaseError::Validation(String::from("title must not be empty")));
    }
    if price < 0 {
        return Err(DatabaseError::Validation(String::from("price must not be negative")));
    }
    Ok(())
}

#[async_trait]
impl CrudRepository<Course, CourseCreate, CourseUpdate, Uuid> for Course {
    async fn create(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        data: CourseCreate,
    ) -> DatabaseResult<Self> {
        if !actor.is_teacher() {
            return Err(DatabaseError::Forbidden);
        }
        validate(&data.title, data.price)?;

        let course: Course = sqlx::query_as(
            r#"
            INSERT INTO courses (id, teacher_id, title, description, image_url, price, category_id)
            VALUES ($1,$2,$3,$4,$5,$6,$7)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(actor.user_id())
        .bind(data.title.trim())
        .bind(&data.description)
        .bind(&data.image_url)
        .bind(data.price)
        .bind(data.category_id)
        .fetch_one(mm.executor())
        .await
        .map_err(DatabaseError::from_write)?;

        tracing::debug!(course_id = %course.id, teacher_id = %course.teacher_id, "course created");
        Ok(course)
    }

    async fn update(
        self,
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        data: CourseUpdate,
    ) -> DatabaseResult<Self> {
        check_access(mm, actor, &self, actor.user_id()).await?;
        validate(&data.title, data.price)?;

        let updated = sqlx::query_as(
            r#"
            UPDATE courses
            SET title = $1, description = $2, image_url = $3, price = $4,
                category_id = $5, is_published = $6, updated_at = now()
            WHERE id = $7
            RETURNING *
            "#,
        )
        .bind(data.title.trim())
        .bind(&data.description)
        .bind(&data.image_url)
        .bind(data.price)
        .bind(data.category_id)
        .bind(data.is_published)
        .bind(self.id)
        .fetch_one(mm.executor())
        .await
        .map_err(DatabaseError::from_write)?;

        Ok(updated)
    }

    async fn delete(self, mm: &ModelManager, actor: &AuthenticatedUser) -> DatabaseResult<()> {
        check_access(mm, actor, &self, actor.user_id()).await?;

        // chapters, attachments, enrollments, purchases and progress cascade with it
        sqlx::query("DELETE FROM courses WHERE id = $1")
            .bind(self.id)
            .execute(mm.executor())
            .await?;

        tracing::debug!(course_id = %self.id, "course deleted");
        Ok(())
    }

    async fn find_by_id(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        id: Uuid,
    ) -> DatabaseResult<Option<Self>> {
        let result = sqlx::query_as("SELECT * FROM courses WHERE id = $1")
            .bind(id)
            .fetch_optional(mm.executor())
            .await?;

        Ok(result)
    }

    /// Lists published courses, newest first.
    async fn list(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        limit: i64,
        offset: i64,
    ) -> DatabaseResult<Vec<Self>> {
        let result = sqlx::query_as(
            "SELECT * FROM courses WHERE is_published ORDER BY created_at DESC LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(mm.executor())
        .await?;
        Ok(result)
    }

    async fn count(mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<i64> {
        let result: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM courses WHERE is_published")
            .fetch_one(mm.executor())
            .await?;

        Ok(result)
    }
}

impl_paginatable_for!(Course, CourseCreate, CourseUpdate, Uuid);

#[async_trait]
impl HasOwner for Course {
    type OwnerId = Uuid;

    async fn get_owner_id(
        &self,
        _mm: &ModelManager,
        _actor: &AuthenticatedUser,
    ) -> DatabaseResult<Self::OwnerId> {
        Ok(self.teacher_id)
    }
}

// Utils

impl Course {
    /// Same as [`CrudRepository::find_by_id`] but a missing course is an error.
    pub async fn get(mm: &ModelManager, actor: &AuthenticatedUser, id: Uuid) -> DatabaseResult<Self> {
        Self::find_by_id(mm, actor, id)
            .await?
            .ok_or(DatabaseError::NotFound)
    }

    pub async fn all_by_teacher(mm: &ModelManager, teacher_id: Uuid) -> DatabaseResult<Vec<Self>> {
        let result = sqlx::query_as(
            "SELECT * FROM courses WHERE teacher_id = $1 ORDER BY created_at DESC",
        )
        .bind(teacher_id)
        .fetch_all(mm.executor())
        .await?;
        Ok(result)
    }

    pub async fn all_enrolled(mm: &ModelManager, user_id: Uuid) -> DatabaseResult<Vec<Self>> {
        let result = sqlx::query_as(
            r#"
            SELECT c.*
            FROM courses c
            JOIN enrollments e ON e.course_id = c.id
            WHERE e.user_id = $1
            ORDER BY e.created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(mm.executor())
        .await?;
        Ok(result)
    }

    pub async fn set_published(
        self,
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        is_published: bool,
    ) -> DatabaseResult<Self> {
        check_access(mm, actor, &self, actor.user_id()).await?;

        let updated = sqlx::query_as(
            "UPDATE courses SET is_published = $1, updated_at = now() WHERE id = $2 RETURNING *",
        )
        .bind(is_published)
        .bind(self.id)
        .fetch_one(mm.executor())
        .await?;
        Ok(updated)
    }
}
