use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

use crate::{
    model::{
        DatabaseError, DatabaseResult, HasOwner, ModelManager, ResourceTyped, check_access,
        entity::Chapter,
    },
    web::AuthenticatedUser,
};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct Attachment {
    id: Uuid,
    chapter_id: Uuid,
    filename: String,
    url: String,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AttachmentCreate {
    pub chapter_id: Uuid,
    pub filename: String,
    /// Reference returned by file storage
    pub url: String,
}

impl ResourceTyped for Attachment {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::Attachment
    }
}

impl Attachment {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn chapter_id(&self) -> Uuid {
        self.chapter_id
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub async fn create(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        chapter: &Chapter,
        data: AttachmentCreate,
    ) -> DatabaseResult<Self> {
        if chapter.id() != data.chapter_id {
            return Err(DatabaseError::InvalidChapter);
        }
        check_access(mm, actor, chapter, actor.user_id()).await?;

        let attachment: Attachment = sqlx::query_as(
            "INSERT INTO attachments (id, chapter_id, filename, url) VALUES ($1,$2,$3,$4) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(data.chapter_id)
        .bind(&data.filename)
        .bind(&data.url)
        .fetch_one(mm.executor())
        .await?;

        tracing::debug!(attachment_id = %attachment.id, chapter_id = %attachment.chapter_id, "attachment stored");
        Ok(attachment)
    }

    pub async fn delete(self, mm: &ModelManager, actor: &AuthenticatedUser) -> DatabaseResult<()> {
        check_access(mm, actor, &self, actor.user_id()).await?;

        sqlx::query("DELETE FROM attachments WHERE id = $1")
            .bind(self.id)
            .execute(mm.executor())
            .await?;
        Ok(())
    }

    pub async fn find_by_id(mm: &ModelManager, id: Uuid) -> DatabaseResult<Option<Self>> {
        let result = sqlx::query_as("SELECT * FROM attachments WHERE id = $1")
            .bind(id)
            .fetch_optional(mm.executor())
            .await?;
        Ok(result)
    }

    pub async fn all_by_chapter(mm: &ModelManager, chapter_id: Uuid) -> DatabaseResult<Vec<Self>> {
        let rows = sqlx::query_as(
            "SELECT * FROM attachments WHERE chapter_id = $1 ORDER BY created_at",
        )
        .bind(chapter_id)
        .fetch_all(mm.executor())
        .await?;
        Ok(rows)
    }

    pub async fn all_by_course(mm: &ModelManager, course_id: Uuid) -> DatabaseResult<Vec<Self>> {
        let rows = sqlx::query_as(
            r#"
            SELECT a.*
            FROM attachments a
            JOIN chapters ch ON ch.id = a.chapter_id
            WHERE ch.course_id = $1
            ORDER BY ch.position, a.created_at
            "#,
        )
        .bind(course_id)
        .fetch_all(mm.executor())
        .await?;
        Ok(rows)
    }
}

#[async_trait]
impl HasOwner for Attachment {
    type OwnerId = Uuid;

    async fn get_owner_id(
        &self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
    ) -> DatabaseResult<Self::OwnerId> {
        let teacher_id: Option<Uuid> = sqlx::query_scalar(
            r#"
            SELECT c.teacher_id
            FROM chapters ch
            JOIN courses c ON c.id = ch.course_id
            WHERE ch.id = $1
            "#,
        )
        .bind(self.chapter_id)
        .fetch_optional(mm.executor())
        .await?;

        teacher_id.ok_or(DatabaseError::NotFound)
    }
}
