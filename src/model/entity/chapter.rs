use std::collections::HashSet;

use crate::model::access::HasOwner;
use crate::model::entity::Course;
use crate::model::repo::ResourceTyped;
use crate::model::{
    DatabaseError, ModelManager, check_access, error::DatabaseResult, repo::CrudRepository,
};
use crate::web::AuthenticatedUser;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct Chapter {
    id: Uuid,
    course_id: Uuid,
    title: String,
    description: String,
    video_url: Option<String>,
    position: i32,
    is_published: bool,
    is_free: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ChapterCreate {
    pub course_id: Uuid,
    pub title: String,
    pub description: String,
    pub video_url: Option<String>,
    /// Appended after the last chapter when absent
    pub position: Option<i32>,
    pub is_published: bool,
    pub is_free: bool,
}

#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct ChapterUpdate {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub video_url: Option<String>,
    /// Keeps the current position when absent
    pub position: Option<i32>,
    #[serde(default)]
    pub is_published: bool,
    #[serde(default)]
    pub is_free: bool,
}

impl ResourceTyped for Chapter {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::Chapter
    }
}

impl Chapter {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn course_id(&self) -> Uuid {
        self.course_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn video_url(&self) -> Option<&str> {
        self.video_url.as_deref()
    }

    pub fn position(&self) -> i32 {
        self.position
    }

    pub fn is_published(&self) -> bool {
        self.is_published
    }

    pub fn is_free(&self) -> bool {
        self.is_free
    }
}

fn validate(title: &str, position: Option<i32>) -> DatabaseResult<()> {
    if title.trim().is_empty() {
        return Err(DatabaseError::Validation(String::from("title must not be empty")));
    }
    if matches!(position, Some(p) if p < 1) {
        return Err(DatabaseError::Validation(String::from("position starts at 1")));
    }
    Ok(())
}

/// Slot right after the last chapter of a course.
fn next_position(last: i32) -> DatabaseResult<i32> {
    last.checked_add(1)
        .ok_or_else(|| DatabaseError::Validation(String::from("no position left after the last chapter")))
}

#[async_trait]
impl CrudRepository<Chapter, ChapterCreate, ChapterUpdate, Uuid> for Chapter {
    async fn create(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        data: ChapterCreate,
    ) -> DatabaseResult<Self> {
        let course = Course::get(mm, actor, data.course_id).await?;
        check_access(mm, actor, &course, actor.user_id()).await?;
        validate(&data.title, data.position)?;

        let mut tx = mm.begin().await?;

        // serializes concurrent appends to the same course
        sqlx::query("SELECT id FROM courses WHERE id = $1 FOR UPDATE")
            .bind(course.id())
            .execute(&mut *tx)
            .await?;

        let position = match data.position {
            Some(p) => p,
            None => {
                let last: i32 = sqlx::query_scalar(
                    "SELECT COALESCE(MAX(position), 0) FROM chapters WHERE course_id = $1",
                )
                .bind(course.id())
                .fetch_one(&mut *tx)
                .await?;
                next_position(last)?
            }
        };

        let chapter: Chapter = sqlx::query_as(
            r#"
            INSERT INTO chapters (id, course_id, title, description, video_url, position, is_published, is_free)
            VALUES ($1,$2,$3,$4,$5,$6,$7,$8)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(course.id())
        .bind(data.title.trim())
        .bind(&data.description)
        .bind(&data.video_url)
        .bind(position)
        .bind(data.is_published)
        .bind(data.is_free)
        .fetch_one(&mut *tx)
        .await
        .map_err(DatabaseError::from_write)?;

        tx.commit().await?;

        tracing::debug!(chapter_id = %chapter.id, course_id = %chapter.course_id, position, "chapter created");
        Ok(chapter)
    }

    async fn update(
        self,
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        data: ChapterUpdate,
    ) -> DatabaseResult<Self> {
        check_access(mm, actor, &self, actor.user_id()).await?;
        validate(&data.title, data.position)?;

        let updated = sqlx::query_as(
            r#"
            UPDATE chapters
            SET title = $1, description = $2, video_url = $3, position = $4,
                is_published = $5, is_free = $6, updated_at = now()
            WHERE id = $7
            RETURNING *
            "#,
        )
        .bind(data.title.trim())
        .bind(&data.description)
        .bind(&data.video_url)
        .bind(data.position.unwrap_or(self.position))
        .bind(data.is_published)
        .bind(data.is_free)
        .bind(self.id)
        .fetch_one(mm.executor())
        .await
        .map_err(DatabaseError::from_write)?;

        Ok(updated)
    }

    /// Deletes the chapter and closes the gap it leaves in the course ordering.
    async fn delete(self, mm: &ModelManager, actor: &AuthenticatedUser) -> DatabaseResult<()> {
        check_access(mm, actor, &self, actor.user_id()).await?;

        let mut tx = mm.begin().await?;
        sqlx::query("SET CONSTRAINTS chapters_course_position_key DEFERRED")
            .execute(&mut *tx)
            .await?;

        // attachments and completion marks cascade
        sqlx::query("DELETE FROM chapters WHERE id = $1")
            .bind(self.id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            "UPDATE chapters SET position = position - 1 WHERE course_id = $1 AND position > $2",
        )
        .bind(self.course_id)
        .bind(self.position)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::debug!(chapter_id = %self.id, course_id = %self.course_id, "chapter deleted");
        Ok(())
    }

    async fn find_by_id(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        id: Uuid,
    ) -> DatabaseResult<Option<Self>> {
        let result = sqlx::query_as("SELECT * FROM chapters WHERE id = $1")
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
        let result = sqlx::query_as(
            "SELECT * FROM chapters ORDER BY course_id, position LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(mm.executor())
        .await?;
        Ok(result)
    }

    async fn count(mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<i64> {
        let result: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM chapters")
            .fetch_one(mm.executor())
            .await?;

        Ok(result)
    }
}

#[async_trait]
impl HasOwner for Chapter {
    type OwnerId = Uuid;

    async fn get_owner_id(
        &self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
    ) -> DatabaseResult<Self::OwnerId> {
        let teacher_id: Option<Uuid> =
            sqlx::query_scalar("SELECT teacher_id FROM courses WHERE id = $1")
                .bind(self.course_id)
                .fetch_optional(mm.executor())
                .await?;

        teacher_id.ok_or(DatabaseError::NotFound)
    }
}

// Utils

impl Chapter {
    pub async fn all_by_course(mm: &ModelManager, course_id: Uuid) -> DatabaseResult<Vec<Self>> {
        let result =
            sqlx::query_as("SELECT * FROM chapters WHERE course_id = $1 ORDER BY position")
                .bind(course_id)
                .fetch_all(mm.executor())
                .await?;
        Ok(result)
    }

    /// Fetches a chapter addressed through its course. A chapter that exists under another
    /// course is reported as [`DatabaseError::InvalidChapter`].
    pub async fn get_in_course(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        course_id: Uuid,
        chapter_id: Uuid,
    ) -> DatabaseResult<Self> {
        let chapter = Self::find_by_id(mm, actor, chapter_id)
            .await?
            .ok_or(DatabaseError::NotFound)?;

        if chapter.course_id != course_id {
            return Err(DatabaseError::InvalidChapter);
        }
        Ok(chapter)
    }

    pub async fn set_video_url(
        self,
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        video_url: &str,
    ) -> DatabaseResult<Self> {
        check_access(mm, actor, &self, actor.user_id()).await?;

        let updated = sqlx::query_as(
            "UPDATE chapters SET video_url = $1, updated_at = now() WHERE id = $2 RETURNING *",
        )
        .bind(video_url)
        .bind(self.id)
        .fetch_one(mm.executor())
        .await?;
        Ok(updated)
    }

    /// Rewrites the chapter order of a course. `ordered_ids` must name every chapter of the
    /// course exactly once; positions become `index + 1`. Nothing is written unless the
    /// whole set is valid.
    pub async fn reorder(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        course_id: Uuid,
        ordered_ids: &[Uuid],
    ) -> DatabaseResult<()> {
        let course = Course::get(mm, actor, course_id).await?;
        check_access(mm, actor, &course, actor.user_id()).await?;

        let mut tx = mm.begin().await?;
        sqlx::query("SET CONSTRAINTS chapters_course_position_key DEFERRED")
            .execute(&mut *tx)
            .await?;

        let existing: Vec<Uuid> = sqlx::query_scalar(
            "SELECT id FROM chapters WHERE course_id = $1 ORDER BY position FOR UPDATE",
        )
        .bind(course_id)
        .fetch_all(&mut *tx)
        .await?;

        // an invalid plan drops `tx`, which rolls back
        let (ids, positions): (Vec<Uuid>, Vec<i32>) =
            plan_reorder(&existing, ordered_ids)?.into_iter().unzip();

        sqlx::query(
            r#"
            UPDATE chapters c
            SET position = p.position, updated_at = now()
            FROM UNNEST($1::uuid[], $2::int4[]) AS p(id, position)
            WHERE c.id = p.id AND c.course_id = $3
            "#,
        )
        .bind(&ids)
        .bind(&positions)
        .bind(course_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::debug!(course_id = %course_id, chapters = ids.len(), "chapters reordered");
        Ok(())
    }
}

/// Validates a requested order against the chapters a course actually has and returns
/// the `(chapter, position)` assignments.
pub fn plan_reorder(existing: &[Uuid], requested: &[Uuid]) -> DatabaseResult<Vec<(Uuid, i32)>> {
    let known: HashSet<&Uuid> = existing.iter().collect();
    let mut seen = HashSet::with_capacity(requested.len());

    for id in requested {
        if !known.contains(id) || !seen.insert(id) {
            return Err(DatabaseError::InvalidChapter);
        }
    }

    if seen.len() != known.len() {
        return Err(DatabaseError::InvalidChapter);
    }

    Ok(requested
        .iter()
        .enumerate()
        .map(|(index, id)| (*id, index as i32 + 1))
        .collect())
}
