use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

use crate::model::entity::Course;
use crate::model::repo::ResourceTyped;
use crate::model::{DatabaseError, ModelManager, error::DatabaseResult};
use crate::web::AuthenticatedUser;

/// Per (user, course) container of completed chapter marks. Created on the first
/// completion toggle and never deleted explicitly.
#[derive(Debug, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct CourseProgress {
    id: Uuid,
    user_id: Uuid,
    course_id: Uuid,
    created_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct ProgressCounts {
    has_record: bool,
    total: i64,
    completed: i64,
}

impl ResourceTyped for CourseProgress {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::Progress
    }
}

impl CourseProgress {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    pub fn course_id(&self) -> Uuid {
        self.course_id
    }

    pub async fn find(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        course_id: Uuid,
    ) -> DatabaseResult<Option<Self>> {
        let result = sqlx::query_as(
            "SELECT * FROM user_course_progress WHERE user_id = $1 AND course_id = $2",
        )
        .bind(actor.user_id())
        .bind(course_id)
        .fetch_optional(mm.executor())
        .await?;
        Ok(result)
    }

    /// Flips the completion mark of `chapter_id` for the acting user and returns whether
    /// the chapter is now completed.
    pub async fn toggle_chapter(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        course_id: Uuid,
        chapter_id: Uuid,
    ) -> DatabaseResult<bool> {
        let course = Course::get(mm, actor, course_id).await?;
        if !course.is_visible_to(Some(actor)) {
            return Err(DatabaseError::NotFound);
        }

        let mut tx = mm.begin().await?;

        let belongs: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM chapters WHERE id = $1 AND course_id = $2)",
        )
        .bind(chapter_id)
        .bind(course.id())
        .fetch_one(&mut *tx)
        .await?;

        if !belongs {
            return Err(DatabaseError::InvalidChapter);
        }

        sqlx::query(
            r#"
            INSERT INTO user_course_progress (id, user_id, course_id)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, course_id) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(actor.user_id())
        .bind(course.id())
        .execute(&mut *tx)
        .await?;

        // row lock serializes concurrent toggles of the same (user, course)
        let progress_id: Uuid = sqlx::query_scalar(
            "SELECT id FROM user_course_progress WHERE user_id = $1 AND course_id = $2 FOR UPDATE",
        )
        .bind(actor.user_id())
        .bind(course.id())
        .fetch_one(&mut *tx)
        .await?;

        let removed = sqlx::query(
            "DELETE FROM completed_chapters WHERE progress_id = $1 AND chapter_id = $2",
        )
        .bind(progress_id)
        .bind(chapter_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        let completed = if removed > 0 {
            false
        } else {
            sqlx::query(
                "INSERT INTO completed_chapters (id, progress_id, chapter_id) VALUES ($1, $2, $3)",
            )
            .bind(Uuid::new_v4())
            .bind(progress_id)
            .bind(chapter_id)
            .execute(&mut *tx)
            .await?;
            true
        };

        tx.commit().await?;

        tracing::debug!(
            user_id = %actor.user_id(),
            course_id = %course.id(),
            chapter_id = %chapter_id,
            completed,
            "chapter completion toggled"
        );
        Ok(completed)
    }

    /// Completion percentage of the course for the acting user, `0..=100`.
    pub async fn compute(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        course_id: Uuid,
    ) -> DatabaseResult<i32> {
        let counts: ProgressCounts = sqlx::query_as(
            r#"
            SELECT
                EXISTS (
                    SELECT 1 FROM user_course_progress
                    WHERE user_id = $1 AND course_id = $2
                ) AS has_record,
                (SELECT COUNT(*) FROM chapters WHERE course_id = $2) AS total,
                (
                    SELECT COUNT(*)
                    FROM completed_chapters cc
                    JOIN user_course_progress p ON p.id = cc.progress_id
                    JOIN chapters ch ON ch.id = cc.chapter_id
                    WHERE p.user_id = $1 AND p.course_id = $2 AND ch.course_id = $2
                ) AS completed
            "#,
        )
        .bind(actor.user_id())
        .bind(course_id)
        .fetch_one(mm.executor())
        .await?;

        if !counts.has_record {
            return Ok(0);
        }

        Ok(progress_percentage(counts.completed, counts.total))
    }

    pub async fn completed_chapter_ids(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        course_id: Uuid,
    ) -> DatabaseResult<Vec<Uuid>> {
        let ids = sqlx::query_scalar(
            r#"
            SELECT cc.chapter_id
            FROM completed_chapters cc
            JOIN user_course_progress p ON p.id = cc.progress_id
            JOIN chapters ch ON ch.id = cc.chapter_id
            WHERE p.user_id = $1 AND p.course_id = $2
            ORDER BY ch.position
            "#,
        )
        .bind(actor.user_id())
        .bind(course_id)
        .fetch_all(mm.executor())
        .await?;
        Ok(ids)
    }
}

/// `floor(100 * completed / total)`; a course without chapters is 0% complete.
pub fn progress_percentage(completed: i64, total: i64) -> i32 {
    if total <= 0 {
        return 0;
    }
    let completed = completed.clamp(0, total);
    (completed * 100 / total) as i32
}
