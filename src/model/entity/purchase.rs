use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

use crate::{
    model::{DatabaseError, DatabaseResult, ModelManager, ResourceTyped},
    web::{AuthenticatedUser, UserRole},
};

/// Access grant: the user may view the paid content of the course.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct Enrollment {
    user_id: Uuid,
    course_id: Uuid,
    created_at: DateTime<Utc>,
}

impl ResourceTyped for Enrollment {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::Enrollment
    }
}

impl Enrollment {
    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    pub fn course_id(&self) -> Uuid {
        self.course_id
    }

    pub async fn exists(mm: &ModelManager, user_id: Uuid, course_id: Uuid) -> DatabaseResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM enrollments WHERE user_id = $1 AND course_id = $2)",
        )
        .bind(user_id)
        .bind(course_id)
        .fetch_one(mm.executor())
        .await?;
        Ok(exists)
    }
}

/// Ledger entry for a completed payment.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct Purchase {
    id: Uuid,
    user_id: Uuid,
    course_id: Uuid,
    session_id: Option<String>,
    amount: i64,
    currency: String,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct PurchaseCreate {
    pub user_id: Uuid,
    pub course_id: Uuid,
    /// Gateway checkout session, `None` for free enrollments
    pub session_id: Option<String>,
    pub amount: i64,
    pub currency: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PurchaseOutcome {
    AlreadyOwned,
    Purchased,
}

impl ResourceTyped for Purchase {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::Purchase
    }
}

impl Purchase {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    pub fn course_id(&self) -> Uuid {
        self.course_id
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    pub fn amount(&self) -> i64 {
        self.amount
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    /// Records a confirmed payment. The ledger row and the enrollment are written in one
    /// transaction; an existing purchase of the same course makes this a no-op.
    pub async fn record(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        data: PurchaseCreate,
    ) -> DatabaseResult<PurchaseOutcome> {
        if actor.user_role() != UserRole::Admin && actor.user_id() != data.user_id {
            return Err(DatabaseError::Forbidden);
        }

        let mut tx = mm.begin().await?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO purchases (id, user_id, course_id, session_id, amount, currency)
            VALUES ($1,$2,$3,$4,$5,$6)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(data.user_id)
        .bind(data.course_id)
        .bind(&data.session_id)
        .bind(data.amount)
        .bind(&data.currency)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if inserted == 0 {
            let owned: bool = sqlx::query_scalar(
                "SELECT EXISTS (SELECT 1 FROM purchases WHERE user_id = $1 AND course_id = $2)",
            )
            .bind(data.user_id)
            .bind(data.course_id)
            .fetch_one(&mut *tx)
            .await?;

            // the conflict was on the session id: someone else's payment
            if !owned {
                return Err(DatabaseError::Conflict);
            }

            tracing::debug!(user_id = %data.user_id, course_id = %data.course_id, "purchase already recorded");
            return Ok(PurchaseOutcome::AlreadyOwned);
        }

        sqlx::query(
            "INSERT INTO enrollments (user_id, course_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(data.user_id)
        .bind(data.course_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(
            user_id = %data.user_id,
            course_id = %data.course_id,
            amount = data.amount,
            currency = %data.currency,
            "purchase recorded"
        );
        Ok(PurchaseOutcome::Purchased)
    }

    /// Payment history of the acting user, newest first.
    pub async fn all_by_user(mm: &ModelManager, actor: &AuthenticatedUser) -> DatabaseResult<Vec<Self>> {
        let rows = sqlx::query_as(
            "SELECT * FROM purchases WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(actor.user_id())
        .fetch_all(mm.executor())
        .await?;
        Ok(rows)
    }
}
