use rust_decimal::Decimal;
use uuid::Uuid;

use coursehub_common::error::AppError;
use coursehub_common::types::PaymentStatus;
use coursehub_database::models::{Enrollment, Payment};
use coursehub_database::DbPool;

use crate::models::PaymentHistoryEntry;

/// Minimal course projection needed to start a checkout.
#[derive(Debug, sqlx::FromRow)]
pub struct PurchasableCourse {
    pub course_id: Uuid,
    pub title: String,
    pub price: Decimal,
    pub published: bool,
}

/// Result of recording a confirmed payment. Confirmation is idempotent on
/// the provider session id, so replays report `AlreadyRecorded` instead of
/// failing.
#[derive(Debug, PartialEq, Eq)]
pub enum ConfirmOutcome {
    Recorded,
    AlreadyRecorded,
}

#[derive(Clone)]
pub struct EnrollmentService {
    db_pool: DbPool,
}

impl EnrollmentService {
    pub fn new(db_pool: DbPool) -> Self {
        Self { db_pool }
    }

    /// Validates that a checkout may start for this user and course. All
    /// business checks run before any provider call is made, so a rejected
    /// checkout never creates a dangling provider session.
    pub async fn prepare_checkout(
        &self,
        user_id: Uuid,
        course_id: Uuid,
    ) -> Result<PurchasableCourse, AppError> {
        let course = sqlx::query_as::<_, PurchasableCourse>(
            "SELECT course_id, title, price, published FROM courses WHERE course_id = $1",
        )
        .bind(course_id)
        .fetch_optional(&self.db_pool)
        .await
        .map_err(AppError::Database)?
        .ok_or_else(|| AppError::NotFound("Course not found".to_string()))?;

        if !course.published {
            return Err(AppError::NotFound("Course not found".to_string()));
        }
        if course.price <= Decimal::ZERO {
            return Err(AppError::Validation(
                "Course is not purchasable".to_string(),
            ));
        }
        if self.has_succeeded_payment(user_id, course_id).await? {
            return Err(AppError::Validation(
                "Course already purchased".to_string(),
            ));
        }

        Ok(course)
    }

    /// Records a succeeded payment and the matching enrollment. The unique
    /// index on `provider_session_id` makes this safe to call from both the
    /// webhook and the client-driven verify path for the same session.
    ///
    /// The two inserts are intentionally not wrapped in a transaction; if
    /// the enrollment insert fails after the payment lands, the partial
    /// state is logged and surfaced so it can be repaired.
    pub async fn record_confirmed_payment(
        &self,
        user_id: Uuid,
        course_id: Uuid,
        amount: Decimal,
        provider_session_id: &str,
    ) -> Result<ConfirmOutcome, AppError> {
        let existing = sqlx::query_as::<_, Payment>(
            "SELECT * FROM payments WHERE provider_session_id = $1",
        )
        .bind(provider_session_id)
        .fetch_optional(&self.db_pool)
        .await
        .map_err(AppError::Database)?;

        if existing.is_some() {
            tracing::debug!(provider_session_id, "payment already recorded, skipping");
            return Ok(ConfirmOutcome::AlreadyRecorded);
        }

        let payment = sqlx::query_as::<_, Payment>(
            r#"
            INSERT INTO payments (user_id, course_id, amount, status, provider_session_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(course_id)
        .bind(amount)
        .bind(PaymentStatus::Succeeded.as_str())
        .bind(provider_session_id)
        .fetch_one(&self.db_pool)
        .await
        .map_err(AppError::Database)?;

        let enrolled = sqlx::query(
            r#"
            INSERT INTO enrollments (user_id, course_id)
            VALUES ($1, $2)
            ON CONFLICT (user_id, course_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(course_id)
        .execute(&self.db_pool)
        .await;

        if let Err(e) = enrolled {
            tracing::error!(
                payment_id = %payment.payment_id,
                %user_id,
                %course_id,
                error = %e,
                "payment recorded but enrollment insert failed"
            );
            return Err(AppError::PartialFailure(
                "Payment recorded but enrollment could not be created".to_string(),
            ));
        }

        tracing::info!(payment_id = %payment.payment_id, %user_id, %course_id, "enrollment recorded");
        Ok(ConfirmOutcome::Recorded)
    }

    pub async fn is_enrolled(&self, user_id: Uuid, course_id: Uuid) -> Result<bool, AppError> {
        let enrolled: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM enrollments WHERE user_id = $1 AND course_id = $2)",
        )
        .bind(user_id)
        .bind(course_id)
        .fetch_one(&self.db_pool)
        .await
        .map_err(AppError::Database)?;
        Ok(enrolled)
    }

    pub async fn list_enrollments(&self, user_id: Uuid) -> Result<Vec<Enrollment>, AppError> {
        sqlx::query_as::<_, Enrollment>(
            "SELECT * FROM enrollments WHERE user_id = $1 ORDER BY enrolled_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.db_pool)
        .await
        .map_err(AppError::Database)
    }

    pub async fn list_payments(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<PaymentHistoryEntry>, AppError> {
        sqlx::query_as::<_, PaymentHistoryRow>(
            r#"
            SELECT p.payment_id, p.course_id, c.title AS course_title,
                   p.amount, p.status, p.created_at
            FROM payments p
            JOIN courses c ON c.course_id = p.course_id
            WHERE p.user_id = $1
            ORDER BY p.created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.db_pool)
        .await
        .map_err(AppError::Database)
        .map(|rows| rows.into_iter().map(PaymentHistoryEntry::from).collect())
    }

    async fn has_succeeded_payment(
        &self,
        user_id: Uuid,
        course_id: Uuid,
    ) -> Result<bool, AppError> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM payments
                WHERE user_id = $1 AND course_id = $2 AND status = $3
            )
            "#,
        )
        .bind(user_id)
        .bind(course_id)
        .bind(PaymentStatus::Succeeded.as_str())
        .fetch_one(&self.db_pool)
        .await
        .map_err(AppError::Database)?;
        Ok(exists)
    }
}

#[derive(Debug, sqlx::FromRow)]
struct PaymentHistoryRow {
    payment_id: Uuid,
    course_id: Uuid,
    course_title: String,
    amount: Decimal,
    status: String,
    created_at: chrono::DateTime<chrono::Utc>,
}

impl From<PaymentHistoryRow> for PaymentHistoryEntry {
    fn from(row: PaymentHistoryRow) -> Self {
        Self {
            payment_id: row.payment_id,
            course_id: row.course_id,
            course_title: row.course_title,
            amount: row.amount,
            status: row.status,
            created_at: row.created_at,
        }
    }
}
