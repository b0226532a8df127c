use rust_decimal::{Decimal, RoundingStrategy};
use sqlx::PgPool;
use uuid::Uuid;

use coursehub_auth::Claims;
use coursehub_common::AppError;
use coursehub_database::ReviewRating;

use crate::models::{CreateReviewRequest, UpdateReviewRequest};

/// Mean of the given ratings rounded to one decimal place, or zero when
/// there are none.
pub fn average_of(ratings: &[Decimal]) -> Decimal {
    if ratings.is_empty() {
        return Decimal::ZERO;
    }

    let sum: Decimal = ratings.iter().copied().sum();
    (sum / Decimal::from(ratings.len() as u64))
        .round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero)
}

pub fn validate_rating(rating: Decimal) -> Result<(), AppError> {
    if rating < Decimal::ONE || rating > Decimal::from(5) {
        return Err(AppError::Validation(
            "Rating must be between 1.0 and 5.0".to_string(),
        ));
    }
    Ok(())
}

#[derive(Clone)]
pub struct ReviewService {
    db_pool: PgPool,
}

impl ReviewService {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }

    pub async fn create_review(
        &self,
        claims: &Claims,
        course_id: Uuid,
        request: CreateReviewRequest,
    ) -> Result<ReviewRating, AppError> {
        validate_rating(request.rating)?;

        let course_exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM courses WHERE course_id = $1)",
        )
        .bind(course_id)
        .fetch_one(&self.db_pool)
        .await
        .map_err(AppError::Database)?;

        if !course_exists {
            return Err(AppError::NotFound("Course not found".to_string()));
        }

        // One review per (user, course); enforced here, not by the schema.
        let already_reviewed = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM review_ratings WHERE user_id = $1 AND course_id = $2)",
        )
        .bind(claims.user_id())
        .bind(course_id)
        .fetch_one(&self.db_pool)
        .await
        .map_err(AppError::Database)?;

        if already_reviewed {
            return Err(AppError::Validation(
                "You have already reviewed this course".to_string(),
            ));
        }

        let review = sqlx::query_as::<_, ReviewRating>(
            r#"
            INSERT INTO review_ratings (user_id, course_id, rating, review)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(claims.user_id())
        .bind(course_id)
        .bind(request.rating)
        .bind(&request.review)
        .fetch_one(&self.db_pool)
        .await
        .map_err(AppError::Database)?;

        self.recompute_or_log(course_id).await;

        Ok(review)
    }

    pub async fn update_review(
        &self,
        claims: &Claims,
        review_id: Uuid,
        request: UpdateReviewRequest,
    ) -> Result<ReviewRating, AppError> {
        if let Some(rating) = request.rating {
            validate_rating(rating)?;
        }

        let existing = self.get_review(review_id).await?;

        // Only the review's author may edit it; admins can delete, not edit.
        if existing.user_id != claims.user_id() {
            return Err(AppError::Authorization(
                "You can only update your own review".to_string(),
            ));
        }

        let rating_changed = request
            .rating
            .map(|rating| rating != existing.rating)
            .unwrap_or(false);

        let updated = sqlx::query_as::<_, ReviewRating>(
            r#"
            UPDATE review_ratings
            SET rating = COALESCE($1, rating),
                review = COALESCE($2, review),
                updated_at = now()
            WHERE review_id = $3
            RETURNING *
            "#,
        )
        .bind(request.rating)
        .bind(&request.review)
        .bind(review_id)
        .fetch_one(&self.db_pool)
        .await
        .map_err(AppError::Database)?;

        if rating_changed {
            self.recompute_or_log(existing.course_id).await;
        }

        Ok(updated)
    }

    pub async fn delete_review(&self, claims: &Claims, review_id: Uuid) -> Result<(), AppError> {
        let existing = self.get_review(review_id).await?;
        claims.require_owner_or_admin(existing.user_id)?;

        // Course id is captured before the row disappears.
        let course_id = existing.course_id;

        sqlx::query("DELETE FROM review_ratings WHERE review_id = $1")
            .bind(review_id)
            .execute(&self.db_pool)
            .await
            .map_err(AppError::Database)?;

        self.recompute_or_log(course_id).await;

        Ok(())
    }

    pub async fn get_review(&self, review_id: Uuid) -> Result<ReviewRating, AppError> {
        sqlx::query_as::<_, ReviewRating>("SELECT * FROM review_ratings WHERE review_id = $1")
            .bind(review_id)
            .fetch_optional(&self.db_pool)
            .await
            .map_err(AppError::Database)?
            .ok_or_else(|| AppError::NotFound("Review not found".to_string()))
    }

    pub async fn list_by_course(&self, course_id: Uuid) -> Result<Vec<ReviewRating>, AppError> {
        sqlx::query_as::<_, ReviewRating>(
            "SELECT * FROM review_ratings WHERE course_id = $1 ORDER BY created_at DESC",
        )
        .bind(course_id)
        .fetch_all(&self.db_pool)
        .await
        .map_err(AppError::Database)
    }

    pub async fn get_own_review(
        &self,
        claims: &Claims,
        course_id: Uuid,
    ) -> Result<Option<ReviewRating>, AppError> {
        sqlx::query_as::<_, ReviewRating>(
            "SELECT * FROM review_ratings WHERE user_id = $1 AND course_id = $2",
        )
        .bind(claims.user_id())
        .bind(course_id)
        .fetch_optional(&self.db_pool)
        .await
        .map_err(AppError::Database)
    }

    /// Recomputes the course's cached review_count and average_rating from
    /// the review rows.
    pub async fn recompute_course_rating(&self, course_id: Uuid) -> Result<(), AppError> {
        let ratings: Vec<Decimal> =
            sqlx::query_scalar("SELECT rating FROM review_ratings WHERE course_id = $1")
                .bind(course_id)
                .fetch_all(&self.db_pool)
                .await
                .map_err(AppError::Database)?;

        sqlx::query(
            r#"
            UPDATE courses
            SET review_count = $1, average_rating = $2, updated_at = now()
            WHERE course_id = $3
            "#,
        )
        .bind(ratings.len() as i32)
        .bind(average_of(&ratings))
        .bind(course_id)
        .execute(&self.db_pool)
        .await
        .map_err(AppError::Database)?;

        Ok(())
    }

    // Best-effort: the triggering review write already succeeded, so a
    // failed recompute only leaves the cached aggregates stale.
    async fn recompute_or_log(&self, course_id: Uuid) {
        if let Err(e) = self.recompute_course_rating(course_id).await {
            tracing::warn!(
                %course_id,
                error = %e,
                "rating recompute failed; cached aggregates are stale"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(value: &str) -> Decimal {
        value.parse().unwrap()
    }

    #[test]
    fn average_of_no_ratings_is_zero() {
        assert_eq!(average_of(&[]), Decimal::ZERO);
    }

    #[test]
    fn average_is_rounded_to_one_decimal() {
        // 5, 3, 4 -> 4.0; dropping the 3 -> 4.5
        let all = [dec("5"), dec("3"), dec("4")];
        assert_eq!(average_of(&all), dec("4.0"));

        let remaining = [dec("5"), dec("4")];
        assert_eq!(average_of(&remaining), dec("4.5"));
    }

    #[test]
    fn average_rounds_repeating_fractions() {
        // (5 + 4 + 4) / 3 = 4.333... -> 4.3
        let ratings = [dec("5"), dec("4"), dec("4")];
        assert_eq!(average_of(&ratings), dec("4.3"));

        // (2 + 3) / 2 = 2.5 stays 2.5, midpoint rounds away from zero
        let ratings = [dec("2"), dec("3")];
        assert_eq!(average_of(&ratings), dec("2.5"));
    }

    #[test]
    fn ratings_outside_the_scale_are_rejected() {
        assert!(validate_rating(dec("0.5")).is_err());
        assert!(validate_rating(dec("5.1")).is_err());
        assert!(validate_rating(dec("1.0")).is_ok());
        assert!(validate_rating(dec("5.0")).is_ok());
        assert!(validate_rating(dec("3.5")).is_ok());
    }
}
