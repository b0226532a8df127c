use sqlx::PgPool;
use uuid::Uuid;

use coursehub_auth::Claims;
use coursehub_common::AppError;
use coursehub_database::Video;

use crate::models::{CreateVideoRequest, ReorderItem, UpdateVideoRequest};

/// Ordinal position for a newly appended video: one past the current
/// maximum, or 0 for a course with no videos yet.
pub fn next_order_index(current_max: Option<i32>) -> i32 {
    current_max.map_or(0, |max| max + 1)
}

pub fn validate_video_request(request: &CreateVideoRequest) -> Result<(), AppError> {
    if request.title.trim().is_empty() {
        return Err(AppError::Validation("Video title is required".to_string()));
    }
    if request.duration_seconds <= 0 {
        return Err(AppError::Validation(
            "Video duration must be positive".to_string(),
        ));
    }
    Ok(())
}

#[derive(Clone)]
pub struct VideoService {
    db_pool: PgPool,
}

impl VideoService {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }

    /// Appends a video at the end of the course's playlist.
    ///
    /// The read-then-write index assignment is not atomic: two concurrent
    /// appends to the same course can pick the same index.
    pub async fn append(
        &self,
        claims: &Claims,
        course_id: Uuid,
        request: CreateVideoRequest,
    ) -> Result<Video, AppError> {
        validate_video_request(&request)?;
        self.require_course_author(claims, course_id).await?;

        let current_max: Option<i32> =
            sqlx::query_scalar("SELECT MAX(order_index) FROM videos WHERE course_id = $1")
                .bind(course_id)
                .fetch_one(&self.db_pool)
                .await
                .map_err(AppError::Database)?;

        let video = sqlx::query_as::<_, Video>(
            r#"
            INSERT INTO videos (course_id, title, duration_seconds, video_url, order_index)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(course_id)
        .bind(&request.title)
        .bind(request.duration_seconds)
        .bind(&request.video_url)
        .bind(next_order_index(current_max))
        .fetch_one(&self.db_pool)
        .await
        .map_err(AppError::Database)?;

        Ok(video)
    }

    /// Applies the requested ordinal positions as independent per-row
    /// updates, issued concurrently. There is no all-or-nothing guarantee:
    /// when some updates fail, the applied ones stay in place and the call
    /// reports a partial failure.
    pub async fn reorder(
        &self,
        claims: &Claims,
        course_id: Uuid,
        items: Vec<ReorderItem>,
    ) -> Result<(), AppError> {
        if items.is_empty() {
            return Err(AppError::Validation(
                "Reorder requires at least one video".to_string(),
            ));
        }
        for item in &items {
            if item.order_index < 0 {
                return Err(AppError::Validation(
                    "order_index must not be negative".to_string(),
                ));
            }
        }

        self.require_course_author(claims, course_id).await?;

        let updates = items.iter().map(|item| {
            sqlx::query(
                r#"
                UPDATE videos
                SET order_index = $1, updated_at = now()
                WHERE video_id = $2 AND course_id = $3
                "#,
            )
            .bind(item.order_index)
            .bind(item.video_id)
            .bind(course_id)
            .execute(&self.db_pool)
        });

        let results = futures::future::join_all(updates).await;
        let failed = results.iter().filter(|result| result.is_err()).count();

        if failed > 0 {
            tracing::error!(
                %course_id,
                failed,
                total = results.len(),
                "bulk reorder partially applied; completed updates were not rolled back"
            );
            return Err(AppError::PartialFailure(format!(
                "{} of {} reorder updates failed",
                failed,
                results.len()
            )));
        }

        Ok(())
    }

    pub async fn update(
        &self,
        claims: &Claims,
        video_id: Uuid,
        request: UpdateVideoRequest,
    ) -> Result<Video, AppError> {
        if let Some(duration) = request.duration_seconds {
            if duration <= 0 {
                return Err(AppError::Validation(
                    "Video duration must be positive".to_string(),
                ));
            }
        }

        let video = self.get_video(video_id).await?;
        self.require_course_author(claims, video.course_id).await?;

        let updated = sqlx::query_as::<_, Video>(
            r#"
            UPDATE videos
            SET title = COALESCE($1, title),
                duration_seconds = COALESCE($2, duration_seconds),
                video_url = COALESCE($3, video_url),
                updated_at = now()
            WHERE video_id = $4
            RETURNING *
            "#,
        )
        .bind(&request.title)
        .bind(request.duration_seconds)
        .bind(&request.video_url)
        .bind(video_id)
        .fetch_one(&self.db_pool)
        .await
        .map_err(AppError::Database)?;

        Ok(updated)
    }

    pub async fn delete(&self, claims: &Claims, video_id: Uuid) -> Result<Video, AppError> {
        let video = self.get_video(video_id).await?;
        self.require_course_author(claims, video.course_id).await?;

        sqlx::query("DELETE FROM videos WHERE video_id = $1")
            .bind(video_id)
            .execute(&self.db_pool)
            .await
            .map_err(AppError::Database)?;

        Ok(video)
    }

    /// Playlist order is ascending by order_index; ties (possible after a
    /// racing append) come back in store-defined order.
    pub async fn list_by_course(&self, course_id: Uuid) -> Result<Vec<Video>, AppError> {
        sqlx::query_as::<_, Video>(
            "SELECT * FROM videos WHERE course_id = $1 ORDER BY order_index ASC",
        )
        .bind(course_id)
        .fetch_all(&self.db_pool)
        .await
        .map_err(AppError::Database)
    }

    pub async fn get_video(&self, video_id: Uuid) -> Result<Video, AppError> {
        sqlx::query_as::<_, Video>("SELECT * FROM videos WHERE video_id = $1")
            .bind(video_id)
            .fetch_optional(&self.db_pool)
            .await
            .map_err(AppError::Database)?
            .ok_or_else(|| AppError::NotFound("Video not found".to_string()))
    }

    async fn require_course_author(&self, claims: &Claims, course_id: Uuid) -> Result<(), AppError> {
        let author_id: Option<Uuid> =
            sqlx::query_scalar("SELECT author_id FROM courses WHERE course_id = $1")
                .bind(course_id)
                .fetch_optional(&self.db_pool)
                .await
                .map_err(AppError::Database)?;

        let author_id = author_id.ok_or_else(|| AppError::NotFound("Course not found".to_string()))?;

        if author_id != claims.user_id() {
            return Err(AppError::Authorization(
                "Only the course author can manage its videos".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_video_gets_index_zero() {
        assert_eq!(next_order_index(None), 0);
    }

    #[test]
    fn appended_video_goes_one_past_the_max() {
        assert_eq!(next_order_index(Some(0)), 1);
        assert_eq!(next_order_index(Some(6)), 7);
        // Gaps are tolerated; the next index only depends on the max.
        assert_eq!(next_order_index(Some(41)), 42);
    }

    #[test]
    fn video_requests_are_validated() {
        let valid = CreateVideoRequest {
            title: "Intro".to_string(),
            duration_seconds: 120,
            video_url: "https://cdn.example.com/v/1".to_string(),
        };
        assert!(validate_video_request(&valid).is_ok());

        let empty_title = CreateVideoRequest {
            title: "  ".to_string(),
            ..valid.clone()
        };
        assert!(validate_video_request(&empty_title).is_err());

        let zero_duration = CreateVideoRequest {
            duration_seconds: 0,
            ..valid
        };
        assert!(validate_video_request(&zero_duration).is_err());
    }
}
