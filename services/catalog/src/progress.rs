use sqlx::PgPool;
use uuid::Uuid;

use coursehub_auth::Claims;
use coursehub_common::{AppError, ProgressStatus};
use coursehub_database::VideoProgress;

use crate::models::{UpsertProgressRequest, VideoWithProgress};

/// Resolves the optional fields of a progress write. At least one must be
/// present. The write replaces the whole row, so a status-only update
/// resets watched_seconds to 0 unless the caller resends the current
/// value.
pub fn resolve_progress_fields(
    request: &UpsertProgressRequest,
) -> Result<(ProgressStatus, i32), AppError> {
    if request.status.is_none() && request.watched_seconds.is_none() {
        return Err(AppError::Validation(
            "Either status or watched_seconds is required".to_string(),
        ));
    }

    if let Some(watched) = request.watched_seconds {
        if watched < 0 {
            return Err(AppError::Validation(
                "watched_seconds must not be negative".to_string(),
            ));
        }
    }

    Ok((
        request.status.unwrap_or(ProgressStatus::InProgress),
        request.watched_seconds.unwrap_or(0),
    ))
}

#[derive(Clone)]
pub struct ProgressService {
    db_pool: PgPool,
}

impl ProgressService {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }

    /// Records viewing progress for (user, video). Keyed upsert: at most
    /// one row per pair, the latest write wins.
    pub async fn upsert(
        &self,
        claims: &Claims,
        video_id: Uuid,
        request: UpsertProgressRequest,
    ) -> Result<VideoProgress, AppError> {
        let (status, watched_seconds) = resolve_progress_fields(&request)?;

        let video_exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM videos WHERE video_id = $1)")
                .bind(video_id)
                .fetch_one(&self.db_pool)
                .await
                .map_err(AppError::Database)?;

        if !video_exists {
            return Err(AppError::NotFound("Video not found".to_string()));
        }

        let progress = sqlx::query_as::<_, VideoProgress>(
            r#"
            INSERT INTO video_progress (user_id, video_id, status, watched_seconds, updated_at)
            VALUES ($1, $2, $3, $4, now())
            ON CONFLICT (user_id, video_id)
            DO UPDATE SET
                status = EXCLUDED.status,
                watched_seconds = EXCLUDED.watched_seconds,
                updated_at = EXCLUDED.updated_at
            RETURNING *
            "#,
        )
        .bind(claims.user_id())
        .bind(video_id)
        .bind(status.as_str())
        .bind(watched_seconds)
        .fetch_one(&self.db_pool)
        .await
        .map_err(AppError::Database)?;

        Ok(progress)
    }

    /// The course's videos in playlist order, each joined with the given
    /// user's progress. A left join with defaulting: videos the user never
    /// touched (or an anonymous caller) come back as not_started/0.
    pub async fn list_course_videos_with_progress(
        &self,
        course_id: Uuid,
        user_id: Option<Uuid>,
    ) -> Result<Vec<VideoWithProgress>, AppError> {
        sqlx::query_as::<_, VideoWithProgress>(
            r#"
            SELECT v.video_id, v.course_id, v.title, v.duration_seconds, v.video_url,
                   v.order_index,
                   COALESCE(p.status, 'not_started') AS status,
                   COALESCE(p.watched_seconds, 0) AS watched_seconds
            FROM videos v
            LEFT JOIN video_progress p
                ON p.video_id = v.video_id AND p.user_id = $2
            WHERE v.course_id = $1
            ORDER BY v.order_index ASC
            "#,
        )
        .bind(course_id)
        .bind(user_id)
        .fetch_all(&self.db_pool)
        .await
        .map_err(AppError::Database)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a_write_with_no_fields_is_rejected() {
        let request = UpsertProgressRequest {
            status: None,
            watched_seconds: None,
        };
        assert!(resolve_progress_fields(&request).is_err());
    }

    #[test]
    fn missing_fields_take_their_defaults() {
        let status_only = UpsertProgressRequest {
            status: Some(ProgressStatus::Completed),
            watched_seconds: None,
        };
        assert_eq!(
            resolve_progress_fields(&status_only).unwrap(),
            (ProgressStatus::Completed, 0)
        );

        let seconds_only = UpsertProgressRequest {
            status: None,
            watched_seconds: Some(95),
        };
        assert_eq!(
            resolve_progress_fields(&seconds_only).unwrap(),
            (ProgressStatus::InProgress, 95)
        );
    }

    #[test]
    fn negative_watched_seconds_are_rejected() {
        let request = UpsertProgressRequest {
            status: None,
            watched_seconds: Some(-1),
        };
        assert!(resolve_progress_fields(&request).is_err());
    }
}
