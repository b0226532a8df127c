use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use coursehub_common::ProgressStatus;

// Course requests
#[derive(Debug, Clone, Deserialize)]
pub struct CreateCourseRequest {
    pub title: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub requirements: Option<Vec<String>>,
    pub category: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateCourseRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub requirements: Option<Vec<String>>,
    pub category: Option<String>,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CourseListQuery {
    pub category: Option<String>,
}

// Video requests
#[derive(Debug, Clone, Deserialize)]
pub struct CreateVideoRequest {
    pub title: String,
    pub duration_seconds: i32,
    pub video_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateVideoRequest {
    pub title: Option<String>,
    pub duration_seconds: Option<i32>,
    pub video_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReorderVideosRequest {
    pub items: Vec<ReorderItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReorderItem {
    pub video_id: Uuid,
    pub order_index: i32,
}

// Progress requests
#[derive(Debug, Clone, Deserialize)]
pub struct UpsertProgressRequest {
    pub status: Option<ProgressStatus>,
    pub watched_seconds: Option<i32>,
}

// Review requests
#[derive(Debug, Clone, Deserialize)]
pub struct CreateReviewRequest {
    pub rating: Decimal,
    pub review: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateReviewRequest {
    pub rating: Option<Decimal>,
    pub review: Option<String>,
}

// Upload responses
#[derive(Debug, Clone, Serialize)]
pub struct UploadUrlResponse {
    pub upload_url: String,
    pub file_url: String,
    pub expires_at: DateTime<Utc>,
}

/// A video joined with the caller's progress row; videos without a
/// progress row surface the not-started default. The playback URL is
/// omitted for callers without content access.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct VideoWithProgress {
    pub video_id: Uuid,
    pub course_id: Uuid,
    pub title: String,
    pub duration_seconds: i32,
    pub video_url: Option<String>,
    pub order_index: i32,
    pub status: String,
    pub watched_seconds: i32,
}
