use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use uuid::Uuid;

use coursehub_auth::{Claims, OptionalClaims};
use coursehub_common::{ApiResponse, AppError};
use coursehub_database::{Course, ReviewRating, Video, VideoProgress};

use crate::{
    models::{
        CourseListQuery, CreateCourseRequest, CreateReviewRequest, CreateVideoRequest,
        ReorderVideosRequest, UpdateCourseRequest, UpdateReviewRequest, UpdateVideoRequest,
        UploadUrlResponse, UpsertProgressRequest, VideoWithProgress,
    },
    storage::{course_image_key, course_video_key},
    AppState,
};

// Course endpoints
pub async fn create_course(
    State(state): State<AppState>,
    claims: Claims,
    Json(request): Json<CreateCourseRequest>,
) -> Result<Json<ApiResponse<Course>>, AppError> {
    let course = state.course_service.create(&claims, request).await?;
    Ok(Json(ApiResponse::success(course)))
}

pub async fn list_courses(
    State(state): State<AppState>,
    Query(query): Query<CourseListQuery>,
) -> Result<Json<ApiResponse<Vec<Course>>>, AppError> {
    let courses = state.course_service.list_published(query.category).await?;
    Ok(Json(ApiResponse::success(courses)))
}

pub async fn list_my_courses(
    State(state): State<AppState>,
    claims: Claims,
) -> Result<Json<ApiResponse<Vec<Course>>>, AppError> {
    let courses = state.course_service.list_by_author(&claims).await?;
    Ok(Json(ApiResponse::success(courses)))
}

pub async fn get_course(
    State(state): State<AppState>,
    OptionalClaims(claims): OptionalClaims,
    Path(course_id): Path<Uuid>,
) -> Result<Json<ApiResponse<Course>>, AppError> {
    let course = state.course_service.get(course_id, claims.as_ref()).await?;
    Ok(Json(ApiResponse::success(course)))
}

pub async fn update_course(
    State(state): State<AppState>,
    claims: Claims,
    Path(course_id): Path<Uuid>,
    Json(request): Json<UpdateCourseRequest>,
) -> Result<Json<ApiResponse<Course>>, AppError> {
    let course = state
        .course_service
        .update(&claims, course_id, request)
        .await?;
    Ok(Json(ApiResponse::success(course)))
}

pub async fn publish_course(
    State(state): State<AppState>,
    claims: Claims,
    Path(course_id): Path<Uuid>,
) -> Result<Json<ApiResponse<Course>>, AppError> {
    let course = state
        .course_service
        .set_published(&claims, course_id, true)
        .await?;
    Ok(Json(ApiResponse::success(course)))
}

pub async fn unpublish_course(
    State(state): State<AppState>,
    claims: Claims,
    Path(course_id): Path<Uuid>,
) -> Result<Json<ApiResponse<Course>>, AppError> {
    let course = state
        .course_service
        .set_published(&claims, course_id, false)
        .await?;
    Ok(Json(ApiResponse::success(course)))
}

pub async fn delete_course(
    State(state): State<AppState>,
    claims: Claims,
    Path(course_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    // Collect stored URLs before the rows cascade away.
    let videos = state.video_service.list_by_course(course_id).await?;
    let course = state.course_service.delete(&claims, course_id).await?;

    if let Some(image_url) = &course.image_url {
        if let Some(key) = state.storage_service.key_from_file_url(image_url) {
            state.storage_service.delete_file_or_log(&key).await;
        }
    }
    for video in videos {
        if let Some(key) = state.storage_service.key_from_file_url(&video.video_url) {
            state.storage_service.delete_file_or_log(&key).await;
        }
    }

    Ok(StatusCode::NO_CONTENT)
}

pub async fn create_course_image_upload(
    State(state): State<AppState>,
    claims: Claims,
    Path(course_id): Path<Uuid>,
) -> Result<Json<ApiResponse<UploadUrlResponse>>, AppError> {
    state.course_service.get_owned(&claims, course_id).await?;

    let upload = state
        .storage_service
        .create_upload_url(&course_image_key(course_id))
        .await?;
    Ok(Json(ApiResponse::success(upload)))
}

// Video endpoints
pub async fn append_video(
    State(state): State<AppState>,
    claims: Claims,
    Path(course_id): Path<Uuid>,
    Json(request): Json<CreateVideoRequest>,
) -> Result<Json<ApiResponse<Video>>, AppError> {
    let video = state
        .video_service
        .append(&claims, course_id, request)
        .await?;
    Ok(Json(ApiResponse::success(video)))
}

pub async fn list_course_videos(
    State(state): State<AppState>,
    OptionalClaims(claims): OptionalClaims,
    Path(course_id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<VideoWithProgress>>>, AppError> {
    // Draft courses stay hidden from non-authors.
    let course = state.course_service.get(course_id, claims.as_ref()).await?;

    let can_access = state
        .course_service
        .has_content_access(claims.as_ref(), &course)
        .await?;

    let user_id = claims.map(|c| c.user_id());
    let mut videos = state
        .progress_service
        .list_course_videos_with_progress(course_id, user_id)
        .await?;

    if !can_access {
        for video in &mut videos {
            video.video_url = None;
        }
    }

    Ok(Json(ApiResponse::success(videos)))
}

pub async fn update_video(
    State(state): State<AppState>,
    claims: Claims,
    Path(video_id): Path<Uuid>,
    Json(request): Json<UpdateVideoRequest>,
) -> Result<Json<ApiResponse<Video>>, AppError> {
    let video = state.video_service.update(&claims, video_id, request).await?;
    Ok(Json(ApiResponse::success(video)))
}

pub async fn delete_video(
    State(state): State<AppState>,
    claims: Claims,
    Path(video_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let video = state.video_service.delete(&claims, video_id).await?;
    if let Some(key) = state.storage_service.key_from_file_url(&video.video_url) {
        state.storage_service.delete_file_or_log(&key).await;
    }
    Ok(StatusCode::NO_CONTENT)
}

pub async fn reorder_videos(
    State(state): State<AppState>,
    claims: Claims,
    Path(course_id): Path<Uuid>,
    Json(request): Json<ReorderVideosRequest>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    state
        .video_service
        .reorder(&claims, course_id, request.items)
        .await?;
    Ok(Json(ApiResponse::success(())))
}

pub async fn create_video_upload(
    State(state): State<AppState>,
    claims: Claims,
    Path(course_id): Path<Uuid>,
) -> Result<Json<ApiResponse<UploadUrlResponse>>, AppError> {
    state.course_service.get_owned(&claims, course_id).await?;

    // The object key is minted here; the client uploads, then registers
    // the video with the returned file URL.
    let upload = state
        .storage_service
        .create_upload_url(&course_video_key(course_id, Uuid::new_v4()))
        .await?;
    Ok(Json(ApiResponse::success(upload)))
}

// Progress endpoints
pub async fn upsert_progress(
    State(state): State<AppState>,
    claims: Claims,
    Path(video_id): Path<Uuid>,
    Json(request): Json<UpsertProgressRequest>,
) -> Result<Json<ApiResponse<VideoProgress>>, AppError> {
    let progress = state.progress_service.upsert(&claims, video_id, request).await?;
    Ok(Json(ApiResponse::success(progress)))
}

// Review endpoints
pub async fn create_review(
    State(state): State<AppState>,
    claims: Claims,
    Path(course_id): Path<Uuid>,
    Json(request): Json<CreateReviewRequest>,
) -> Result<Json<ApiResponse<ReviewRating>>, AppError> {
    let review = state
        .review_service
        .create_review(&claims, course_id, request)
        .await?;
    Ok(Json(ApiResponse::success(review)))
}

pub async fn list_reviews(
    State(state): State<AppState>,
    Path(course_id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<ReviewRating>>>, AppError> {
    let reviews = state.review_service.list_by_course(course_id).await?;
    Ok(Json(ApiResponse::success(reviews)))
}

pub async fn get_my_review(
    State(state): State<AppState>,
    claims: Claims,
    Path(course_id): Path<Uuid>,
) -> Result<Json<ApiResponse<Option<ReviewRating>>>, AppError> {
    let review = state.review_service.get_own_review(&claims, course_id).await?;
    Ok(Json(ApiResponse::success(review)))
}

pub async fn update_review(
    State(state): State<AppState>,
    claims: Claims,
    Path(review_id): Path<Uuid>,
    Json(request): Json<UpdateReviewRequest>,
) -> Result<Json<ApiResponse<ReviewRating>>, AppError> {
    let review = state
        .review_service
        .update_review(&claims, review_id, request)
        .await?;
    Ok(Json(ApiResponse::success(review)))
}

pub async fn delete_review(
    State(state): State<AppState>,
    claims: Claims,
    Path(review_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.review_service.delete_review(&claims, review_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// Health check endpoint
pub async fn health_check() -> Result<Json<ApiResponse<String>>, AppError> {
    Ok(Json(ApiResponse::success(
        "Catalog service is healthy".to_string(),
    )))
}
