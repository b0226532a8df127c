use axum::{
    routing::{delete, get, post, put},
    Router,
};

use crate::{handlers, AppState};

pub fn create_routes() -> Router<AppState> {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Course endpoints
        .route("/courses", post(handlers::create_course))
        .route("/courses", get(handlers::list_courses))
        .route("/courses/mine", get(handlers::list_my_courses))
        .route("/courses/:course_id", get(handlers::get_course))
        .route("/courses/:course_id", put(handlers::update_course))
        .route("/courses/:course_id", delete(handlers::delete_course))
        .route("/courses/:course_id/publish", post(handlers::publish_course))
        .route("/courses/:course_id/unpublish", post(handlers::unpublish_course))
        .route(
            "/courses/:course_id/image-upload",
            post(handlers::create_course_image_upload),
        )
        // Video endpoints
        .route("/courses/:course_id/videos", post(handlers::append_video))
        .route("/courses/:course_id/videos", get(handlers::list_course_videos))
        .route(
            "/courses/:course_id/videos/order",
            put(handlers::reorder_videos),
        )
        .route(
            "/courses/:course_id/video-upload",
            post(handlers::create_video_upload),
        )
        .route("/videos/:video_id", put(handlers::update_video))
        .route("/videos/:video_id", delete(handlers::delete_video))
        // Progress endpoints
        .route("/videos/:video_id/progress", put(handlers::upsert_progress))
        // Review endpoints
        .route("/courses/:course_id/reviews", post(handlers::create_review))
        .route("/courses/:course_id/reviews", get(handlers::list_reviews))
        .route("/courses/:course_id/reviews/me", get(handlers::get_my_review))
        .route("/reviews/:review_id", put(handlers::update_review))
        .route("/reviews/:review_id", delete(handlers::delete_review))
}
