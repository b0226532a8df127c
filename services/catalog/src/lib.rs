pub mod config;
pub mod courses;
pub mod handlers;
pub mod models;
pub mod progress;
pub mod reviews;
pub mod routes;
pub mod storage;
pub mod videos;

use axum::extract::FromRef;

use coursehub_auth::JwtService;

use crate::config::CatalogConfig;
use crate::courses::CourseService;
use crate::progress::ProgressService;
use crate::reviews::ReviewService;
use crate::storage::StorageService;
use crate::videos::VideoService;

#[derive(Clone)]
pub struct AppState {
    pub config: CatalogConfig,
    pub db_pool: sqlx::PgPool,
    pub jwt_service: JwtService,
    pub course_service: CourseService,
    pub video_service: VideoService,
    pub review_service: ReviewService,
    pub progress_service: ProgressService,
    pub storage_service: StorageService,
}

impl FromRef<AppState> for JwtService {
    fn from_ref(state: &AppState) -> Self {
        state.jwt_service.clone()
    }
}
