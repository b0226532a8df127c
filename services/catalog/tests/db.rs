//! Data-backed tests for the invariants that only hold at the database:
//! one review per (user, course) and keyed progress upserts. These need a
//! reachable Postgres (database `coursehub_test` is created on demand);
//! run them with `cargo test -- --ignored`.

use rust_decimal::Decimal;
use uuid::Uuid;

use coursehub_auth::Claims;
use coursehub_catalog::courses::CourseService;
use coursehub_catalog::models::{
    CreateCourseRequest, CreateReviewRequest, CreateVideoRequest, UpsertProgressRequest,
};
use coursehub_catalog::progress::ProgressService;
use coursehub_catalog::reviews::ReviewService;
use coursehub_catalog::videos::VideoService;
use coursehub_common::config::{DatabaseConfig, JwtConfig};
use coursehub_common::types::{ProgressStatus, UserRole};
use coursehub_common::AppError;
use coursehub_database::{create_pool, run_migrations, DbPool};

async fn test_pool() -> DbPool {
    let mut config = DatabaseConfig::from_env();
    config.database =
        std::env::var("TEST_DATABASE_NAME").unwrap_or_else(|_| "coursehub_test".to_string());
    let pool = create_pool(&config).await.unwrap();
    run_migrations(&pool).await.unwrap();
    pool
}

async fn insert_user(pool: &DbPool) -> Uuid {
    let tag = Uuid::new_v4().simple().to_string();
    sqlx::query_scalar(
        r#"
        INSERT INTO users (username, email, role, hashed_password)
        VALUES ($1, $2, 'user', 'not-a-real-hash')
        RETURNING user_id
        "#,
    )
    .bind(format!("u_{tag}"))
    .bind(format!("{tag}@test.local"))
    .fetch_one(pool)
    .await
    .unwrap()
}

fn claims_for(user_id: Uuid) -> Claims {
    Claims::new(
        user_id,
        "tester".to_string(),
        "tester@test.local".to_string(),
        UserRole::User,
        &JwtConfig {
            secret: "test-secret".to_string(),
            expiration_hours: 1,
            issuer: "coursehub".to_string(),
        },
    )
}

async fn create_course(pool: &DbPool, author: &Claims) -> Uuid {
    CourseService::new(pool.clone())
        .create(
            author,
            CreateCourseRequest {
                title: "Integration course".to_string(),
                description: None,
                price: Decimal::from(49),
                requirements: None,
                category: None,
            },
        )
        .await
        .unwrap()
        .course_id
}

#[tokio::test]
#[ignore]
async fn second_review_for_the_same_course_is_rejected_and_first_stands() {
    let pool = test_pool().await;
    let author = claims_for(insert_user(&pool).await);
    let reviewer = claims_for(insert_user(&pool).await);
    let course_id = create_course(&pool, &author).await;

    let reviews = ReviewService::new(pool.clone());

    let first = reviews
        .create_review(
            &reviewer,
            course_id,
            CreateReviewRequest {
                rating: Decimal::from(5),
                review: Some("great".to_string()),
            },
        )
        .await
        .unwrap();

    let second = reviews
        .create_review(
            &reviewer,
            course_id,
            CreateReviewRequest {
                rating: Decimal::from(2),
                review: None,
            },
        )
        .await;
    assert!(matches!(second, Err(AppError::Validation(_))));

    // The original review and the cached aggregates are untouched.
    let own = reviews
        .get_own_review(&reviewer, course_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(own.review_id, first.review_id);
    assert_eq!(own.rating, Decimal::from(5));

    let (count, average): (i32, Decimal) =
        sqlx::query_as("SELECT review_count, average_rating FROM courses WHERE course_id = $1")
            .bind(course_id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(count, 1);
    assert_eq!(average, Decimal::from(5));
}

#[tokio::test]
#[ignore]
async fn sequential_progress_upserts_leave_a_single_row() {
    let pool = test_pool().await;
    let author = claims_for(insert_user(&pool).await);
    let viewer = claims_for(insert_user(&pool).await);
    let course_id = create_course(&pool, &author).await;

    let video = VideoService::new(pool.clone())
        .append(
            &author,
            course_id,
            CreateVideoRequest {
                title: "Intro".to_string(),
                duration_seconds: 120,
                video_url: "https://cdn.test.local/v/1".to_string(),
            },
        )
        .await
        .unwrap();

    let progress = ProgressService::new(pool.clone());

    progress
        .upsert(
            &viewer,
            video.video_id,
            UpsertProgressRequest {
                status: Some(ProgressStatus::Completed),
                watched_seconds: Some(120),
            },
        )
        .await
        .unwrap();

    // Second write replaces the whole row; the omitted status falls back
    // to in_progress.
    let latest = progress
        .upsert(
            &viewer,
            video.video_id,
            UpsertProgressRequest {
                status: None,
                watched_seconds: Some(30),
            },
        )
        .await
        .unwrap();
    assert_eq!(latest.status, "in_progress");
    assert_eq!(latest.watched_seconds, 30);

    let rows: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM video_progress WHERE user_id = $1 AND video_id = $2",
    )
    .bind(viewer.user_id())
    .bind(video.video_id)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(rows, 1);
}
