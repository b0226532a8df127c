//! Route-level tests that exercise authentication and request validation.
//! The pool is connected lazily and every request here is rejected before
//! a query runs, so no database is needed.

use axum_test::TestServer;
use http::StatusCode;
use serde_json::json;
use uuid::Uuid;

use coursehub_auth::{Claims, JwtService};
use coursehub_catalog::config::{CatalogConfig, StorageConfig};
use coursehub_catalog::courses::CourseService;
use coursehub_catalog::progress::ProgressService;
use coursehub_catalog::reviews::ReviewService;
use coursehub_catalog::storage::StorageService;
use coursehub_catalog::videos::VideoService;
use coursehub_catalog::{routes, AppState};
use coursehub_common::config::{DatabaseConfig, JwtConfig, ServerConfig};
use coursehub_common::types::UserRole;
use coursehub_database::create_lazy_pool;

const TEST_SECRET: &str = "test-secret";

fn test_config() -> CatalogConfig {
    CatalogConfig {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            cors_origins: vec![],
        },
        database: DatabaseConfig {
            host: "localhost".to_string(),
            port: 5432,
            username: "coursehub".to_string(),
            password: "coursehub".to_string(),
            database: "coursehub_test".to_string(),
            max_connections: 1,
        },
        jwt: JwtConfig {
            secret: TEST_SECRET.to_string(),
            expiration_hours: 1,
            issuer: "coursehub".to_string(),
        },
        storage: StorageConfig {
            provider: "local".to_string(),
            bucket_name: "coursehub-test".to_string(),
            region: "us-east-1".to_string(),
            cdn_domain: None,
            upload_url_ttl_seconds: 600,
        },
    }
}

async fn test_server() -> TestServer {
    let config = test_config();
    let db_pool = create_lazy_pool(&config.database).unwrap();
    let storage_service = StorageService::new(&config.storage).await.unwrap();

    let state = AppState {
        config: config.clone(),
        db_pool: db_pool.clone(),
        jwt_service: JwtService::new(TEST_SECRET),
        course_service: CourseService::new(db_pool.clone()),
        video_service: VideoService::new(db_pool.clone()),
        review_service: ReviewService::new(db_pool.clone()),
        progress_service: ProgressService::new(db_pool),
        storage_service,
    };

    TestServer::new(routes::create_routes().with_state(state)).unwrap()
}

fn bearer_token() -> String {
    let claims = Claims::new(
        Uuid::new_v4(),
        "tester".to_string(),
        "tester@example.com".to_string(),
        UserRole::User,
        &JwtConfig {
            secret: TEST_SECRET.to_string(),
            expiration_hours: 1,
            issuer: "coursehub".to_string(),
        },
    );
    JwtService::new(TEST_SECRET).generate_token(&claims).unwrap()
}

#[tokio::test]
async fn health_endpoint_responds() {
    let server = test_server().await;
    let response = server.get("/health").await;
    response.assert_status(StatusCode::OK);
}

#[tokio::test]
async fn create_course_requires_authentication() {
    let server = test_server().await;
    let response = server
        .post("/courses")
        .json(&json!({ "title": "Rust 101", "price": "49.99" }))
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn garbage_token_is_rejected() {
    let server = test_server().await;
    let response = server
        .post("/courses")
        .authorization_bearer("not-a-jwt")
        .json(&json!({ "title": "Rust 101", "price": "49.99" }))
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn negative_price_is_rejected() {
    let server = test_server().await;
    let response = server
        .post("/courses")
        .authorization_bearer(bearer_token())
        .json(&json!({ "title": "Rust 101", "price": "-1.00" }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn empty_progress_update_is_rejected() {
    let server = test_server().await;
    let video_id = Uuid::new_v4();
    let response = server
        .put(&format!("/videos/{video_id}/progress"))
        .authorization_bearer(bearer_token())
        .json(&json!({}))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn out_of_range_rating_is_rejected() {
    let server = test_server().await;
    let course_id = Uuid::new_v4();
    let response = server
        .post(&format!("/courses/{course_id}/reviews"))
        .authorization_bearer(bearer_token())
        .json(&json!({ "rating": "5.5" }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn empty_reorder_is_rejected() {
    let server = test_server().await;
    let course_id = Uuid::new_v4();
    let response = server
        .put(&format!("/courses/{course_id}/videos/order"))
        .authorization_bearer(bearer_token())
        .json(&json!({ "items": [] }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}
