//! Route-level tests for registration validation and authentication.
//! Every request is rejected before a query runs, so a lazily connected
//! pool is enough.

use axum_test::TestServer;
use http::StatusCode;
use serde_json::json;

use coursehub_accounts::config::AccountsConfig;
use coursehub_accounts::users::UserService;
use coursehub_accounts::{routes, AppState};
use coursehub_auth::JwtService;
use coursehub_common::config::{DatabaseConfig, JwtConfig, ServerConfig};
use coursehub_database::create_lazy_pool;

const TEST_SECRET: &str = "test-secret";

fn test_server() -> TestServer {
    let config = AccountsConfig {
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
        reset_token_ttl_minutes: 30,
    };

    let db_pool = create_lazy_pool(&config.database).unwrap();
    let state = AppState {
        config,
        db_pool: db_pool.clone(),
        jwt_service: JwtService::new(TEST_SECRET),
        user_service: UserService::new(db_pool),
    };

    TestServer::new(routes::create_routes().with_state(state)).unwrap()
}

#[tokio::test]
async fn health_endpoint_responds() {
    let server = test_server();
    let response = server.get("/health").await;
    response.assert_status(StatusCode::OK);
}

#[tokio::test]
async fn register_rejects_weak_password() {
    let server = test_server();
    let response = server
        .post("/auth/register")
        .json(&json!({
            "username": "alice",
            "email": "alice@example.com",
            "password": "short"
        }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn register_rejects_invalid_email() {
    let server = test_server();
    let response = server
        .post("/auth/register")
        .json(&json!({
            "username": "alice",
            "email": "not-an-email",
            "password": "Sup3rSecret"
        }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn register_rejects_bad_username() {
    let server = test_server();
    let response = server
        .post("/auth/register")
        .json(&json!({
            "username": "a!",
            "email": "alice@example.com",
            "password": "Sup3rSecret"
        }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn me_requires_authentication() {
    let server = test_server();
    let response = server.get("/auth/me").await;
    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn reset_confirm_validates_new_password_first() {
    let server = test_server();
    let response = server
        .post("/auth/password-reset/confirm")
        .json(&json!({ "token": "whatever", "new_password": "short" }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}
