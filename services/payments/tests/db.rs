//! Data-backed tests for confirmation idempotency and checkout
//! preconditions. These need a reachable Postgres (database
//! `coursehub_test` is created on demand); run them with
//! `cargo test -- --ignored`.

use rust_decimal::Decimal;
use uuid::Uuid;

use coursehub_common::config::DatabaseConfig;
use coursehub_common::AppError;
use coursehub_database::{create_pool, run_migrations, DbPool};
use coursehub_payments::enrollment::{ConfirmOutcome, EnrollmentService};

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

async fn insert_published_course(pool: &DbPool, author_id: Uuid, price: Decimal) -> Uuid {
    sqlx::query_scalar(
        r#"
        INSERT INTO courses (author_id, title, price, published)
        VALUES ($1, 'Paid course', $2, TRUE)
        RETURNING course_id
        "#,
    )
    .bind(author_id)
    .bind(price)
    .fetch_one(pool)
    .await
    .unwrap()
}

#[tokio::test]
#[ignore]
async fn replayed_confirmation_yields_one_payment_and_one_enrollment() {
    let pool = test_pool().await;
    let author_id = insert_user(&pool).await;
    let buyer_id = insert_user(&pool).await;
    let price = Decimal::new(4999, 2);
    let course_id = insert_published_course(&pool, author_id, price).await;
    let session_id = format!("cs_test_{}", Uuid::new_v4().simple());

    let service = EnrollmentService::new(pool.clone());

    let first = service
        .record_confirmed_payment(buyer_id, course_id, price, &session_id)
        .await
        .unwrap();
    assert_eq!(first, ConfirmOutcome::Recorded);

    // A replayed webhook or a second client verify is a no-op.
    let replay = service
        .record_confirmed_payment(buyer_id, course_id, price, &session_id)
        .await
        .unwrap();
    assert_eq!(replay, ConfirmOutcome::AlreadyRecorded);

    let payments: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM payments WHERE provider_session_id = $1")
            .bind(&session_id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(payments, 1);

    let enrollments: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM enrollments WHERE user_id = $1 AND course_id = $2",
    )
    .bind(buyer_id)
    .bind(course_id)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(enrollments, 1);

    assert!(service.is_enrolled(buyer_id, course_id).await.unwrap());
}

#[tokio::test]
#[ignore]
async fn purchased_course_cannot_start_another_checkout() {
    let pool = test_pool().await;
    let author_id = insert_user(&pool).await;
    let buyer_id = insert_user(&pool).await;
    let price = Decimal::new(1999, 2);
    let course_id = insert_published_course(&pool, author_id, price).await;
    let session_id = format!("cs_test_{}", Uuid::new_v4().simple());

    let service = EnrollmentService::new(pool.clone());

    // First purchase goes through; preparing a second checkout is a
    // business-rule rejection, raised without any provider involvement.
    service
        .prepare_checkout(buyer_id, course_id)
        .await
        .unwrap();
    service
        .record_confirmed_payment(buyer_id, course_id, price, &session_id)
        .await
        .unwrap();

    let again = service.prepare_checkout(buyer_id, course_id).await;
    assert!(matches!(again, Err(AppError::Validation(_))));
}
