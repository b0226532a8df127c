use axum::{
    http::{Method, StatusCode},
    response::Json,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use coursehub_auth::JwtService;
use coursehub_common::ApiResponse;
use coursehub_database::create_pool;

use coursehub_catalog::{
    config::CatalogConfig, courses::CourseService, progress::ProgressService,
    reviews::ReviewService, routes, storage::StorageService, videos::VideoService, AppState,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "coursehub_catalog=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = CatalogConfig::from_env();

    // Create database connection pool and run migrations
    let db_pool = create_pool(&config.database).await?;
    coursehub_database::run_migrations(&db_pool).await?;

    let jwt_service = JwtService::new(&config.jwt.secret);
    let storage_service = StorageService::new(&config.storage).await?;

    let app_state = AppState {
        config: config.clone(),
        db_pool: db_pool.clone(),
        jwt_service,
        course_service: CourseService::new(db_pool.clone()),
        video_service: VideoService::new(db_pool.clone()),
        review_service: ReviewService::new(db_pool.clone()),
        progress_service: ProgressService::new(db_pool),
        storage_service,
    };

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any)
        .allow_origin(Any);

    let app = routes::create_routes()
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(cors))
        .with_state(app_state)
        .fallback(handler_404);

    let listener =
        tokio::net::TcpListener::bind(format!("{}:{}", config.server.host, config.server.port))
            .await?;

    tracing::info!(
        "Catalog service listening on {}:{}",
        config.server.host,
        config.server.port
    );

    axum::serve(listener, app).await?;

    Ok(())
}

async fn handler_404() -> (StatusCode, Json<ApiResponse<()>>) {
    (
        StatusCode::NOT_FOUND,
        Json(ApiResponse::error("Endpoint not found".to_string())),
    )
}
