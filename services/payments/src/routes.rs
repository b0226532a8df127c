use axum::routing::{get, post};
use axum::Router;

use crate::handlers;
use crate::AppState;

pub fn create_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/checkout/:course_id", post(handlers::create_checkout))
        .route("/checkout/verify", post(handlers::verify_checkout))
        .route("/webhooks/stripe", post(handlers::stripe_webhook))
        .route("/enrollments", get(handlers::list_my_enrollments))
        .route("/enrollments/:course_id", get(handlers::check_enrollment))
        .route("/payments", get(handlers::list_my_payments))
}
