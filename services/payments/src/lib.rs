pub mod config;
pub mod enrollment;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod stripe;

use axum::extract::FromRef;

use coursehub_auth::JwtService;
use coursehub_database::DbPool;

use crate::config::PaymentsConfig;
use crate::enrollment::EnrollmentService;
use crate::stripe::StripeClient;

#[derive(Clone)]
pub struct AppState {
    pub config: PaymentsConfig,
    pub db_pool: DbPool,
    pub jwt_service: JwtService,
    pub stripe_client: StripeClient,
    pub enrollment_service: EnrollmentService,
}

impl FromRef<AppState> for JwtService {
    fn from_ref(state: &AppState) -> Self {
        state.jwt_service.clone()
    }
}
