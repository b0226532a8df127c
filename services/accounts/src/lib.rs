pub mod config;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod users;

use axum::extract::FromRef;

use coursehub_auth::JwtService;
use coursehub_database::DbPool;

use crate::config::AccountsConfig;
use crate::users::UserService;

#[derive(Clone)]
pub struct AppState {
    pub config: AccountsConfig,
    pub db_pool: DbPool,
    pub jwt_service: JwtService,
    pub user_service: UserService,
}

impl FromRef<AppState> for JwtService {
    fn from_ref(state: &AppState) -> Self {
        state.jwt_service.clone()
    }
}
