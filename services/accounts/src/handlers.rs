use axum::extract::State;
use axum::Json;

use coursehub_auth::Claims;
use coursehub_common::error::AppError;
use coursehub_common::types::{ApiResponse, UserRole};
use coursehub_database::models::User;

use crate::models::{
    AuthResponse, ChangePasswordRequest, LoginRequest, PasswordResetConfirm,
    PasswordResetRequest, RegisterRequest, UserProfile,
};
use crate::AppState;

pub async fn health_check() -> Json<ApiResponse<String>> {
    Json(ApiResponse::success("Accounts service is healthy".to_string()))
}

pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<ApiResponse<AuthResponse>>, AppError> {
    let user = state.user_service.register(&payload).await?;
    let token = issue_token(&state, &user)?;
    Ok(Json(ApiResponse::success(AuthResponse {
        token,
        user: user.into(),
    })))
}

pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<ApiResponse<AuthResponse>>, AppError> {
    let user = state
        .user_service
        .authenticate(&payload.email, &payload.password)
        .await?;
    let token = issue_token(&state, &user)?;
    Ok(Json(ApiResponse::success(AuthResponse {
        token,
        user: user.into(),
    })))
}

pub async fn me(
    State(state): State<AppState>,
    claims: Claims,
) -> Result<Json<ApiResponse<UserProfile>>, AppError> {
    let user = state.user_service.get_by_id(claims.user_id()).await?;
    Ok(Json(ApiResponse::success(user.into())))
}

pub async fn request_password_reset(
    State(state): State<AppState>,
    Json(payload): Json<PasswordResetRequest>,
) -> Result<Json<ApiResponse<String>>, AppError> {
    state
        .user_service
        .request_password_reset(&payload.email, state.config.reset_token_ttl_minutes)
        .await?;
    Ok(Json(ApiResponse::success(
        "If the email is registered, a reset link has been sent".to_string(),
    )))
}

pub async fn confirm_password_reset(
    State(state): State<AppState>,
    Json(payload): Json<PasswordResetConfirm>,
) -> Result<Json<ApiResponse<String>>, AppError> {
    state
        .user_service
        .reset_password(&payload.token, &payload.new_password)
        .await?;
    Ok(Json(ApiResponse::success("Password updated".to_string())))
}

pub async fn change_password(
    State(state): State<AppState>,
    claims: Claims,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<Json<ApiResponse<String>>, AppError> {
    state
        .user_service
        .change_password(
            claims.user_id(),
            &payload.current_password,
            &payload.new_password,
        )
        .await?;
    Ok(Json(ApiResponse::success("Password updated".to_string())))
}

fn issue_token(state: &AppState, user: &User) -> Result<String, AppError> {
    let role = UserRole::from_str(&user.role)
        .ok_or_else(|| AppError::Internal(format!("Unknown role in database: {}", user.role)))?;
    let claims = Claims::new(
        user.user_id,
        user.username.clone(),
        user.email.clone(),
        role,
        &state.config.jwt,
    );
    state.jwt_service.generate_token(&claims)
}
