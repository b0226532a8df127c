use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};

use coursehub_common::AppError;

use crate::jwt::{Claims, JwtService};

/// Extractor for routes that require an authenticated caller. Rejects with
/// 401 when the bearer token is missing or invalid.
#[async_trait]
impl<S> FromRequestParts<S> for Claims
where
    S: Send + Sync,
    JwtService: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)
            .ok_or_else(|| AppError::Authentication("Missing bearer token".to_string()))?;

        JwtService::from_ref(state).validate_token(&token)
    }
}

/// Extractor for routes that behave differently for anonymous callers
/// instead of rejecting them. An invalid token is treated as anonymous.
#[derive(Debug, Clone)]
pub struct OptionalClaims(pub Option<Claims>);

#[async_trait]
impl<S> FromRequestParts<S> for OptionalClaims
where
    S: Send + Sync,
    JwtService: FromRef<S>,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let claims = bearer_token(parts)
            .and_then(|token| JwtService::from_ref(state).validate_token(&token).ok());

        Ok(OptionalClaims(claims))
    }
}

fn bearer_token(parts: &Parts) -> Option<String> {
    let auth_header = parts.headers.get(header::AUTHORIZATION)?;
    let auth_str = auth_header.to_str().ok()?;

    auth_str
        .strip_prefix("Bearer ")
        .map(|token| token.to_string())
}
