use chrono::{Duration, Utc};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use coursehub_auth::PasswordService;
use coursehub_common::error::AppError;
use coursehub_common::types::UserRole;
use coursehub_database::models::{PasswordResetToken, User};
use coursehub_database::DbPool;

use crate::models::RegisterRequest;

pub fn validate_username(username: &str) -> Result<(), AppError> {
    let username = username.trim();
    if username.len() < 3 || username.len() > 32 {
        return Err(AppError::Validation(
            "Username must be between 3 and 32 characters".to_string(),
        ));
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(AppError::Validation(
            "Username may only contain letters, digits and underscores".to_string(),
        ));
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<(), AppError> {
    let email = email.trim();
    let valid = email.contains('@')
        && !email.starts_with('@')
        && !email.ends_with('@')
        && email.split('@').count() == 2;
    if !valid {
        return Err(AppError::Validation("Invalid email address".to_string()));
    }
    Ok(())
}

/// Reset tokens are stored hashed so a leaked table does not leak usable
/// tokens.
pub fn hash_reset_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

#[derive(Clone)]
pub struct UserService {
    db_pool: DbPool,
}

impl UserService {
    pub fn new(db_pool: DbPool) -> Self {
        Self { db_pool }
    }

    pub async fn register(&self, request: &RegisterRequest) -> Result<User, AppError> {
        validate_username(&request.username)?;
        validate_email(&request.email)?;
        PasswordService::validate_password_strength(&request.password)?;

        let taken: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM users WHERE email = $1 OR username = $2)",
        )
        .bind(request.email.trim())
        .bind(request.username.trim())
        .fetch_one(&self.db_pool)
        .await
        .map_err(AppError::Database)?;

        if taken {
            return Err(AppError::Conflict(
                "An account with this email or username already exists".to_string(),
            ));
        }

        let hashed_password = PasswordService::hash_password(&request.password)?;

        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, email, role, hashed_password)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(request.username.trim())
        .bind(request.email.trim())
        .bind(UserRole::User.as_str())
        .bind(hashed_password)
        .fetch_one(&self.db_pool)
        .await
        .map_err(AppError::Database)?;

        tracing::info!(user_id = %user.user_id, "user registered");
        Ok(user)
    }

    /// The same error is returned for an unknown email and a wrong
    /// password, so login attempts cannot probe for accounts.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<User, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email.trim())
            .fetch_optional(&self.db_pool)
            .await
            .map_err(AppError::Database)?
            .ok_or_else(|| AppError::Authentication("Invalid email or password".to_string()))?;

        if !PasswordService::verify_password(password, &user.hashed_password)? {
            return Err(AppError::Authentication(
                "Invalid email or password".to_string(),
            ));
        }

        Ok(user)
    }

    pub async fn get_by_id(&self, user_id: Uuid) -> Result<User, AppError> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&self.db_pool)
            .await
            .map_err(AppError::Database)?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    /// Issues a reset token for the account, if one exists. Always reports
    /// success to the caller so the endpoint does not reveal which emails
    /// are registered.
    pub async fn request_password_reset(
        &self,
        email: &str,
        ttl_minutes: i64,
    ) -> Result<(), AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email.trim())
            .fetch_optional(&self.db_pool)
            .await
            .map_err(AppError::Database)?;

        let Some(user) = user else {
            tracing::debug!("password reset requested for unknown email");
            return Ok(());
        };

        let token = Uuid::new_v4().simple().to_string();
        let expires_at = Utc::now() + Duration::minutes(ttl_minutes);

        sqlx::query(
            r#"
            INSERT INTO password_reset_tokens (token_hash, user_id, expires_at)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(hash_reset_token(&token))
        .bind(user.user_id)
        .bind(expires_at)
        .execute(&self.db_pool)
        .await
        .map_err(AppError::Database)?;

        // TODO: send through the transactional email provider once the
        // notifications service lands.
        tracing::info!(user_id = %user.user_id, "password reset email would be sent");
        tracing::debug!(token, "reset token (development only)");

        Ok(())
    }

    pub async fn reset_password(&self, token: &str, new_password: &str) -> Result<(), AppError> {
        PasswordService::validate_password_strength(new_password)?;

        let token_hash = hash_reset_token(token);
        let reset = sqlx::query_as::<_, PasswordResetToken>(
            "SELECT * FROM password_reset_tokens WHERE token_hash = $1 AND expires_at > now()",
        )
        .bind(&token_hash)
        .fetch_optional(&self.db_pool)
        .await
        .map_err(AppError::Database)?
        .ok_or_else(|| AppError::Validation("Invalid or expired reset token".to_string()))?;

        let hashed_password = PasswordService::hash_password(new_password)?;

        sqlx::query("UPDATE users SET hashed_password = $1, updated_at = now() WHERE user_id = $2")
            .bind(hashed_password)
            .bind(reset.user_id)
            .execute(&self.db_pool)
            .await
            .map_err(AppError::Database)?;

        sqlx::query("DELETE FROM password_reset_tokens WHERE token_hash = $1")
            .bind(&token_hash)
            .execute(&self.db_pool)
            .await
            .map_err(AppError::Database)?;

        tracing::info!(user_id = %reset.user_id, "password reset completed");
        Ok(())
    }

    pub async fn change_password(
        &self,
        user_id: Uuid,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AppError> {
        PasswordService::validate_password_strength(new_password)?;

        let user = self.get_by_id(user_id).await?;
        if !PasswordService::verify_password(current_password, &user.hashed_password)? {
            return Err(AppError::Authentication(
                "Current password is incorrect".to_string(),
            ));
        }

        let hashed_password = PasswordService::hash_password(new_password)?;
        sqlx::query("UPDATE users SET hashed_password = $1, updated_at = now() WHERE user_id = $2")
            .bind(hashed_password)
            .bind(user_id)
            .execute(&self.db_pool)
            .await
            .map_err(AppError::Database)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn username_rules() {
        assert!(validate_username("alice_01").is_ok());
        assert!(validate_username("ab").is_err());
        assert!(validate_username("has space").is_err());
        assert!(validate_username(&"x".repeat(33)).is_err());
    }

    #[test]
    fn email_rules() {
        assert!(validate_email("alice@example.com").is_ok());
        assert!(validate_email("not-an-email").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("a@b@c").is_err());
    }

    #[test]
    fn reset_token_hash_is_stable_and_hex() {
        let a = hash_reset_token("token-1");
        let b = hash_reset_token("token-1");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert_ne!(a, hash_reset_token("token-2"));
    }
}
