use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use coursehub_common::{AppError, JwtConfig, UserRole};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub username: String,
    pub email: String,
    pub role: UserRole,
    pub exp: i64,
    pub iat: i64,
    pub iss: String,
}

impl Claims {
    pub fn new(
        user_id: Uuid,
        username: String,
        email: String,
        role: UserRole,
        config: &JwtConfig,
    ) -> Self {
        let now = Utc::now();
        let exp = now + Duration::hours(config.expiration_hours as i64);

        Self {
            sub: user_id,
            username,
            email,
            role,
            exp: exp.timestamp(),
            iat: now.timestamp(),
            iss: config.issuer.clone(),
        }
    }

    pub fn user_id(&self) -> Uuid {
        self.sub
    }

    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    /// Ownership check used by mutation paths: the resource owner or an
    /// admin passes, everyone else gets a 403.
    pub fn require_owner_or_admin(&self, owner_id: Uuid) -> Result<(), AppError> {
        if self.sub == owner_id || self.is_admin() {
            Ok(())
        } else {
            Err(AppError::Authorization(
                "You do not have access to this resource".to_string(),
            ))
        }
    }

    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::Authorization("Admin access required".to_string()))
        }
    }
}

#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtService {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_ref()),
            decoding_key: DecodingKey::from_secret(secret.as_ref()),
            validation,
        }
    }

    pub fn generate_token(&self, claims: &Claims) -> Result<String, AppError> {
        encode(&Header::default(), claims, &self.encoding_key)
            .map_err(|e| AppError::Authentication(format!("Failed to generate token: {}", e)))
    }

    pub fn validate_token(&self, token: &str) -> Result<Claims, AppError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| AppError::Authentication(format!("Invalid token: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> JwtConfig {
        JwtConfig {
            secret: "test-secret".to_string(),
            expiration_hours: 1,
            issuer: "coursehub-test".to_string(),
        }
    }

    #[test]
    fn token_round_trip_preserves_claims() {
        let config = test_config();
        let service = JwtService::new(&config.secret);
        let user_id = Uuid::new_v4();

        let claims = Claims::new(
            user_id,
            "alice".to_string(),
            "alice@example.com".to_string(),
            UserRole::User,
            &config,
        );

        let token = service.generate_token(&claims).unwrap();
        let decoded = service.validate_token(&token).unwrap();

        assert_eq!(decoded.sub, user_id);
        assert_eq!(decoded.username, "alice");
        assert_eq!(decoded.role, UserRole::User);
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let config = test_config();
        let claims = Claims::new(
            Uuid::new_v4(),
            "bob".to_string(),
            "bob@example.com".to_string(),
            UserRole::User,
            &config,
        );

        let token = JwtService::new("other-secret")
            .generate_token(&claims)
            .unwrap();

        assert!(JwtService::new(&config.secret)
            .validate_token(&token)
            .is_err());
    }

    #[test]
    fn ownership_check_admits_owner_and_admin_only() {
        let config = test_config();
        let owner = Uuid::new_v4();

        let owner_claims = Claims::new(
            owner,
            "owner".to_string(),
            "owner@example.com".to_string(),
            UserRole::User,
            &config,
        );
        assert!(owner_claims.require_owner_or_admin(owner).is_ok());
        assert!(owner_claims.require_owner_or_admin(Uuid::new_v4()).is_err());

        let admin_claims = Claims::new(
            Uuid::new_v4(),
            "admin".to_string(),
            "admin@example.com".to_string(),
            UserRole::Admin,
            &config,
        );
        assert!(admin_claims.require_owner_or_admin(owner).is_ok());
    }
}
