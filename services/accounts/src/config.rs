use coursehub_common::config::{DatabaseConfig, JwtConfig, ServerConfig};

#[derive(Debug, Clone)]
pub struct AccountsConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub reset_token_ttl_minutes: i64,
}

impl AccountsConfig {
    pub fn from_env() -> Self {
        Self {
            server: ServerConfig::from_env(8001),
            database: DatabaseConfig::from_env(),
            jwt: JwtConfig::from_env(),
            reset_token_ttl_minutes: std::env::var("RESET_TOKEN_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(30),
        }
    }
}
