use serde::{Deserialize, Serialize};

use coursehub_common::{DatabaseConfig, JwtConfig, ServerConfig};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub provider: String,
    pub bucket_name: String,
    pub region: String,
    pub cdn_domain: Option<String>,
    pub upload_url_ttl_seconds: u64,
}

impl CatalogConfig {
    pub fn from_env() -> Self {
        Self {
            server: ServerConfig::from_env(8002),
            database: DatabaseConfig::from_env(),
            jwt: JwtConfig::from_env(),
            storage: StorageConfig {
                provider: std::env::var("STORAGE_PROVIDER").unwrap_or_else(|_| "s3".to_string()),
                bucket_name: std::env::var("STORAGE_BUCKET")
                    .unwrap_or_else(|_| "coursehub-media".to_string()),
                region: std::env::var("STORAGE_REGION")
                    .unwrap_or_else(|_| "us-east-1".to_string()),
                cdn_domain: std::env::var("STORAGE_CDN_DOMAIN").ok().filter(|d| !d.is_empty()),
                upload_url_ttl_seconds: std::env::var("STORAGE_UPLOAD_URL_TTL_SECONDS")
                    .unwrap_or_else(|_| "900".to_string())
                    .parse()
                    .unwrap_or(900),
            },
        }
    }
}
