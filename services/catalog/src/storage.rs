use aws_config::BehaviorVersion;
use aws_sdk_s3::{presigning::PresigningConfig, Client};
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use coursehub_common::AppError;

use crate::config::StorageConfig;
use crate::models::UploadUrlResponse;

pub fn course_image_key(course_id: Uuid) -> String {
    format!("courses/{}/image", course_id)
}

pub fn course_video_key(course_id: Uuid, video_id: Uuid) -> String {
    format!("courses/{}/videos/{}", course_id, video_id)
}

#[derive(Clone)]
pub struct StorageService {
    s3_client: Option<Client>,
    config: StorageConfig,
}

impl StorageService {
    pub async fn new(config: &StorageConfig) -> Result<Self, AppError> {
        let s3_client = if config.provider == "s3" {
            let aws_config = aws_config::defaults(BehaviorVersion::latest())
                .region(aws_config::Region::new(config.region.clone()))
                .load()
                .await;
            Some(Client::new(&aws_config))
        } else {
            None
        };

        Ok(Self {
            s3_client,
            config: config.clone(),
        })
    }

    /// A time-limited URL the client PUTs the file to, plus the URL the
    /// file is served from afterwards.
    pub async fn create_upload_url(&self, key: &str) -> Result<UploadUrlResponse, AppError> {
        let ttl = std::time::Duration::from_secs(self.config.upload_url_ttl_seconds);
        let expires_at: DateTime<Utc> =
            Utc::now() + Duration::seconds(self.config.upload_url_ttl_seconds as i64);

        let upload_url = if let Some(client) = &self.s3_client {
            let presigning_config = PresigningConfig::expires_in(ttl)
                .map_err(|e| AppError::Internal(format!("Failed to create presigning config: {}", e)))?;

            let presigned_request = client
                .put_object()
                .bucket(&self.config.bucket_name)
                .key(key)
                .presigned(presigning_config)
                .await
                .map_err(|e| AppError::Internal(format!("Failed to create presigned URL: {}", e)))?;

            presigned_request.uri().to_string()
        } else {
            // Local development fallback without an object store
            format!("http://localhost:9000/upload/{}", key)
        };

        Ok(UploadUrlResponse {
            upload_url,
            file_url: self.file_url(key),
            expires_at,
        })
    }

    pub fn file_url(&self, key: &str) -> String {
        if let Some(cdn_domain) = &self.config.cdn_domain {
            format!("https://{}/{}", cdn_domain, key)
        } else {
            format!(
                "https://{}.s3.{}.amazonaws.com/{}",
                self.config.bucket_name, self.config.region, key
            )
        }
    }

    /// Recovers the object key from a file URL this service handed out.
    /// Upload keys carry a minted id that is not reconstructable from the
    /// row, so deletes must go through the stored URL. Returns None for
    /// URLs that were never served from this bucket or CDN.
    pub fn key_from_file_url(&self, url: &str) -> Option<String> {
        if let Some(cdn_domain) = &self.config.cdn_domain {
            if let Some(key) = url.strip_prefix(&format!("https://{}/", cdn_domain)) {
                return Some(key.to_string());
            }
        }

        let s3_prefix = format!(
            "https://{}.s3.{}.amazonaws.com/",
            self.config.bucket_name, self.config.region
        );
        url.strip_prefix(&s3_prefix).map(|key| key.to_string())
    }

    pub async fn delete_file(&self, key: &str) -> Result<(), AppError> {
        if let Some(client) = &self.s3_client {
            client
                .delete_object()
                .bucket(&self.config.bucket_name)
                .key(key)
                .send()
                .await
                .map_err(|e| AppError::Internal(format!("Failed to delete object: {}", e)))?;
        }

        Ok(())
    }

    /// Blob removal is best effort; an orphaned object never blocks the
    /// row delete that triggered it.
    pub async fn delete_file_or_log(&self, key: &str) {
        if let Err(e) = self.delete_file(key).await {
            tracing::warn!(key, error = %e, "failed to delete stored object");
        }
    }
}
